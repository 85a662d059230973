use std::fmt;

// === FetchError ===

/// Errors raised while retrieving a URL's bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The server answered with a non-success status code.
    HttpStatus(u16),
    /// The request could not be sent or no response arrived.
    NetworkError(String),
    /// The response body failed mid-stream.
    StreamError(String),
    /// Every access strategy failed; carries the last strategy's message.
    AllStrategiesFailed(String),
    /// The fetch engine could not be constructed.
    ClientBuild(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::HttpStatus(code) => write!(f, "HTTP {}", code),
            FetchError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            FetchError::StreamError(msg) => write!(f, "Stream error: {}", msg),
            FetchError::AllStrategiesFailed(msg) => {
                write!(f, "All access strategies failed: {}", msg)
            }
            FetchError::ClientBuild(msg) => write!(f, "HTTP client setup failed: {}", msg),
        }
    }
}

impl FetchError {
    /// Message of the underlying failure, without the exhaustion wrapper.
    /// This is what a queue item shows as its error.
    pub fn last_message(&self) -> String {
        match self {
            FetchError::AllStrategiesFailed(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl std::error::Error for FetchError {}

// === ClassifierError ===

/// Errors related to the remote URL classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// No API credential is configured.
    MissingApiKey,
    /// A network error occurred while calling the classifier.
    NetworkError(String),
    /// The classifier answered with a non-success status code.
    ProviderError(String),
    /// The classifier response could not be parsed.
    ParseError(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierError::MissingApiKey => write!(f, "No classifier API key configured"),
            ClassifierError::NetworkError(msg) => write!(f, "Classifier network error: {}", msg),
            ClassifierError::ProviderError(msg) => write!(f, "Classifier provider error: {}", msg),
            ClassifierError::ParseError(msg) => write!(f, "Classifier parse error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

// === SaveError ===

/// Errors raised while handing bytes to the save boundary.
#[derive(Debug)]
pub enum SaveError {
    /// The filename is empty after sanitising.
    InvalidFilename(String),
    /// Writing the file failed.
    IoError(String),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::InvalidFilename(name) => write!(f, "Invalid output filename: {:?}", name),
            SaveError::IoError(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl std::error::Error for SaveError {}

// === ArchiveError ===

/// Errors related to building a ZIP archive.
#[derive(Debug)]
pub enum ArchiveError {
    /// The archive writer rejected an entry or failed to finish.
    WriteFailed(String),
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::WriteFailed(msg) => write!(f, "Archive write failed: {}", msg),
        }
    }
}

impl std::error::Error for ArchiveError {}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::WriteFailed(err.to_string())
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        ArchiveError::WriteFailed(err.to_string())
    }
}

// === QueueError ===

/// Errors related to download queue operations.
#[derive(Debug)]
pub enum QueueError {
    /// Queue item with the given ID was not found.
    NotFound(String),
    /// The item has no resolved fetch target yet.
    NotReady(String),
    /// The item is already being downloaded.
    AlreadyDownloading(String),
    /// The item cannot be renamed in its current status.
    NotEditable(String),
    /// The provided filename is empty.
    InvalidFilename(String),
    /// Fetching the item failed.
    Fetch(FetchError),
    /// Saving the fetched bytes failed.
    Save(SaveError),
    /// Building the archive failed.
    Archive(ArchiveError),
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::NotFound(id) => write!(f, "Queue item not found: {}", id),
            QueueError::NotReady(id) => write!(f, "Queue item has no fetch target yet: {}", id),
            QueueError::AlreadyDownloading(id) => {
                write!(f, "Queue item is already downloading: {}", id)
            }
            QueueError::NotEditable(id) => write!(f, "Queue item cannot be renamed now: {}", id),
            QueueError::InvalidFilename(name) => write!(f, "Invalid filename: {:?}", name),
            QueueError::Fetch(err) => write!(f, "{}", err),
            QueueError::Save(err) => write!(f, "{}", err),
            QueueError::Archive(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for QueueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueueError::Fetch(err) => Some(err),
            QueueError::Save(err) => Some(err),
            QueueError::Archive(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FetchError> for QueueError {
    fn from(err: FetchError) -> Self {
        QueueError::Fetch(err)
    }
}

impl From<SaveError> for QueueError {
    fn from(err: SaveError) -> Self {
        QueueError::Save(err)
    }
}

impl From<ArchiveError> for QueueError {
    fn from(err: ArchiveError) -> Self {
        QueueError::Archive(err)
    }
}

// === CompressionError ===

/// Errors related to local media compression.
#[derive(Debug)]
pub enum CompressionError {
    /// The image could not be decoded.
    Decode(String),
    /// The image could not be re-encoded.
    Encode(String),
    /// A source file could not be read.
    Io(String),
    /// Compression queue item with the given ID was not found.
    NotFound(String),
    /// The item has no compressed output yet.
    NotCompleted(String),
    /// Saving the output failed.
    Save(SaveError),
    /// Building the archive failed.
    Archive(ArchiveError),
}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionError::Decode(msg) => write!(f, "Image decode failed: {}", msg),
            CompressionError::Encode(msg) => write!(f, "Image encode failed: {}", msg),
            CompressionError::Io(msg) => write!(f, "Source read failed: {}", msg),
            CompressionError::NotFound(id) => write!(f, "Compression item not found: {}", id),
            CompressionError::NotCompleted(id) => {
                write!(f, "Compression item has no output yet: {}", id)
            }
            CompressionError::Save(err) => write!(f, "{}", err),
            CompressionError::Archive(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CompressionError {}

impl From<SaveError> for CompressionError {
    fn from(err: SaveError) -> Self {
        CompressionError::Save(err)
    }
}

impl From<ArchiveError> for CompressionError {
    fn from(err: ArchiveError) -> Self {
        CompressionError::Archive(err)
    }
}

// === StoreError ===

/// Errors related to the persisted output-directory store.
#[derive(Debug)]
pub enum StoreError {
    /// Database operation failed.
    DatabaseError(String),
    /// The stored value is not a usable directory.
    InvalidDirectory(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DatabaseError(msg) => write!(f, "Store database error: {}", msg),
            StoreError::InvalidDirectory(path) => write!(f, "Not a directory: {}", path),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
