//! OmniDownloader database layer.
//!
//! ```no_run
//! use omnidownloader::database::Database;
//!
//! let db = Database::open("omnidownloader.db").expect("failed to open database");
//! let version = omnidownloader::database::migrations::get_schema_version(&db.connection());
//! assert_eq!(version, omnidownloader::database::migrations::CURRENT_SCHEMA_VERSION);
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
