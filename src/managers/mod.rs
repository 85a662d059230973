// OmniDownloader state managers
// Managers own mutable state: the download queue, the compression queue and the saved output directory.

pub mod compression_queue;
pub mod output_directory;
pub mod queue_manager;
