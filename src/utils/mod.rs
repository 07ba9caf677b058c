pub mod environment;
pub mod epoch;
pub mod paths;
pub mod retry;
pub mod snapshot;

pub use environment::{default_config_path, profile_path_override};
pub use epoch::{from_storage_epoch, to_storage_epoch};
pub use paths::{sqlite_read_only_uri, validate_file_size};
pub use retry::{RetryPolicy, with_backoff};
pub use snapshot::{Snapshot, snapshot_dir, snapshot_file};
