//! Readers for the browser's on-disk formats.
//!
//! # Error Handling Strategy
//!
//! Every reader follows a **graceful degradation** approach at record level and a
//! strict one at file level:
//!
//! - **Individual records**: A malformed sync record, session command or history row
//!   is skipped and logged at debug level; one bad record never fails a read.
//!
//! - **Whole files**: A store that is missing, locked, encrypted or not in the expected
//!   format fails the call with a typed [`Error`](crate::Error) naming the path and the
//!   reason, so the caller can fix the situation.
//!
//! - **Summaries**: Scans log record and skip counts at info/debug level through
//!   `tracing`, never on stdout.

pub mod bookmarks;
pub mod deserializers;
pub mod history;
pub mod session_file;
pub mod sync_proto;
pub mod sync_records;

pub use bookmarks::{BookmarkTree, flatten, load_bookmarks, search};
pub use history::{HistoryStore, query_history};
pub use session_file::{latest_session_file, read_local_tabs};
pub use sync_records::{Decoded, SkipReason};
