pub mod apply;
pub mod ast;
pub mod parser;

pub use ast::{DEFAULT_LIMIT, FilterSpec, HistoryFilter, TextMatch};
pub use parser::{parse_filter, parse_timestamp};
