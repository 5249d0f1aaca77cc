//! Book Catalog Common Library
//!
//! CLIと他のフロントエンドで共有される型と純粋ロジック（I/Oなし）

pub mod types;
pub mod error;
pub mod filter;
pub mod validate;

pub use types::{
    error_message, genres_from_input, Alert, AlertKind, Entry, EntryId, SUCCESS_MESSAGE,
};
pub use error::{Error, Result};
pub use filter::{SearchView, filter_entries, find_by_id, normalize_query};
pub use validate::{EntryIssue, validate};
