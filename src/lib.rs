//! 蔵書カタログのクライアントライブラリ
//!
//! リモートの蔵書コレクションに対する通信状態の管理（`RequestState`）と、
//! 共通クレートの検索・検証ロジックを提供する。

pub mod cli;
pub mod config;
pub mod error;
pub mod notify;
pub mod request_state;
pub mod transport;

pub use book_catalog_common as common;
pub use book_catalog_common::{
    filter_entries, find_by_id, Alert, AlertKind, Entry, EntryId, SearchView,
};
pub use error::{CatalogError, Result};
pub use request_state::{RequestOutcome, RequestState};
pub use transport::{HttpTransport, Method, Transport};
