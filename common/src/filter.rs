//! 蔵書検索（クライアント側フィルタ）
//!
//! 取得済みコレクションをタイトル・著者・ジャンルの部分一致で絞り込む。
//! ネットワークには触れない純粋関数で、キー入力ごとに再計算してよい。

use crate::types::Entry;
use std::borrow::Cow;
use std::sync::Arc;

/// 検索語を正規化（前後の空白除去 + 小文字化）
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// 正規化済みの検索語に一致するか
fn entry_matches(entry: &Entry, needle: &str) -> bool {
    entry.name.to_lowercase().contains(needle)
        || entry.author.to_lowercase().contains(needle)
        || entry.genres.iter().any(|g| g.to_lowercase().contains(needle))
}

/// 検索語に一致する蔵書だけを元の順序のまま返す
///
/// 検索語が空（空白のみを含む）の場合は入力をそのまま借用して返す。
///
/// # Examples
/// ```
/// use book_catalog_common::{Entry, filter_entries};
///
/// let entries = vec![Entry::new("Dune", "Herbert"), Entry::new("Emma", "Austen")];
/// let hits = filter_entries(&entries, "aus");
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].name, "Emma");
/// ```
pub fn filter_entries<'a>(entries: &'a [Entry], query: &str) -> Cow<'a, [Entry]> {
    let needle = normalize_query(query);
    if needle.is_empty() {
        return Cow::Borrowed(entries);
    }

    Cow::Owned(
        entries
            .iter()
            .filter(|e| entry_matches(e, &needle))
            .cloned()
            .collect(),
    )
}

/// IDで蔵書を探す（詳細表示用）
pub fn find_by_id<'a>(entries: &'a [Entry], id: &str) -> Option<&'a Entry> {
    entries
        .iter()
        .find(|e| e.id.as_ref().is_some_and(|eid| eid.matches(id)))
}

/// 検索結果のキャッシュ付きビュー
///
/// コレクションの参照（`Arc`のポインタ）か検索語が変わった時だけ再計算する。
/// 結果は常に `filter_entries` と同じ。
#[derive(Debug, Default)]
pub struct SearchView {
    query: String,
    cache: Option<CachedResult>,
}

#[derive(Debug)]
struct CachedResult {
    source: Arc<Vec<Entry>>,
    needle: String,
    /// 一致した蔵書の元インデックス
    indices: Vec<usize>,
}

impl SearchView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// 現在の検索語でコレクションを絞り込む
    pub fn apply(&mut self, entries: &Arc<Vec<Entry>>) -> Vec<Entry> {
        let needle = normalize_query(&self.query);

        let fresh = self
            .cache
            .as_ref()
            .is_some_and(|c| Arc::ptr_eq(&c.source, entries) && c.needle == needle);

        if !fresh {
            let indices = entries
                .iter()
                .enumerate()
                .filter(|(_, e)| needle.is_empty() || entry_matches(e, &needle))
                .map(|(i, _)| i)
                .collect();
            self.cache = Some(CachedResult {
                source: Arc::clone(entries),
                needle,
                indices,
            });
        }

        match &self.cache {
            Some(cached) => cached.indices.iter().map(|&i| entries[i].clone()).collect(),
            None => Vec::new(),
        }
    }

    /// 直近の `apply` が再計算せずキャッシュを使えるか
    pub fn is_cached_for(&self, entries: &Arc<Vec<Entry>>) -> bool {
        let needle = normalize_query(&self.query);
        self.cache
            .as_ref()
            .is_some_and(|c| Arc::ptr_eq(&c.source, entries) && c.needle == needle)
    }
}
