//! 蔵書レコードの整合性チェック
//!
//! 通信層では強制しない。登録前に呼び出し側が判断する。

use crate::types::Entry;
use std::fmt;

/// 評価の上限
pub const MAX_STARS: u8 = 5;

/// 整合性の問題点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryIssue {
    MissingTitle,
    MissingAuthor,
    StarsOutOfRange(u8),
    InvalidStart(String),
    InvalidEnd(String),
    /// 読了していないのに読み終わり日がある
    EndWithoutCompletion,
    /// 読み終わりが読み始めより前
    EndBeforeStart,
}

impl fmt::Display for EntryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryIssue::MissingTitle => write!(f, "タイトルが空です"),
            EntryIssue::MissingAuthor => write!(f, "著者が空です"),
            EntryIssue::StarsOutOfRange(n) => write!(f, "評価は0〜{}で指定してください: {}", MAX_STARS, n),
            EntryIssue::InvalidStart(s) => write!(f, "読み始めの日付が不正: {}", s),
            EntryIssue::InvalidEnd(s) => write!(f, "読み終わりの日付が不正: {}", s),
            EntryIssue::EndWithoutCompletion => write!(f, "読了していない本に読み終わり日があります"),
            EntryIssue::EndBeforeStart => write!(f, "読み終わりが読み始めより前です"),
        }
    }
}

/// レコードを検査して問題点を列挙（問題なしなら空）
pub fn validate(entry: &Entry) -> Vec<EntryIssue> {
    let mut issues = Vec::new();

    if entry.name.trim().is_empty() {
        issues.push(EntryIssue::MissingTitle);
    }
    if entry.author.trim().is_empty() {
        issues.push(EntryIssue::MissingAuthor);
    }
    if let Some(stars) = entry.stars.filter(|&s| s > MAX_STARS) {
        issues.push(EntryIssue::StarsOutOfRange(stars));
    }

    let start = entry.start_date().unwrap_or_else(|_| {
        issues.push(EntryIssue::InvalidStart(entry.start.clone().unwrap_or_default()));
        None
    });
    let end = entry.end_date().unwrap_or_else(|_| {
        issues.push(EntryIssue::InvalidEnd(entry.end.clone().unwrap_or_default()));
        None
    });

    if end.is_some() && !entry.completed {
        issues.push(EntryIssue::EndWithoutCompletion);
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            issues.push(EntryIssue::EndBeforeStart);
        }
    }

    issues
}
