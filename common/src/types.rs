//! 蔵書データの型定義
//!
//! リモートのコレクションと共有される型:
//! - Entry: 1冊分のレコード
//! - EntryId: サーバ採番のID（数値または文字列）
//! - Alert: 操作結果の一時通知

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 成功時の通知メッセージ（全ての操作で共通）
pub const SUCCESS_MESSAGE: &str = "Book added successfully";

/// 失敗時の通知メッセージを組み立てる
pub fn error_message(detail: impl fmt::Display) -> String {
    format!("Error: {}", detail)
}

/// サーバが採番するID
///
/// json-server系のバックエンドは数値IDと文字列IDのどちらも返すため両方受け付ける
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
    Number(u64),
    Text(String),
}

impl EntryId {
    /// URLパラメータなどのテキストと一致するか
    ///
    /// 数値IDは `"3"` のような数字文字列とも一致する
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EntryId::Number(n) => text.trim().parse::<u64>().is_ok_and(|t| t == *n),
            EntryId::Text(s) => s == text,
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Number(n) => write!(f, "{}", n),
            EntryId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for EntryId {
    fn from(n: u64) -> Self {
        EntryId::Number(n)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        match s.trim().parse::<u64>() {
            Ok(n) => EntryId::Number(n),
            Err(_) => EntryId::Text(s.to_string()),
        }
    }
}

/// 蔵書1冊分のレコード
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// 作成時のペイロードには含めない
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntryId>,

    #[serde(default)]
    pub name: String,             // タイトル

    #[serde(default)]
    pub author: String,           // 著者

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,      // 表紙画像URL

    #[serde(default)]
    pub genres: Vec<String>,      // ジャンル

    #[serde(default, deserialize_with = "lenient_stars")]
    pub stars: Option<u8>,        // 評価 (0-5)

    #[serde(default)]
    pub completed: bool,          // 読了

    #[serde(default)]
    pub start: Option<String>,    // 読み始め

    #[serde(default)]
    pub end: Option<String>,      // 読み終わり

    /// 未知のフィールド（取得したデータを欠落させないため保持）
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entry {
    /// 新規登録用の下書きを作成
    pub fn new(name: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            ..Default::default()
        }
    }

    pub fn start_date(&self) -> Result<Option<NaiveDate>> {
        parse_entry_date(self.start.as_deref())
    }

    pub fn end_date(&self) -> Result<Option<NaiveDate>> {
        parse_entry_date(self.end.as_deref())
    }
}

/// 日付文字列の先頭 `YYYY-MM-DD` を解釈する
///
/// 日付ピッカーはISO 8601の日時文字列を送るため、時刻部分は無視する
fn parse_entry_date(text: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    let head = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| Error::Date(text.to_string()))
}

/// 評価値を数値・数字文字列・nullのいずれからも受け付ける
///
/// 小数は切り捨てる。負数や `u8` に収まらない値はエラー。
fn lenient_stars<'de, D>(deserializer: D) -> std::result::Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    let value = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(other) => return Err(D::Error::custom(format!("invalid stars: {}", other))),
    };

    match value {
        Some(f) if f.is_finite() && (0.0..=f64::from(u8::MAX)).contains(&f) => {
            Ok(Some(f.trunc() as u8))
        }
        _ => Err(D::Error::custom("invalid stars: out of range")),
    }
}

/// カンマ区切りのジャンル入力を分解
///
/// 複数選択の入力は配列またはカンマ結合文字列で届く
pub fn genres_from_input(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(String::from)
        .collect()
}

/// 通知の種別
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// 初期状態（まだ通知なし）
    #[default]
    #[serde(rename = "")]
    Unset,
    Success,
    Error,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Unset => "",
            AlertKind::Success => "success",
            AlertKind::Error => "error",
        }
    }
}

/// 一時通知 `{ show, message, type }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub show: bool,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
}

impl Alert {
    pub fn success(message: impl Into<String>) -> Self {
        Self { show: true, message: message.into(), kind: AlertKind::Success }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { show: true, message: message.into(), kind: AlertKind::Error }
    }

    /// 内容を保ったまま非表示にする
    pub fn hide(&mut self) {
        self.show = false;
    }
}
