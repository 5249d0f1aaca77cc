use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed with status code {0}")]
    Status(u16),

    #[error("レスポンスの解析に失敗: {0}")]
    Decode(String),

    #[error("不正なURL: {0}")]
    InvalidUrl(String),

    #[error("不正なHTTPメソッド: {0}")]
    InvalidMethod(String),

    #[error("入力内容が不正: {0}")]
    InvalidEntry(String),

    #[error("{0}")]
    Request(String),

    #[error("本が見つかりません: {0}")]
    EntryNotFound(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// 通信由来の失敗か（通知に変換される）
    ///
    /// それ以外は呼び出し側の使い方の誤りとしてそのまま返す
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CatalogError::Http(_) | CatalogError::Status(_) | CatalogError::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
