//! HTTP通信層
//!
//! `RequestState` から見た通信の境界。本番は `HttpTransport`（reqwest）、
//! テストでは任意の実装に差し替える。

use crate::error::{CatalogError, Result};
use reqwest::Url;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

/// HTTPメソッド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Delete => "delete",
        }
    }

    /// リクエストボディを送るメソッドか
    pub fn has_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            "put" => Ok(Method::Put),
            "delete" => Ok(Method::Delete),
            _ => Err(CatalogError::InvalidMethod(s.to_string())),
        }
    }
}

/// リクエストを1件送り、レスポンスボディをJSONとして返す
///
/// 通信失敗・2xx以外・解析不能なボディは `Http` / `Status` / `Decode` で返すこと。
/// それ以外のエラーは呼び出し側の誤用として扱われる。
pub trait Transport: Send + Sync {
    fn send(
        &self,
        method: Method,
        url: &Url,
        payload: Option<&Value>,
    ) -> impl Future<Output = Result<Value>> + Send;
}

/// reqwestによるHTTP実装
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// `None` ならタイムアウトなし（reqwestの既定どおり）
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self { client: builder.build()? })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, method: Method, url: &Url, payload: Option<&Value>) -> Result<Value> {
        let request = match method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
            Method::Put => self.client.put(url.clone()),
            Method::Delete => self.client.delete(url.clone()),
        };
        let request = match payload {
            Some(body) => request.json(body),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| CatalogError::Decode(e.to_string()))
    }
}
