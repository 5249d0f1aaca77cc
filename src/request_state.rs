//! リクエスト状態管理
//!
//! 1つのベースURL上のコレクションに対する通信と、その結果の状態を保持する。
//!
//! - `data`: 直近に成功したレスポンス（未取得なら `None`）。成功のたびに丸ごと置き換える
//! - `loading`: 通信中フラグ
//! - `alert`: 一時通知。一定時間後に自動で非表示になる
//!
//! 通信失敗は呼び出し元へ返さず通知に変換する。呼び出し元に返るのは
//! 不正なURL・メソッドなど使い方の誤りだけ。
//!
//! 同じインスタンスで複数の操作を同時に走らせた場合、後に完了した方の結果が残る
//! （順序制御・キャンセルはしない）。

use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::notify::AlertTimer;
use crate::transport::{HttpTransport, Method, Transport};
use book_catalog_common::{Alert, Entry, SUCCESS_MESSAGE, error_message};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// 通知を自動で隠すまでの既定時間
pub const DEFAULT_ALERT_DURATION: Duration = Duration::from_secs(5);

/// 直近の通信結果
pub struct RequestOutcome<T> {
    pub data: Option<Arc<T>>,
    pub loading: bool,
    pub alert: Alert,
    /// 通知の世代（タイマーが古い通知を隠さないための照合用）
    alert_seq: u64,
}

impl<T> Default for RequestOutcome<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            alert: Alert::default(),
            alert_seq: 0,
        }
    }
}

impl<T> Clone for RequestOutcome<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            alert: self.alert.clone(),
            alert_seq: self.alert_seq,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RequestOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOutcome")
            .field("data", &self.data)
            .field("loading", &self.loading)
            .field("alert", &self.alert)
            .finish()
    }
}

/// 通信中フラグを下ろすガード
///
/// 操作のFutureが完了前に破棄された場合（タイムアウト・`select!`など）も
/// loadingがtrueのまま残らないようにする。
struct LoadingGuard<'a, T> {
    state: &'a watch::Sender<RequestOutcome<T>>,
    armed: bool,
}

impl<'a, T> LoadingGuard<'a, T> {
    fn new(state: &'a watch::Sender<RequestOutcome<T>>) -> Self {
        Self { state, armed: true }
    }

    /// 結果の反映側でloadingを下ろす場合に呼ぶ
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(|s| s.loading = false);
        }
    }
}

/// 1つのコレクションに対するリクエスト状態
///
/// `T` はレスポンスボディの型（既定は蔵書一覧）。
pub struct RequestState<T = Vec<Entry>, Tr = HttpTransport> {
    base_url: String,
    transport: Tr,
    state: Arc<watch::Sender<RequestOutcome<T>>>,
    timer: Mutex<AlertTimer>,
    alert_duration: Duration,
}

impl<T> RequestState<T, HttpTransport>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_transport(base_url, HttpTransport::default())
    }

    /// 設定ファイルの内容（URL・タイムアウト・通知時間）から作成
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout())?;
        Ok(Self::with_transport(config.base_url.clone(), transport)
            .with_alert_duration(config.alert_duration()))
    }
}

impl<T, Tr> RequestState<T, Tr>
where
    T: DeserializeOwned + Send + Sync + 'static,
    Tr: Transport,
{
    pub fn with_transport(base_url: impl Into<String>, transport: Tr) -> Self {
        let (state, _) = watch::channel(RequestOutcome::default());
        Self {
            base_url: base_url.into(),
            transport,
            state: Arc::new(state),
            timer: Mutex::new(AlertTimer::new()),
            alert_duration: DEFAULT_ALERT_DURATION,
        }
    }

    pub fn with_alert_duration(mut self, duration: Duration) -> Self {
        self.alert_duration = duration;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &Tr {
        &self.transport
    }

    /// 現在の状態のコピー
    pub fn snapshot(&self) -> RequestOutcome<T> {
        self.state.borrow().clone()
    }

    pub fn data(&self) -> Option<Arc<T>> {
        self.state.borrow().data.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn alert(&self) -> Alert {
        self.state.borrow().alert.clone()
    }

    /// 状態が変わるたびに通知を受け取る（再描画用）
    pub fn subscribe(&self) -> watch::Receiver<RequestOutcome<T>> {
        self.state.subscribe()
    }

    /// 一覧などを取得
    pub async fn get(&self, path: &str) -> Result<()> {
        self.execute(Method::Get, path, None).await
    }

    /// 新規作成
    pub async fn post<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<()> {
        let body = serde_json::to_value(payload)?;
        self.execute(Method::Post, path, Some(body)).await
    }

    /// 更新（PUT）
    pub async fn update<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<()> {
        let body = serde_json::to_value(payload)?;
        self.execute(Method::Put, path, Some(body)).await
    }

    /// 削除
    pub async fn remove(&self, path: &str) -> Result<()> {
        self.execute(Method::Delete, path, None).await
    }

    /// 全操作の共通処理
    ///
    /// ボディはPOST/PUTの時だけ送り、それ以外では無視する。
    pub async fn execute(&self, method: Method, path: &str, payload: Option<Value>) -> Result<()> {
        let url = self.url_for(path)?;
        let body = payload.filter(|_| method.has_body());

        debug!(%method, %url, "request started");
        self.state.send_modify(|s| s.loading = true);
        let mut loading = LoadingGuard::new(&self.state);

        let result = match self.transport.send(method, &url, body.as_ref()).await {
            Ok(value) => serde_json::from_value::<T>(value)
                .map_err(|e| CatalogError::Decode(e.to_string())),
            Err(err) => Err(err),
        };

        match result {
            Ok(data) => {
                info!(%method, %url, "request succeeded");
                loading.disarm();
                self.settle(Some(Arc::new(data)), Alert::success(SUCCESS_MESSAGE));
                Ok(())
            }
            Err(err) if err.is_transport() => {
                warn!(%method, %url, error = %err, "request failed");
                loading.disarm();
                self.settle(None, Alert::error(error_message(&err)));
                Ok(())
            }
            // loadingはガードが下ろす
            Err(err) => Err(err),
        }
    }

    /// `{base}/{path}` を組み立てる
    pub fn url_for(&self, path: &str) -> Result<Url> {
        let raw = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| CatalogError::InvalidUrl(format!("{} ({})", raw, e)))
    }

    /// 結果を反映し、通知タイマーを予約し直す
    ///
    /// タイマーのロックを保持したまま状態を更新するので、
    /// 保留中のタスクは常に最新の通知に対応する。
    fn settle(&self, data: Option<Arc<T>>, alert: Alert) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut seq = 0;
        self.state.send_modify(|s| {
            if let Some(data) = data {
                s.data = Some(data);
            }
            s.alert = alert;
            s.alert_seq += 1;
            s.loading = false;
            seq = s.alert_seq;
        });

        let state = Arc::clone(&self.state);
        timer.rearm(self.alert_duration, async move {
            let hidden = state.send_if_modified(|s| {
                if s.alert_seq == seq && s.alert.show {
                    s.alert.hide();
                    true
                } else {
                    false
                }
            });
            if hidden {
                debug!(seq, "alert hidden");
            }
        });
    }
}
