//! 通知の自動非表示タイマー
//!
//! 保留中のタスクは常に高々1つ。再設定のたびに前のタスクを中止してから予約し直す。

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default)]
pub struct AlertTimer {
    pending: Option<JoinHandle<()>>,
}

impl AlertTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `delay` 後に `on_fire` を実行するよう予約し直す
    ///
    /// tokioランタイム内から呼ぶこと
    pub fn rearm<F>(&mut self, delay: Duration, on_fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.cancel() {
            debug!("alert timer rearmed");
        }

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire.await;
        }));
    }

    /// 保留中のタスクを中止する（中止したらtrue）
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for AlertTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
