//! リクエスト状態管理テスト
//!
//! 差し替え可能な通信層で、状態遷移・通知・自動非表示を検証

use book_catalog::error::{CatalogError, Result};
use book_catalog::transport::{Method, Transport};
use book_catalog::{AlertKind, Entry, RequestState};
use reqwest::Url;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

/// 1回分の応答
struct Reply {
    delay: Duration,
    outcome: std::result::Result<Value, u16>,
}

/// あらかじめ登録した応答を順に返す通信層
#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(Method, String, Option<Value>)>>,
}

impl ScriptedTransport {
    fn ok(self, body: Value) -> Self {
        self.ok_after(Duration::ZERO, body)
    }

    fn ok_after(self, delay: Duration, body: Value) -> Self {
        self.replies.lock().unwrap().push_back(Reply { delay, outcome: Ok(body) });
        self
    }

    fn status(self, code: u16) -> Self {
        self.status_after(Duration::ZERO, code)
    }

    fn status_after(self, delay: Duration, code: u16) -> Self {
        self.replies.lock().unwrap().push_back(Reply { delay, outcome: Err(code) });
        self
    }

    fn calls(&self) -> Vec<(Method, String, Option<Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, method: Method, url: &Url, payload: Option<&Value>) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((method, url.to_string(), payload.cloned()));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted reply left");

        sleep(reply.delay).await;
        reply.outcome.map_err(CatalogError::Status)
    }
}

const BASE: &str = "http://localhost:3000";

fn books() -> Value {
    json!([
        {"id": 1, "name": "Dune", "author": "Herbert", "genres": ["scifi"], "stars": 5, "completed": true},
        {"id": 2, "name": "Emma", "author": "Austen", "genres": ["romance"], "stars": null, "completed": false}
    ])
}

fn state(transport: ScriptedTransport) -> RequestState<Vec<Entry>, ScriptedTransport> {
    RequestState::with_transport(BASE, transport)
}

/// 取得成功でデータが丸ごと置き換わる
#[tokio::test(start_paused = true)]
async fn test_get_replaces_data() {
    let s = state(ScriptedTransport::default().ok(books()));

    s.get("books").await.expect("get failed");

    let data = s.data().expect("data missing");
    assert_eq!(data.len(), 2);
    assert_eq!(data[0].name, "Dune");
    assert_eq!(data[1].name, "Emma");
    assert_eq!(serde_json::to_value(&*data).unwrap()[0]["genres"], json!(["scifi"]));
    assert!(!s.loading());

    let alert = s.alert();
    assert!(alert.show);
    assert_eq!(alert.kind, AlertKind::Success);
    assert_eq!(alert.message, "Book added successfully");

    let calls = s.transport().calls();
    assert_eq!(calls, vec![(Method::Get, format!("{}/books", BASE), None)]);
}

/// 成功のたびに前回のデータとはマージせず置き換える
#[tokio::test(start_paused = true)]
async fn test_success_is_full_replace() {
    let s = state(
        ScriptedTransport::default()
            .ok(books())
            .ok(json!([{"id": 9, "name": "Solaris", "author": "Lem", "genres": []}])),
    );

    s.get("books").await.unwrap();
    let first = s.data().unwrap();
    s.get("books").await.unwrap();
    let second = s.data().unwrap();

    assert_eq!(second.len(), 1);
    assert_eq!(second[0].name, "Solaris");
    assert!(!std::sync::Arc::ptr_eq(&first, &second));
}

/// 失敗時はデータを保持しエラー通知を出す（呼び出し元にはエラーを返さない）
#[tokio::test(start_paused = true)]
async fn test_failure_keeps_data() {
    let s = state(ScriptedTransport::default().ok(books()).status(500));

    s.get("books").await.unwrap();
    let before = s.data().unwrap();

    let result = s.get("books").await;
    assert!(result.is_ok());

    let after = s.data().unwrap();
    assert!(std::sync::Arc::ptr_eq(&before, &after));
    assert!(!s.loading());

    let alert = s.alert();
    assert!(alert.show);
    assert_eq!(alert.kind, AlertKind::Error);
    assert!(alert.message.starts_with("Error: "));
    assert!(alert.message.contains("500"));
}

/// 未取得のまま失敗した場合はdataはNoneのまま
#[tokio::test(start_paused = true)]
async fn test_failure_before_first_fetch() {
    let s = state(ScriptedTransport::default().status(404));

    s.get("books").await.unwrap();

    assert!(s.data().is_none());
    assert_eq!(s.alert().kind, AlertKind::Error);
    assert!(s.alert().message.contains("404"));
}

/// 型に合わないレスポンスはエラー通知
#[tokio::test(start_paused = true)]
async fn test_undecodable_body_is_error_alert() {
    let s = state(ScriptedTransport::default().ok(json!({"unexpected": "object"})));

    s.get("books").await.unwrap();

    assert!(s.data().is_none());
    assert_eq!(s.alert().kind, AlertKind::Error);
}

/// 通信中だけloadingがtrue
#[tokio::test(start_paused = true)]
async fn test_loading_while_in_flight() {
    let s = state(ScriptedTransport::default().ok_after(Duration::from_millis(100), books()));
    assert!(!s.loading());

    let observe = async {
        sleep(Duration::from_millis(50)).await;
        (s.loading(), s.data().is_none())
    };
    let (result, (loading_mid_flight, no_data_yet)) = tokio::join!(s.get("books"), observe);

    result.unwrap();
    assert!(loading_mid_flight);
    assert!(no_data_yet);
    assert!(!s.loading());
}

/// 完了前に破棄された操作（タイムアウトなど）はloadingを残さない
#[tokio::test(start_paused = true)]
async fn test_dropped_request_clears_loading() {
    let s = state(ScriptedTransport::default().ok_after(Duration::from_secs(10), books()));

    let timed_out = tokio::time::timeout(Duration::from_secs(1), s.get("books")).await;

    assert!(timed_out.is_err());
    assert!(!s.loading());
    assert!(s.data().is_none());
    assert!(!s.alert().show);

    // 破棄後に結果が反映されることもない
    sleep(Duration::from_secs(60)).await;
    assert!(!s.loading());
    assert!(s.data().is_none());
}

/// 作成: ペイロードを送り、返ってきたコレクション全体がdataになる
#[tokio::test(start_paused = true)]
async fn test_post_with_echoed_collection() {
    let collection = json!([
        {"id": 1, "name": "Dune", "author": "Herbert", "genres": ["scifi"], "completed": false}
    ]);
    let s = state(ScriptedTransport::default().ok(collection));

    let mut book = Entry::new("Dune", "Herbert");
    book.genres = vec!["scifi".to_string()];
    s.post("books", &book).await.unwrap();

    let data = s.data().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].name, "Dune");

    let alert = s.alert();
    assert_eq!(
        serde_json::to_value(&alert).unwrap(),
        json!({"show": true, "message": "Book added successfully", "type": "success"})
    );

    let calls = s.transport().calls();
    assert_eq!(calls[0].0, Method::Post);
    let sent = calls[0].2.as_ref().expect("payload missing");
    assert_eq!(sent["name"], "Dune");
    assert_eq!(sent["author"], "Herbert");
    assert_eq!(sent["genres"], json!(["scifi"]));
    assert_eq!(sent["completed"], false);
    assert!(sent.get("id").is_none());
}

/// 更新・削除のメソッドとURL
#[tokio::test(start_paused = true)]
async fn test_update_and_remove_routes() {
    let s: RequestState<Value, ScriptedTransport> = RequestState::with_transport(
        BASE,
        ScriptedTransport::default().ok(json!({"id": 2})).ok(json!({})),
    );

    s.update("books/2", &json!({"id": 2, "name": "Emma"})).await.unwrap();
    s.remove("books/2").await.unwrap();

    let calls = s.transport().calls();
    assert_eq!(calls[0].0, Method::Put);
    assert_eq!(calls[0].1, format!("{}/books/2", BASE));
    assert_eq!(calls[0].2, Some(json!({"id": 2, "name": "Emma"})));
    assert_eq!(calls[1].0, Method::Delete);
    assert_eq!(calls[1].2, None);

    // 削除のレスポンスもそのままdataになる
    assert_eq!(*s.data().unwrap(), json!({}));
}

/// GETとDELETEではペイロードを送らない
#[tokio::test(start_paused = true)]
async fn test_payload_ignored_for_get() {
    let s = state(ScriptedTransport::default().ok(books()));

    s.execute(Method::Get, "books", Some(json!({"ignored": true}))).await.unwrap();

    assert_eq!(s.transport().calls()[0].2, None);
}

/// 不正なURLは使い方の誤りとして呼び出し元へ返る
#[tokio::test(start_paused = true)]
async fn test_invalid_url_propagates() {
    let s: RequestState<Vec<Entry>, ScriptedTransport> =
        RequestState::with_transport("no scheme here", ScriptedTransport::default());

    let result = s.get("books").await;

    assert!(matches!(result, Err(CatalogError::InvalidUrl(_))));
    assert!(!s.loading());
    assert!(!s.alert().show);
    assert!(s.transport().calls().is_empty());
}

/// 通知は5秒後に自動で非表示
#[tokio::test(start_paused = true)]
async fn test_alert_auto_hides() {
    let s = state(ScriptedTransport::default().ok(books()));

    s.get("books").await.unwrap();
    assert!(s.alert().show);

    sleep(Duration::from_millis(4900)).await;
    assert!(s.alert().show);

    sleep(Duration::from_millis(200)).await;
    let alert = s.alert();
    assert!(!alert.show);
    assert_eq!(alert.message, "Book added successfully");
}

/// 後の通知が前のタイマーで隠されない
#[tokio::test(start_paused = true)]
async fn test_newer_alert_not_hidden_by_stale_timer() {
    let s = state(ScriptedTransport::default().ok(books()).status(503));

    s.get("books").await.unwrap();
    sleep(Duration::from_secs(3)).await;
    s.get("books").await.unwrap();

    // 最初の通知から5秒後
    sleep(Duration::from_secs(2)).await;
    let alert = s.alert();
    assert!(alert.show);
    assert_eq!(alert.kind, AlertKind::Error);

    // 2回目の通知から5秒直前
    sleep(Duration::from_millis(2900)).await;
    assert!(s.alert().show);

    sleep(Duration::from_millis(200)).await;
    assert!(!s.alert().show);
}

/// 通知時間は変更できる
#[tokio::test(start_paused = true)]
async fn test_custom_alert_duration() {
    let s = state(ScriptedTransport::default().ok(books()))
        .with_alert_duration(Duration::from_secs(1));

    s.get("books").await.unwrap();
    sleep(Duration::from_millis(1100)).await;
    assert!(!s.alert().show);
}

/// 同時実行では後に完了した方の結果が残る
#[tokio::test(start_paused = true)]
async fn test_last_settled_wins() {
    let slow = json!([{"id": 1, "name": "Slow", "author": "A"}]);
    let fast = json!([{"id": 2, "name": "Fast", "author": "B"}]);
    let s = state(
        ScriptedTransport::default()
            .ok_after(Duration::from_millis(200), slow)
            .ok_after(Duration::from_millis(50), fast),
    );

    let (first, second) = tokio::join!(s.get("books"), s.get("books"));
    first.unwrap();
    second.unwrap();

    let data = s.data().unwrap();
    assert_eq!(data[0].name, "Slow");
    assert!(!s.loading());
}

/// 先に完了した方がloadingを下ろす（順序制御はしない）
#[tokio::test(start_paused = true)]
async fn test_concurrent_loading_cleared_by_first_settlement() {
    let s = state(
        ScriptedTransport::default()
            .ok_after(Duration::from_millis(200), books())
            .status_after(Duration::from_millis(50), 500),
    );

    let observe = async {
        sleep(Duration::from_millis(100)).await;
        (s.loading(), s.alert().kind)
    };
    let (a, b, (loading, kind)) = tokio::join!(s.get("books"), s.get("books"), observe);
    a.unwrap();
    b.unwrap();

    assert!(!loading);
    assert_eq!(kind, AlertKind::Error);
    assert_eq!(s.alert().kind, AlertKind::Success);
    assert!(s.data().is_some());
}

/// 購読者は状態の変化を受け取る
#[tokio::test(start_paused = true)]
async fn test_subscribe_sees_changes() {
    let s = state(ScriptedTransport::default().ok(books()));
    let mut rx = s.subscribe();
    assert!(!rx.borrow_and_update().loading);

    s.get("books").await.unwrap();

    assert!(rx.has_changed().unwrap());
    let seen = rx.borrow_and_update().clone();
    assert!(!seen.loading);
    assert_eq!(seen.data.map(|d| d.len()), Some(2));

    sleep(Duration::from_secs(6)).await;
    assert!(rx.has_changed().unwrap());
    assert!(!rx.borrow_and_update().alert.show);
}
