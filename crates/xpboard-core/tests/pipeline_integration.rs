//! Integration tests for the analytics pipeline against an in-memory query service

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;
use xpboard_core::chart::ChartKind;
use xpboard_core::{
    ActiveChart, AnalyticsPipeline, CoreError, Credential, DashboardConfig, LoadOutcome,
    QueryRequest, QueryResponse, QueryTransport, StaticCredentials, ViewState,
};

/// Each request waits for the next scripted response
#[derive(Default)]
struct ScriptedTransport {
    pending: Mutex<VecDeque<oneshot::Receiver<xpboard_core::Result<QueryResponse>>>>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl ScriptedTransport {
    /// Queue a response slot; the returned sender releases it
    fn expect(&self) -> oneshot::Sender<xpboard_core::Result<QueryResponse>> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().push_back(rx);
        tx
    }

    /// Queue an immediately available response
    fn respond(&self, response: xpboard_core::Result<QueryResponse>) {
        let _ = self.expect().send(response);
    }

    fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl QueryTransport for ScriptedTransport {
    async fn post(
        &self,
        request: &QueryRequest,
        _credential: &Credential,
    ) -> xpboard_core::Result<QueryResponse> {
        self.requests.lock().push(request.clone());
        let slot = self.pending.lock().pop_front();
        match slot {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(CoreError::malformed("response slot dropped"))),
            None => Err(CoreError::malformed("unexpected request")),
        }
    }
}

fn ok(data: Value) -> xpboard_core::Result<QueryResponse> {
    Ok(serde_json::from_value(json!({ "data": data })).unwrap())
}

fn transaction(id: i64, amount: u64, created_at: &str, path: &str, parent_type: &str) -> Value {
    let name = path.rsplit('/').next().unwrap_or_default();
    json!({
        "id": id,
        "amount": amount,
        "createdAt": created_at,
        "path": path,
        "object": {
            "name": name,
            "type": "exercise",
            "parents": [{ "parent": { "name": "parent", "type": parent_type } }]
        }
    })
}

fn taxonomy_data() -> Value {
    json!({
        "user": [{
            "id": 42,
            "login": "jdoe",
            "xpTransactions": [
                transaction(1, 5000, "2024-01-10T10:00:00Z", "/athens/div-01/go-reloaded", "module"),
                transaction(2, 700, "2024-01-02T10:00:00Z", "/athens/div-01/piscine-js/ex1", "piscine"),
                transaction(3, 900, "2024-01-03T10:00:00Z", "/athens/div-01/piscine-js/quest-01/ex1", "piscine"),
                transaction(4, 100, "2024-01-04T10:00:00Z", "/athens/div-01/ascii-art/fs", "project"),
            ]
        }]
    })
}

fn dataset_data(login: &str, amounts: &[u64]) -> Value {
    let transactions: Vec<Value> = amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| {
            transaction(
                i as i64 + 1,
                *amount,
                &format!("2024-02-{:02}T12:00:00Z", i + 1),
                "/athens/div-01/project",
                "module",
            )
        })
        .collect();

    json!({
        "user": [{
            "id": 42,
            "login": login,
            "xpTransactions": transactions,
            "skillTransactions": [
                { "type": "skill_js", "amount": 40 },
                { "type": "skill_go", "amount": 70 }
            ],
            "progresses": [
                { "id": 9, "grade": 1.2, "updatedAt": "2024-02-05T00:00:00Z",
                  "object": { "name": "go-reloaded", "type": "project" } }
            ]
        }]
    })
}

fn pipeline(transport: Arc<ScriptedTransport>, token: Option<&str>) -> Arc<AnalyticsPipeline> {
    Arc::new(AnalyticsPipeline::new(
        DashboardConfig::default(),
        transport,
        Arc::new(StaticCredentials::new(token.map(str::to_string))),
    ))
}

async fn wait_for_requests(transport: &ScriptedTransport, count: usize) {
    while transport.request_count() < count {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_refresh_builds_taxonomy_then_view() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.respond(ok(taxonomy_data()));
    transport.respond(ok(dataset_data("jdoe", &[12_300, 9_000])));
    let pipeline = pipeline(transport.clone(), Some("token"));

    let outcome = pipeline.refresh().await.unwrap();

    let taxonomy = pipeline.taxonomy();
    assert_eq!(taxonomy.entries(), vec!["all", "div-01", "piscine-js"]);

    let view = outcome.view().cloned().unwrap();
    assert_eq!(view.category, "all");
    assert_eq!(view.user.login, "jdoe");
    assert_eq!(view.total_xp, 21);
    assert_eq!(view.skills.top()[0].name, "Golang");
    assert_eq!(view.stats.completed_projects, 1);

    // Taxonomy first, then the dataset with an unrestricted predicate
    let requests = transport.requests.lock().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].operation(), "FolderTaxonomy");
    assert_eq!(requests[1].operation(), "Dataset");
    assert_eq!(
        requests[1].variables.as_ref().unwrap()["where"],
        json!({ "type": { "_eq": "xp" } })
    );
}

#[tokio::test]
async fn test_slow_result_for_old_selection_is_discarded() {
    let transport = Arc::new(ScriptedTransport::default());
    let first = transport.expect();
    let second = transport.expect();
    let pipeline = pipeline(transport.clone(), Some("token"));

    let p = pipeline.clone();
    let old = tokio::spawn(async move { p.select_category("div-01").await });
    wait_for_requests(&transport, 1).await;

    let p = pipeline.clone();
    let new = tokio::spawn(async move { p.select_category("piscine-js").await });
    wait_for_requests(&transport, 2).await;

    // Newer request resolves first, the older one afterwards
    second.send(ok(dataset_data("new", &[3000]))).unwrap();
    let new_outcome = new.await.unwrap().unwrap();
    assert_eq!(new_outcome.view().unwrap().category, "piscine-js");

    first.send(ok(dataset_data("old", &[1000, 2000]))).unwrap();
    let old_outcome = old.await.unwrap().unwrap();
    match old_outcome {
        LoadOutcome::Stale { requested, current } => {
            assert_eq!(requested, "div-01");
            assert_eq!(current, "piscine-js");
        }
        LoadOutcome::Loaded(_) => panic!("stale dataset was applied"),
    }

    let state = pipeline.state();
    let view = state.view().unwrap();
    assert_eq!(view.category, "piscine-js");
    assert_eq!(view.user.login, "new");
}

#[tokio::test]
async fn test_loading_unselected_folder_keeps_current_view() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.respond(ok(dataset_data("current", &[2000])));
    let pending = transport.expect();
    let pipeline = pipeline(transport.clone(), Some("token"));

    pipeline.select_category("all").await.unwrap();
    assert!(matches!(pipeline.state(), ViewState::Ready(_)));

    let p = pipeline.clone();
    let background = tokio::spawn(async move { p.load_category("div-01").await });
    wait_for_requests(&transport, 2).await;

    // While the fetch is in flight the ready view stays in place
    assert_eq!(pipeline.state().view().unwrap().category, "all");

    pending.send(ok(dataset_data("other", &[9000]))).unwrap();
    assert!(background.await.unwrap().unwrap().is_stale());

    let state = pipeline.state();
    let view = state.view().unwrap();
    assert_eq!(view.category, "all");
    assert_eq!(view.user.login, "current");
    assert_eq!(pipeline.selected(), "all");
}

#[tokio::test]
async fn test_stale_error_does_not_fail_current_view() {
    let transport = Arc::new(ScriptedTransport::default());
    let first = transport.expect();
    let second = transport.expect();
    let pipeline = pipeline(transport.clone(), Some("token"));

    let p = pipeline.clone();
    let old = tokio::spawn(async move { p.select_category("div-01").await });
    wait_for_requests(&transport, 1).await;

    let p = pipeline.clone();
    let new = tokio::spawn(async move { p.select_category("all").await });
    wait_for_requests(&transport, 2).await;

    first.send(Err(CoreError::Transport { status: 502 })).unwrap();
    assert!(old.await.unwrap().unwrap().is_stale());

    second.send(ok(dataset_data("jdoe", &[1500]))).unwrap();
    assert!(new.await.unwrap().unwrap().view().is_some());
    assert!(matches!(pipeline.state(), ViewState::Ready(_)));
}

#[tokio::test]
async fn test_protocol_error_sets_failed_state() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.respond(Ok(serde_json::from_value(json!({
        "errors": [{ "message": "Could not verify JWT: JWTExpired" }]
    }))
    .unwrap()));
    let pipeline = pipeline(transport, Some("token"));

    let err = pipeline.select_category("div-01").await.unwrap_err();
    assert!(matches!(err, CoreError::Protocol { .. }));

    match pipeline.state() {
        ViewState::Failed(view_error) => {
            assert_eq!(view_error.message, "Could not verify JWT: JWTExpired");
        }
        other => panic!("expected failed state, got {other:?}"),
    }
    assert!(pipeline.timeline_chart().is_none());
    assert!(pipeline.radar_layout().is_none());
}

#[tokio::test]
async fn test_missing_credential_fails_before_network() {
    let transport = Arc::new(ScriptedTransport::default());
    let pipeline = pipeline(transport.clone(), None);

    let err = pipeline.refresh().await.unwrap_err();
    assert!(matches!(err, CoreError::MissingCredential));
    assert_eq!(transport.request_count(), 0);

    match pipeline.state() {
        ViewState::Failed(view_error) => assert!(view_error.suggestion.is_some()),
        other => panic!("expected failed state, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_user_row_is_malformed() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.respond(ok(json!({ "user": [] })));
    let pipeline = pipeline(transport, Some("token"));

    let err = pipeline.refresh_taxonomy().await.unwrap_err();
    assert!(matches!(err, CoreError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_negative_amount_is_malformed() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.respond(ok(json!({
        "user": [{
            "id": 1,
            "login": "jdoe",
            "xpTransactions": [{
                "id": 1, "amount": -5, "createdAt": "2024-01-01T00:00:00Z",
                "path": "/athens/div-01/x", "object": null
            }]
        }]
    })));
    let pipeline = pipeline(transport, Some("token"));

    let err = pipeline.refresh_taxonomy().await.unwrap_err();
    assert!(matches!(err, CoreError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_empty_dataset_degrades_to_empty_charts() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.respond(ok(json!({
        "user": [{ "id": 1, "login": "fresh", "xpTransactions": [], "skillTransactions": [], "progresses": [] }]
    })));
    let pipeline = pipeline(transport, Some("token"));

    let view = pipeline.select_category("all").await.unwrap().view().cloned().unwrap();
    assert_eq!(view.total_xp, 0);
    assert!(view.series.is_empty());
    assert!(view.recent_activity.is_empty());

    pipeline.set_chart_kind(ChartKind::Radar);
    match pipeline.active_chart() {
        Some(ActiveChart::Radar(layout)) => assert!(layout.is_empty()),
        other => panic!("expected empty radar, got {other:?}"),
    }

    pipeline.set_chart_kind(ChartKind::Timeline);
    match pipeline.active_chart() {
        Some(ActiveChart::Timeline(chart)) => assert!(chart.is_empty()),
        other => panic!("expected empty timeline, got {other:?}"),
    }

    pipeline.set_chart_kind(ChartKind::None);
    assert!(pipeline.active_chart().is_none());
}

#[tokio::test]
async fn test_reloading_same_records_is_idempotent() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.respond(ok(dataset_data("jdoe", &[4000, 6000, 2500])));
    transport.respond(ok(dataset_data("jdoe", &[4000, 6000, 2500])));
    let pipeline = pipeline(transport, Some("token"));

    let first = pipeline.select_category("div-01").await.unwrap().view().cloned().unwrap();
    let second = pipeline.select_category("div-01").await.unwrap().view().cloned().unwrap();

    assert_eq!(first.series, second.series);
    assert_eq!(first.skills, second.skills);
    assert_eq!(first.total_xp, second.total_xp);
    assert_eq!(first.monthly, second.monthly);
}

#[tokio::test]
async fn test_vanished_selection_falls_back_to_all() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.respond(ok(dataset_data("jdoe", &[1000])));
    transport.respond(ok(taxonomy_data()));
    transport.respond(ok(dataset_data("jdoe", &[1000])));
    let pipeline = pipeline(transport, Some("token"));

    pipeline.select_category("piscine-rust").await.unwrap();
    assert_eq!(pipeline.selected(), "piscine-rust");

    let outcome = pipeline.refresh().await.unwrap();
    assert_eq!(pipeline.selected(), "all");
    assert_eq!(outcome.view().unwrap().category, "all");
}
