//! End-to-end dispatch tests over in-memory backends.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde_json::{Map, Value, json};
use tempfile::TempDir;

use music_dispatch_server::backends::catalog::{CatalogItem, DownloadRecord, FilterKind, ItemKind};
use music_dispatch_server::backends::store::{ColumnInfo, Row, SqlParam};
use music_dispatch_server::backends::{
    BackendError, BackendResult, DownloadStore, MusicCatalog, RelationalStore,
};
use music_dispatch_server::core::{Config, McpServer};
use music_dispatch_server::domains::resources::build_directory;
use music_dispatch_server::domains::tools::definitions::CalculateSumTool;
use music_dispatch_server::domains::tools::{
    Dispatcher, FailureKind, InvocationResult, MismatchReason, ToolRegistry, build_registry,
};
use music_dispatch_server::Error;

#[derive(Default)]
struct MockStore {
    calls: AtomicUsize,
    fail_next_query: AtomicBool,
}

#[async_trait::async_trait]
impl RelationalStore for MockStore {
    async fn query(&self, sql: &str, _params: &[SqlParam]) -> BackendResult<Vec<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_query.swap(false, Ordering::SeqCst) {
            return Err(BackendError::unavailable("connection reset"));
        }
        let mut row = Map::new();
        row.insert("sql".to_string(), json!(sql));
        Ok(vec![row])
    }

    async fn execute(&self, _sql: &str, _params: &[SqlParam]) -> BackendResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(2)
    }

    async fn list_tables(&self) -> BackendResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec!["albums".to_string(), "artists".to_string()])
    }

    async fn describe_table(&self, table: &str) -> BackendResult<Vec<ColumnInfo>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::not_found(format!("table {}", table)))
    }
}

#[derive(Default)]
struct MockCatalog {
    calls: AtomicUsize,
}

impl MockCatalog {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl MusicCatalog for MockCatalog {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        filter: FilterKind,
    ) -> BackendResult<Vec<CatalogItem>> {
        self.hit();
        let kind = match filter {
            FilterKind::Albums => ItemKind::Album,
            FilterKind::Artists => ItemKind::Artist,
            _ => ItemKind::Song,
        };
        Ok((0..limit.min(2))
            .map(|i| CatalogItem::new(kind, i.to_string(), query))
            .collect())
    }

    async fn get_details(&self, id: &str) -> BackendResult<CatalogItem> {
        self.hit();
        Ok(CatalogItem::new(ItemKind::Song, id, "Creep"))
    }

    async fn get_artist(&self, id: &str, _limit: usize) -> BackendResult<CatalogItem> {
        self.hit();
        Ok(CatalogItem::new(ItemKind::Artist, id, "Radiohead"))
    }

    async fn get_album(&self, id: &str) -> BackendResult<CatalogItem> {
        self.hit();
        Ok(CatalogItem::new(ItemKind::Album, id, "Pablo Honey"))
    }

    async fn get_trending(&self, _limit: usize) -> BackendResult<Vec<CatalogItem>> {
        self.hit();
        Ok(Vec::new())
    }

    async fn get_recommendations(
        &self,
        _id: &str,
        _limit: usize,
    ) -> BackendResult<Vec<CatalogItem>> {
        self.hit();
        Ok(Vec::new())
    }

    async fn download(&self, _id: &str, _filename: Option<&str>) -> BackendResult<DownloadRecord> {
        self.hit();
        Err(BackendError::unsupported("no media in tests"))
    }
}

struct Harness {
    store: Arc<MockStore>,
    catalog: Arc<MockCatalog>,
    dispatcher: Dispatcher,
    _dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MockStore::default());
        let catalog = Arc::new(MockCatalog::default());
        let registry = build_registry(
            store.clone(),
            catalog.clone(),
            DownloadStore::new(dir.path()),
        )
        .unwrap();

        Self {
            store,
            catalog,
            dispatcher: Dispatcher::new(Arc::new(registry)),
            _dir: dir,
        }
    }

    fn backend_calls(&self) -> usize {
        self.store.calls.load(Ordering::SeqCst) + self.catalog.calls.load(Ordering::SeqCst)
    }

    async fn call(&self, name: &str, args: Value) -> InvocationResult {
        self.dispatcher.dispatch(name, Some(args)).await
    }
}

#[test]
fn test_manifest_lists_every_tool_once_in_order() {
    let harness = Harness::new();
    let registry = harness.dispatcher.registry();

    assert_eq!(
        registry.tool_names(),
        vec![
            "get_current_time",
            "calculate_sum",
            "reverse_string",
            "postgres_query",
            "postgres_execute",
            "postgres_list_tables",
            "postgres_get_schema",
            "music_search",
            "music_get_song_details",
            "music_get_artist_details",
            "music_get_album_details",
            "music_get_trending",
            "music_get_recommendations",
            "music_download",
            "music_list_downloaded",
        ]
    );

    for name in registry.tool_names() {
        assert_eq!(registry.resolve(name).unwrap().name, name);
    }

    let manifest = registry.manifest();
    assert_eq!(manifest.len(), 15);
    assert_eq!(manifest[3]["inputSchema"]["required"], json!(["query"]));
}

#[tokio::test]
async fn test_unknown_tool_touches_no_backend() {
    let harness = Harness::new();
    let result = harness.call("nonexistent_tool", json!({})).await;

    assert_eq!(result.failure_kind(), Some(FailureKind::UnknownTool));
    assert_eq!(
        result.render(),
        "Tool lookup failed: Unknown tool: nonexistent_tool"
    );
    assert_eq!(harness.backend_calls(), 0);
}

#[tokio::test]
async fn test_missing_required_argument_blocks_handler() {
    let harness = Harness::new();

    let result = harness.call("postgres_query", json!({})).await;
    assert_eq!(result.failure_kind(), Some(FailureKind::InvalidArguments));
    assert_eq!(harness.backend_calls(), 0);

    let result = harness
        .call("postgres_query", json!({"query": "SELECT 1"}))
        .await;
    assert!(!result.is_error());
    assert_eq!(harness.backend_calls(), 1);
}

#[tokio::test]
async fn test_basic_tools() {
    let harness = Harness::new();

    let sum = harness.call("calculate_sum", json!({"a": 15, "b": 7})).await;
    assert_eq!(sum, InvocationResult::success(json!(22)));

    let reversed = harness
        .call("reverse_string", json!({"text": "Hello World"}))
        .await;
    assert_eq!(reversed, InvocationResult::success(json!("dlroW olleH")));
    assert_eq!(reversed.render(), "dlroW olleH");
}

#[tokio::test]
async fn test_store_failure_is_contained() {
    let harness = Harness::new();
    harness.store.fail_next_query.store(true, Ordering::SeqCst);

    let failed = harness
        .call("postgres_query", json!({"query": "SELECT * FROM albums"}))
        .await;
    assert_eq!(failed.failure_kind(), Some(FailureKind::HandlerError));
    assert_eq!(
        failed.render(),
        "Query failed: Upstream unavailable: connection reset"
    );

    let next = harness
        .call("postgres_query", json!({"query": "SELECT * FROM albums"}))
        .await;
    assert!(!next.is_error());
}

#[tokio::test]
async fn test_extra_keys_are_ignored() {
    let harness = Harness::new();
    let result = harness
        .call("reverse_string", json!({"text": "abc", "verbose": true}))
        .await;
    assert_eq!(result, InvocationResult::success(json!("cba")));
}

#[tokio::test]
async fn test_invalid_optional_values_fall_back_to_defaults() {
    let harness = Harness::new();
    let result = harness
        .call(
            "music_search",
            json!({"query": "creep", "limit": "ten", "filter_type": "podcasts"}),
        )
        .await;

    let InvocationResult::Success { payload } = result else {
        panic!("expected success, got {:?}", result);
    };
    let items = payload.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["type"], "song");
}

#[test]
fn test_enum_violation_and_kind_mismatch_are_distinct() {
    let harness = Harness::new();
    let schema = &harness
        .dispatcher
        .registry()
        .resolve("music_search")
        .unwrap()
        .schema;

    let args = json!({"query": "creep", "limit": "ten", "filter_type": "podcasts"});
    let outcome = schema.validate(args.as_object().unwrap());

    assert!(outcome.missing_required.is_empty());
    assert_eq!(outcome.type_mismatches.len(), 2);
    let limit = outcome
        .type_mismatches
        .iter()
        .find(|m| m.field == "limit")
        .unwrap();
    let filter = outcome
        .type_mismatches
        .iter()
        .find(|m| m.field == "filter_type")
        .unwrap();
    assert!(matches!(limit.reason, MismatchReason::WrongKind { .. }));
    assert!(matches!(filter.reason, MismatchReason::NotAllowed { .. }));
}

#[test]
fn test_duplicate_registration_aborts_build() {
    let mut builder = ToolRegistry::builder();
    builder.register(CalculateSumTool::descriptor()).unwrap();
    let err = builder.register(CalculateSumTool::descriptor()).unwrap_err();
    assert!(matches!(err, Error::DuplicateTool(name) if name == "calculate_sum"));
}

#[tokio::test]
async fn test_server_renders_failures_for_clients() {
    let harness = Harness::new();
    let resources = build_directory(&Config::default(), 15, harness.store.clone()).unwrap();
    let server = McpServer::new(Config::default(), harness.dispatcher.clone(), resources);

    let result = server
        .call_tool("music_download", Some(json!({"id": "abc"})))
        .await;
    assert_eq!(result["isError"], true);
    assert_eq!(
        result["content"][0]["text"],
        "Download failed: Unsupported: no media in tests"
    );

    let first = server.read_resource("example://sample-data").await.unwrap();
    let second = server.read_resource("example://sample-data").await.unwrap();
    assert_eq!(first, second);

    let err = server.read_resource("example://missing").await.unwrap_err();
    assert_eq!(
        err,
        "Resource read failed: Unknown resource: example://missing"
    );
}
