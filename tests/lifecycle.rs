mod common;

use common::{new_map, provider, Probe, ProbeConnector};
use serde_json::json;
use std::sync::Arc;
use table_sync::{
    BackendError, Error, FetchMode, Key, MapBackend, MemoryServer, Provider, ProviderConfig,
};

// ---- construction -----------------------------------------------------------

#[test]
fn name_is_sanitized_at_construction() {
    let p = provider(&MemoryServer::new(), "My Test!!");
    assert_eq!(p.name(), "my_test__");
    assert_eq!(p.config().name, "my_test__");
}

#[test]
fn defaults() {
    let p = provider(&MemoryServer::new(), "settings");
    assert_eq!(p.config().host, "localhost");
    assert_eq!(p.config().port, 28015);
    assert_eq!(p.config().database, "enmap");
    assert_eq!(p.fetch_mode(), FetchMode::Eager);
}

#[test]
fn missing_name_is_a_config_error() {
    let err = Provider::builder("")
        .connector(MemoryServer::new())
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn missing_connector_is_a_config_error() {
    let err = Provider::builder("settings").build().unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn config_from_json_fills_defaults() {
    let config: ProviderConfig =
        serde_json::from_str(r#"{ "name": "Guild Prefs", "fetch_all": false }"#).unwrap();
    assert_eq!(config.host, "localhost");
    assert_eq!(config.fetch_mode(), FetchMode::Lazy);

    let p = Provider::new(config, MemoryServer::new()).unwrap();
    assert_eq!(p.name(), "guild_prefs");
}

#[test]
fn builder_overrides() {
    let p = Provider::builder("t")
        .host("db.internal")
        .port(29015)
        .database("cache")
        .fetch_all(false)
        .connector(MemoryServer::new())
        .build()
        .unwrap();
    assert_eq!(p.config().host, "db.internal");
    assert_eq!(p.config().port, 29015);
    assert_eq!(p.config().database, "cache");
    assert_eq!(p.fetch_mode(), FetchMode::Lazy);
}

#[test]
fn advertises_features() {
    assert!(Provider::FEATURES.multi_process);
    assert!(Provider::FEATURES.complex_types);
    assert!(Provider::FEATURES.multiple_key_types);
}

// ---- init -------------------------------------------------------------------

#[tokio::test]
async fn init_creates_database_and_table() {
    let server = MemoryServer::new();
    let p = Provider::builder("fresh")
        .database("custom_db")
        .connector(server.clone())
        .build()
        .unwrap();
    assert_eq!(server.row_count("custom_db", "fresh"), None);

    p.init(new_map()).await.unwrap();
    assert_eq!(server.row_count("custom_db", "fresh"), Some(0));
}

#[tokio::test]
async fn operations_before_init_fail() {
    let p = provider(&MemoryServer::new(), "early");
    assert_eq!(p.set("a", 1).unwrap_err(), Error::NotInitialized);
    assert_eq!(p.fetch("a").await.unwrap_err(), Error::NotInitialized);
    assert_eq!(p.bulk_delete().await.unwrap_err(), Error::NotInitialized);
}

#[test]
fn init_outside_a_tokio_runtime_is_a_config_error() {
    let connector = ProbeConnector::new(MemoryServer::new());
    let p = Provider::builder("no_runtime")
        .connector(connector.clone())
        .build()
        .unwrap();

    let err = futures::executor::block_on(p.init(new_map())).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{err:?}");
    assert_eq!(connector.probe.calls(), 0);
    assert!(!p.ready().is_ready());
}

#[tokio::test]
async fn ready_resolves_after_init() {
    let p = provider(&MemoryServer::new(), "ready");
    let ready = p.ready();
    assert!(!ready.is_ready());

    let returned = p.init(new_map()).await.unwrap();
    assert!(returned.is_ready());
    assert!(ready.is_ready());
    ready.wait().await.unwrap();
    ready.wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn waiters_registered_before_init_are_woken() {
    let p = Arc::new(provider(&MemoryServer::new(), "waiters"));
    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let ready = p.ready();
            tokio::spawn(async move { ready.wait().await })
        })
        .collect();

    p.init(new_map()).await.unwrap();
    for w in waiters {
        w.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn second_init_does_not_rehydrate() {
    let server = MemoryServer::new();
    let connector = ProbeConnector::new(server.clone());
    let p = Provider::builder("once")
        .connector(connector.clone())
        .build()
        .unwrap();
    let map = new_map();
    p.init(map.clone()).await.unwrap();
    let calls = connector.probe.calls();

    // Another process adds a row; a re-run of hydration would pick it up.
    common::seed(&server, "once", vec![(Key::from("late"), json!(1))]).await;

    let ready = p.init(map.clone()).await.unwrap();
    assert!(ready.is_ready());
    assert_eq!(connector.probe.calls(), calls);
    assert!(!map.contains_key(&Key::from("late")));
}

#[tokio::test]
async fn unreachable_backend_fails_init_and_leaves_signal_unresolved() {
    let connector = ProbeConnector::new(MemoryServer::new());
    Probe::set(&connector.probe.unreachable, true);
    let p = Provider::builder("down")
        .connector(connector.clone())
        .build()
        .unwrap();

    let err = p.init(new_map()).await.unwrap_err();
    assert!(matches!(err, Error::Connection(BackendError::Unreachable(_))));
    assert!(!p.ready().is_ready());

    // The backend comes back; init can be retried.
    Probe::set(&connector.probe.unreachable, false);
    p.init(new_map()).await.unwrap();
    assert!(p.ready().is_ready());
}

#[tokio::test]
async fn losing_a_create_race_is_not_an_error() {
    let server = MemoryServer::new();
    let connector = ProbeConnector::new(server.clone());
    Probe::set(&connector.probe.lose_create_race, true);
    let p = Provider::builder("raced")
        .connector(connector)
        .build()
        .unwrap();

    p.init(new_map()).await.unwrap();
    assert_eq!(server.row_count("enmap", "raced"), Some(0));
}

#[tokio::test]
async fn other_create_failures_are_schema_errors() {
    let connector = ProbeConnector::new(MemoryServer::new());
    Probe::set(&connector.probe.refuse_create, true);
    let p = Provider::builder("denied")
        .connector(connector)
        .build()
        .unwrap();

    let err = p.init(new_map()).await.unwrap_err();
    assert!(
        matches!(err, Error::SchemaEnsure { kind: "database", ref name, .. } if name == "enmap"),
        "{err:?}"
    );
}

// ---- close ------------------------------------------------------------------

#[tokio::test]
async fn operations_after_close_fail() {
    let p = provider(&MemoryServer::new(), "closing");
    p.init(new_map()).await.unwrap();
    p.close().await.unwrap();

    assert!(p.is_closed());
    assert_eq!(p.set("a", 1).unwrap_err(), Error::Closed);
    assert_eq!(p.set_async("a", 1).await.unwrap_err(), Error::Closed);
    assert_eq!(p.delete("a").unwrap_err(), Error::Closed);
    assert_eq!(p.fetch("a").await.unwrap_err(), Error::Closed);
    assert_eq!(p.has_async("a").await.unwrap_err(), Error::Closed);
    assert_eq!(p.init(new_map()).await.unwrap_err(), Error::Closed);
}

#[tokio::test]
async fn close_twice_is_fine() {
    let p = provider(&MemoryServer::new(), "twice");
    p.init(new_map()).await.unwrap();
    p.close().await.unwrap();
    p.close().await.unwrap();
}

#[tokio::test]
async fn close_before_init_blocks_init() {
    let p = provider(&MemoryServer::new(), "never");
    p.close().await.unwrap();
    assert_eq!(p.init(new_map()).await.unwrap_err(), Error::Closed);
}

#[tokio::test]
async fn close_drains_queued_writes() {
    let server = MemoryServer::new();
    let p = provider(&server, "drain");
    p.init(new_map()).await.unwrap();

    for i in 0..50 {
        p.set(format!("k{i}"), json!({ "i": i })).unwrap();
    }
    p.close().await.unwrap();
    assert_eq!(server.row_count("enmap", "drain"), Some(50));
}

#[tokio::test]
async fn map_is_left_alone_by_close() {
    let p = provider(&MemoryServer::new(), "keep");
    let map = new_map();
    p.init(map.clone()).await.unwrap();
    map.insert(Key::from("local"), json!(1));
    p.close().await.unwrap();
    assert_eq!(map.map_len(), 1);
}
