use serde_json::json;
use std::sync::Arc;
use table_sync::{DefaultMap, MapBackend, MemoryServer, Provider, ProviderConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), table_sync::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let server = MemoryServer::new();

    // seed some rows through an eager provider
    let seeder = Provider::builder("profiles").connector(server.clone()).build()?;
    seeder.init(Arc::new(DefaultMap::default())).await?;
    for id in 1..=100 {
        seeder.set(id, json!({ "id": id, "name": format!("user{id}") }))?;
    }
    seeder.close().await?;

    // configuration can come from JSON
    let config: ProviderConfig =
        serde_json::from_str(r#"{ "name": "profiles", "fetch_all": false }"#)
            .map_err(|e| table_sync::Error::Config(e.to_string()))?;
    let provider = Provider::new(config, server)?;
    let cache = Arc::new(DefaultMap::default());
    provider.init(cache.clone()).await?;
    println!("after init: {} cached", cache.map_len());

    // load only what is needed
    for id in [7, 42, 1000] {
        match provider.fetch(id).await? {
            Some(profile) => println!("fetched {id}: {profile}"),
            None => println!("no profile {id}"),
        }
    }
    println!("after fetch: {} cached", cache.map_len());

    let loaded = provider.fetch_everything().await?;
    println!("after fetch_everything: {loaded} loaded, {} cached", cache.map_len());

    provider.close().await?;
    Ok(())
}
