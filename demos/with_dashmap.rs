use dashmap::DashMap;
use serde_json::{json, Value};
use std::sync::Arc;
use table_sync::{Key, MemoryServer, Provider};

#[tokio::main]
async fn main() -> Result<(), table_sync::Error> {
    let provider = Provider::builder("counters")
        .connector(MemoryServer::new())
        .build()?;
    let map: Arc<DashMap<Key, Value>> = Arc::new(DashMap::new());
    provider.init(map.clone()).await?;

    for n in 0..10 {
        map.insert(Key::from("counter"), json!(n));
        provider.set("counter", n)?;
    }
    provider.flush().await?;
    println!("stored counter = {:?}", provider.fetch("counter").await?);

    provider.close().await?;
    Ok(())
}
