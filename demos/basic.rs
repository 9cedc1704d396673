use serde_json::json;
use std::sync::Arc;
use table_sync::{DefaultMap, Key, MapBackend, MemoryServer, Provider};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), table_sync::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // One server, two "processes".
    let server = MemoryServer::new();

    let first = Provider::builder("Fruit Basket").connector(server.clone()).build()?;
    let basket = Arc::new(DefaultMap::default());
    first.init(basket.clone()).await?;
    println!("table name = {}", first.name());

    // mirror map writes: fire-and-forget and awaited
    basket.insert(Key::from("apples"), json!(3));
    first.set("apples", 3)?;
    basket.insert(Key::from("bananas"), json!({ "count": 5, "ripe": true }));
    first.set_async("bananas", json!({ "count": 5, "ripe": true })).await?;
    first.flush().await?;

    // a second provider on the same table loads what the first wrote
    let second = Provider::builder("Fruit Basket").connector(server.clone()).build()?;
    let other_basket = Arc::new(DefaultMap::default());
    second.init(other_basket.clone()).await?.wait().await?;
    println!("apples  = {:?}", MapBackend::get(&*other_basket, &Key::from("apples")));
    println!("bananas = {:?}", MapBackend::get(&*other_basket, &Key::from("bananas")));

    // deletes and purges
    first.delete_async("apples").await?;
    println!("has apples? {}", second.has_async("apples").await?);
    println!("purged {} rows", first.bulk_delete().await?);

    first.close().await?;
    second.close().await?;
    Ok(())
}
