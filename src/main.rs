use std::sync::Arc;

use anyhow::Context;

use DealerInfra::Engines;
use DealerInfra::api::rest::{ApiState, create_router};
use DealerInfra::config::loader::AppConfig;
use DealerInfra::observability;
use DealerInfra::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::tracing::init();
    observability::metrics::register_metrics();

    let env = std::env::var("DEALERINFRA_ENV").unwrap_or_else(|_| "default".to_string());
    let config = AppConfig::load(&env).context("loading configuration")?;

    let store = Arc::new(Store::new(&config.locking));
    let engines = Engines::new(Arc::clone(&store), &config);
    let state = Arc::new(ApiState { store, engines });
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    tracing::info!(addr = %config.server.bind, "dealer back office listening");
    axum::serve(listener, router).await.context("serving HTTP")?;
    Ok(())
}
