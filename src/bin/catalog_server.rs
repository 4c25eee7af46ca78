use std::sync::Arc;

use lcds::{
    catalog_router, client_config_from_env, init_logging, log_app_bind, log_app_start,
    log_source_selected, logging_config_from_env, server_config_from_env, CatalogSource,
    FileStore, HttpProblemApi, InMemoryProblemApi, KeyValueStore, ProblemApi,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;

    let server_cfg = server_config_from_env()?;
    log_app_start(&logging_cfg, &server_cfg);

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&server_cfg.storage_path));
    let addr = server_cfg.bind_addr;
    let origin = server_cfg.origin.clone();

    let app = if server_cfg.use_demo {
        let api = InMemoryProblemApi::demo();
        let source = CatalogSource::Demo {
            problems: api.stats().await?.total as usize,
        };
        log_source_selected(&source, "LCDS_USE_DEMO");
        catalog_router(Arc::new(api), store, server_cfg)
    } else {
        let client_cfg = client_config_from_env()?;
        let source = CatalogSource::Http {
            base_url: client_cfg.base_url.clone(),
            timeout_ms: client_cfg.http_timeout_ms,
        };
        log_source_selected(&source, "LCDS_API_BASE_URL");
        catalog_router(Arc::new(HttpProblemApi::new(&client_cfg)?), store, server_cfg)
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    log_app_bind(bound_addr, &origin);
    axum::serve(listener, app).await?;

    Ok(())
}
