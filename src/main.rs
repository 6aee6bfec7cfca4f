use invoice_recon_rust::{
    api::{self, AppState},
    build_model,
    session::spawn_sweeper,
    AppConfig, InvoicePipeline, MemorySessionStore, SessionStore,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // 模型客户端 (无 API key 时直接退出)
    let model = build_model(&config.model)?;

    let pipeline = Arc::new(InvoicePipeline::new(model, config.extraction.clone()));
    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(config.session.ttl_secs));
    spawn_sweeper(store.clone(), config.session.sweep_interval_secs);

    let app = api::router(AppState::new(pipeline, store));

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST   /api/sessions                      - new session");
    info!("  PUT    /api/sessions/:id/supplier         - supplier invoice");
    info!("  PUT    /api/sessions/:id/client           - client invoice, runs pipeline");
    info!("  GET    /api/sessions/:id/artifacts/:kind  - items | inv | sales");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
