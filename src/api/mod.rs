pub mod handlers;

pub use handlers::*;

use crate::service::InvoicePipeline;
use crate::session::SessionStore;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

/// 上传文件大小上限
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// 共享状态: 流水线 + 会话存储
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<InvoicePipeline>,
    pub store: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(pipeline: Arc<InvoicePipeline>, store: Arc<dyn SessionStore>) -> Self {
        Self { pipeline, store }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/supplier", put(upload_supplier))
        .route("/api/sessions/:id/client", put(upload_client))
        .route("/api/sessions/:id/artifacts/:kind", get(download_artifact))
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)))
        .with_state(state)
}
