pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod service;
pub mod session;
pub mod sheet;

pub use config::AppConfig;
pub use error::{InvoiceError, Stage, StageError};
pub use llm::{build_model, CompletionModel};
pub use service::{InvoicePipeline, PipelineOutput};
pub use session::{MemorySessionStore, SessionStore};
