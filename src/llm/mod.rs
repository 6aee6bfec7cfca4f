use crate::config::{ModelConfig, ModelProvider};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

mod anthropic;
mod openai;
mod scripted;

pub use anthropic::AnthropicModel;
pub use openai::OpenAiModel;
pub use scripted::ScriptedModel;

/// 模型调用错误
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model response missing text content")]
    EmptyResponse,

    #[error("invalid model configuration: {0}")]
    Config(String),
}

/// 文本补全接口: 输入完整 prompt, 返回原始文本
///
/// 实现必须是无状态的, 同一个实例会被多个会话并发调用。
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

/// 按配置创建模型客户端
pub fn build_model(config: &ModelConfig) -> Result<Arc<dyn CompletionModel>, ModelError> {
    if config.api_key.trim().is_empty() {
        return Err(ModelError::Config("model.api_key is empty".to_string()));
    }
    let model: Arc<dyn CompletionModel> = match config.provider {
        ModelProvider::OpenAi => Arc::new(OpenAiModel::new(config)?),
        ModelProvider::Anthropic => Arc::new(AnthropicModel::new(config)?),
    };
    tracing::info!(
        "Model client ready: provider={:?}, model={}",
        config.provider,
        config.model
    );
    Ok(model)
}
