use crate::service::{ExtractionMode, FlattenFormat};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub session: SessionConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    OpenAi,
    Anthropic,
}

impl ModelProvider {
    /// 未配置 model 时使用的模型名
    pub fn default_model(&self) -> &'static str {
        match self {
            ModelProvider::OpenAi => "gpt-4o",
            ModelProvider::Anthropic => "claude-3-5-sonnet-latest",
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: ModelProvider,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// 为空时按 provider 取默认模型
    #[serde(default)]
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
    /// HTTP 超时 (秒), 由调用方决定
    pub timeout_secs: u64,
    #[serde(default)]
    pub base_url: Option<String>,
}

// api_key 不输出到日志
impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// 会话空闲过期时间 (秒)
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub supplier_mode: ExtractionMode,
    pub client_mode: ExtractionMode,
    pub flatten_format: FlattenFormat,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            supplier_mode: ExtractionMode::Generic,
            client_mode: ExtractionMode::Supplier,
            flatten_format: FlattenFormat::Json,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            model: ModelConfig {
                provider: ModelProvider::OpenAi,
                api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
                model: ModelProvider::OpenAi.default_model().to_string(),
                temperature: 0.3,
                max_tokens: 4096,
                timeout_secs: 120,
                base_url: None,
            },
            session: SessionConfig {
                ttl_secs: 3600,
                sweep_interval_secs: 60,
            },
            extraction: ExtractionConfig::default(),
        }
    }
}

impl AppConfig {
    /// 加载配置: 默认值 < invoice-recon.toml < APP__* 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        // .env 文件可选
        let _ = dotenvy::dotenv();

        let settings = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("model.provider", "openai")?
            .set_default("model.api_key", "")?
            .set_default("model.temperature", 0.3)?
            .set_default("model.max_tokens", 4096)?
            .set_default("model.timeout_secs", 120)?
            .set_default("session.ttl_secs", 3600)?
            .set_default("session.sweep_interval_secs", 60)?
            .set_default("extraction.supplier_mode", "generic")?
            .set_default("extraction.client_mode", "supplier")?
            .set_default("extraction.flatten_format", "json")?
            .add_source(File::with_name("invoice-recon").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = settings.try_deserialize()?;
        config.apply_legacy_env();
        config.apply_provider_defaults();
        Ok(config)
    }

    fn apply_provider_defaults(&mut self) {
        if self.model.model.trim().is_empty() {
            self.model.model = self.model.provider.default_model().to_string();
        }
    }

    /// 兼容旧的 OPENAI_API_KEY / ANTHROPIC_API_KEY
    fn apply_legacy_env(&mut self) {
        if !self.model.api_key.is_empty() {
            return;
        }
        let var = match self.model.provider {
            ModelProvider::OpenAi => "OPENAI_API_KEY",
            ModelProvider::Anthropic => "ANTHROPIC_API_KEY",
        };
        if let Ok(key) = std::env::var(var) {
            self.model.api_key = key;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_api_key() {
        let mut config = AppConfig::default();
        config.model.api_key = "sk-secret".to_string();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn model_name_defaults_per_provider() {
        let mut config = AppConfig::default();
        config.model.provider = ModelProvider::Anthropic;
        config.model.model = String::new();
        config.apply_provider_defaults();
        assert_eq!(config.model.model, "claude-3-5-sonnet-latest");

        config.model.model = "claude-3-haiku-20240307".to_string();
        config.apply_provider_defaults();
        assert_eq!(config.model.model, "claude-3-haiku-20240307");

        let openai = AppConfig::default();
        assert_eq!(openai.model.model, "gpt-4o");
    }

    #[test]
    fn default_wiring_uses_supplier_prompt_for_client_file() {
        let config = AppConfig::default();
        assert_eq!(config.extraction.supplier_mode, ExtractionMode::Generic);
        assert_eq!(config.extraction.client_mode, ExtractionMode::Supplier);
    }
}
