use super::{CompletionModel, ModelError};
use async_trait::async_trait;
use std::sync::Mutex;

/// 固定应答的模型 (离线调试与测试使用)
///
/// 按规则顺序匹配 prompt 中的标记文本, 第一个命中的规则给出应答。
#[derive(Default)]
pub struct ScriptedModel {
    rules: Vec<(String, Result<String, String>)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// prompt 包含 marker 时返回 reply
    pub fn reply(mut self, marker: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((marker.into(), Ok(reply.into())));
        self
    }

    /// prompt 包含 marker 时调用失败
    pub fn fail(mut self, marker: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules.push((marker.into(), Err(message.into())));
        self
    }

    /// 已收到的 prompt
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let rule = self
            .rules
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()));
        match rule {
            Some((_, Ok(reply))) => Ok(reply.clone()),
            Some((_, Err(message))) => Err(ModelError::Status {
                status: 500,
                body: message.clone(),
            }),
            None => Err(ModelError::EmptyResponse),
        }
    }
}
