use crate::llm::CompletionModel;
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

/// 输出日期格式 DD/MM/YYYY
pub const CANONICAL_DATE_FORMAT: &str = "%d/%m/%Y";

/// 本地解析支持的输入格式
const KNOWN_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d-%m-%Y", "%d/%m/%Y", "%b.%d, %Y"];

/// 渲染日期转换 prompt (few-shot)
pub fn render_date_prompt(raw_date: &str) -> String {
    format!(
        "You are a date converter. Convert the input string to the format DD/MM/YYYY.\n\
         \n\
         Examples:\n\
         - \"DEC.10TH, 2024\" -> \"10/12/2024\"\n\
         - \"Jan 3, 2023\" -> \"03/01/2023\"\n\
         - \"2024/07/01\" -> \"01/07/2024\"\n\
         - \"2025-03-18\" -> \"18/03/2025\"\n\
         - \"10 August 2025\" -> \"10/08/2025\"\n\
         \n\
         Notes:\n\
         - Keep leading zeros for day and month: 3 -> 03, 7 -> 07\n\
         - The month must be a number\n\
         - Return only the date, without explanations\n\
         \n\
         Here is the date:\n{}\n",
        raw_date
    )
}

/// 严格校验 DD/MM/YYYY (补零, 且为真实日期)
pub fn is_canonical_date(text: &str) -> bool {
    text.len() == 10
        && NaiveDate::parse_from_str(text, CANONICAL_DATE_FORMAT)
            .map(|d| d.format(CANONICAL_DATE_FORMAT).to_string() == text)
            .unwrap_or(false)
}

/// 模型日期规范化: 尽力而为
///
/// 模型返回非 DD/MM/YYYY 内容或调用失败时, 返回去除首尾空白的原始输入, 不报错。
pub struct DateNormalizer {
    model: Arc<dyn CompletionModel>,
}

impl DateNormalizer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    pub async fn normalize(&self, raw_date: &str) -> String {
        let trimmed = raw_date.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        match self.model.complete(&render_date_prompt(trimmed)).await {
            Ok(reply) => {
                let reply = reply.trim().trim_matches(|c| c == '"' || c == '`').trim();
                if is_canonical_date(reply) {
                    reply.to_string()
                } else {
                    tracing::warn!(
                        "Date normalizer reply {:?} for {:?} is not DD/MM/YYYY, keeping raw value",
                        reply,
                        trimmed
                    );
                    trimmed.to_string()
                }
            }
            Err(e) => {
                tracing::warn!("Date normalizer call failed for {:?}: {}", trimmed, e);
                trimmed.to_string()
            }
        }
    }
}

/// 按已知格式解析日期并输出 DD/MM/YYYY, 均不匹配时返回原始字符串
pub fn format_known_date(raw: &str) -> String {
    let text = raw.trim();
    let candidates = [text.to_string(), strip_ordinal_suffix(text)];
    for candidate in &candidates {
        for fmt in KNOWN_DATE_FORMATS {
            match NaiveDate::parse_from_str(candidate, fmt) {
                // %Y 接受任意位数, 两位年份不算匹配
                Ok(date) if date.year() >= 1000 => {
                    return date.format(CANONICAL_DATE_FORMAT).to_string();
                }
                _ => {}
            }
        }
    }
    raw.to_string()
}

/// "DEC.10TH, 2024" -> "DEC.10, 2024"
fn strip_ordinal_suffix(text: &str) -> String {
    let Some(comma) = text.find(',') else {
        return text.to_string();
    };
    let (head, tail) = text.split_at(comma);
    if head.len() < 3 || !head.is_char_boundary(head.len() - 2) {
        return text.to_string();
    }
    let (stem, suffix) = head.split_at(head.len() - 2);
    let is_ordinal = ["st", "nd", "rd", "th"]
        .iter()
        .any(|s| suffix.eq_ignore_ascii_case(s));
    if is_ordinal && stem.ends_with(|c: char| c.is_ascii_digit()) {
        format!("{}{}", stem, tail)
    } else {
        text.to_string()
    }
}
