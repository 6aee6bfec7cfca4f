use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// 流水线错误分类
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// 工作簿没有可读的表格内容
    #[error("workbook has no readable sheet")]
    EmptySheet,

    #[error("failed to read workbook: {0}")]
    Workbook(String),

    /// 模型返回的内容不是合法的发票 JSON
    #[error("model response is not a valid invoice: {reason}")]
    SchemaParse { reason: String, raw: String },

    /// 模型调用失败
    #[error("invoice extraction failed: {reason}")]
    Extraction { reason: String, raw: Option<String> },

    /// 记录格式错误导致无法投影
    #[error("cannot project {schema} row {row}: {reason}")]
    Mapping {
        schema: &'static str,
        row: usize,
        reason: String,
    },

    #[error("failed to render {schema} sheet: {reason}")]
    Render { schema: &'static str, reason: String },
}

impl InvoiceError {
    /// 原始模型输出 (用于诊断)
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            InvoiceError::SchemaParse { raw, .. } => Some(raw),
            InvoiceError::Extraction { raw, .. } => raw.as_deref(),
            _ => None,
        }
    }

    pub fn is_extraction(&self) -> bool {
        matches!(
            self,
            InvoiceError::SchemaParse { .. } | InvoiceError::Extraction { .. }
        )
    }
}

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Flatten,
    ExtractSupplier,
    ExtractClient,
    MapItems,
    MapInv,
    MapSales,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Flatten => "flatten",
            Stage::ExtractSupplier => "extract_supplier",
            Stage::ExtractClient => "extract_client",
            Stage::MapItems => "map_items",
            Stage::MapInv => "map_inv",
            Stage::MapSales => "map_sales",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 带阶段信息的错误
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: InvoiceError,
}

impl StageError {
    pub fn new(stage: Stage, source: InvoiceError) -> Self {
        Self { stage, source }
    }
}

/// 为 Result 附加阶段信息
pub trait StageContext<T> {
    fn at_stage(self, stage: Stage) -> Result<T, StageError>;
}

impl<T> StageContext<T> for Result<T, InvoiceError> {
    fn at_stage(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|source| StageError::new(stage, source))
    }
}
