use super::{ReconciliationReport, Sheet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 会话处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    AwaitingSupplier,
    AwaitingClient,
    /// 两个文件已收到, 正在处理
    Processing,
    Completed,
}

/// 上传的文件
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// 输出文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Items,
    Inv,
    Sales,
}

impl ArtifactKind {
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Items => "Items",
            ArtifactKind::Inv => "Inv",
            ArtifactKind::Sales => "Sales Invoice",
        }
    }

    /// 1C 导入文件名
    pub fn file_name(&self, folder: &str) -> String {
        format!("{} (заполнение для 1С) [{}].xlsx", self.label(), folder)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "items" => Some(ArtifactKind::Items),
            "inv" => Some(ArtifactKind::Inv),
            "sales" => Some(ArtifactKind::Sales),
            _ => None,
        }
    }
}

/// 生成的输出文件
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub sheet: Sheet,
    pub bytes: Vec<u8>,
}

/// 会话上下文: 一次处理只持有一对 供应商/客户 发票
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub stage: SessionStage,
    pub supplier: Option<Upload>,
    pub artifacts: Vec<Artifact>,
    pub report: Option<ReconciliationReport>,
    pub created_at: DateTime<Utc>,
    pub touched_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            stage: SessionStage::AwaitingSupplier,
            supplier: None,
            artifacts: Vec::new(),
            report: None,
            created_at: now,
            touched_at: now,
        }
    }

    /// 回到初始阶段, 丢弃已上传文件和结果
    pub fn reset(&mut self) {
        self.stage = SessionStage::AwaitingSupplier;
        self.supplier = None;
        self.artifacts.clear();
        self.report = None;
    }

    pub fn touch(&mut self) {
        self.touched_at = Utc::now();
    }

    pub fn artifact(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_file_names_follow_1c_convention() {
        assert_eq!(
            ArtifactKind::Items.file_name("M04_ADR0301"),
            "Items (заполнение для 1С) [M04_ADR0301].xlsx"
        );
        assert_eq!(
            ArtifactKind::Inv.file_name("X"),
            "Inv (заполнение для 1С) [X].xlsx"
        );
        assert_eq!(
            ArtifactKind::Sales.file_name("X"),
            "Sales Invoice (заполнение для 1С) [X].xlsx"
        );
    }

    #[test]
    fn reset_returns_to_first_stage() {
        let mut session = Session::new();
        session.stage = SessionStage::Completed;
        session.supplier = Some(Upload {
            filename: "a.xlsx".to_string(),
            bytes: vec![1],
        });
        session.reset();
        assert_eq!(session.stage, SessionStage::AwaitingSupplier);
        assert!(session.supplier.is_none());
    }
}
