use crate::config::ExtractionConfig;
use crate::error::{InvoiceError, Stage, StageContext, StageError};
use crate::llm::CompletionModel;
use crate::models::{Artifact, ArtifactKind, InvoiceRecord, ReconciliationReport, Sheet};
use crate::service::{
    flatten, map_inv, map_items, map_sales, reconcile, DateNormalizer, ExtractionMode,
    InvoiceExtractor,
};
use crate::sheet;
use std::sync::Arc;
use std::time::Instant;

/// 一次会话的处理结果
#[derive(Debug)]
pub struct PipelineOutput {
    pub supplier: InvoiceRecord,
    pub client: InvoiceRecord,
    /// 核对结果总是生成, 不论是否一致
    pub report: ReconciliationReport,
    /// 已生成的文件 (失败前生成的文件不会回滚)
    pub artifacts: Vec<Artifact>,
    /// 映射/生成阶段的失败
    pub failure: Option<StageError>,
}

impl PipelineOutput {
    pub fn folder(&self) -> String {
        self.client.folder()
    }
}

/// 发票处理流水线: 读取 -> 序列化 -> 提取 -> 核对 -> 映射
///
/// 各步骤顺序执行; 只持有无状态的模型句柄, 可被多个会话并发使用。
pub struct InvoicePipeline {
    extractor: InvoiceExtractor,
    dates: DateNormalizer,
    options: ExtractionConfig,
}

impl InvoicePipeline {
    pub fn new(model: Arc<dyn CompletionModel>, options: ExtractionConfig) -> Self {
        Self {
            extractor: InvoiceExtractor::new(model.clone()),
            dates: DateNormalizer::new(model),
            options,
        }
    }

    /// 读取单个发票文件并提取记录
    pub async fn extract_file(
        &self,
        bytes: &[u8],
        mode: ExtractionMode,
        stage: Stage,
    ) -> Result<InvoiceRecord, StageError> {
        let grid = sheet::load(bytes).at_stage(Stage::Load)?;
        let table = flatten(&grid, self.options.flatten_format).at_stage(Stage::Flatten)?;
        self.extractor.extract(&table, mode).await.at_stage(stage)
    }

    pub async fn run(
        &self,
        supplier_bytes: &[u8],
        client_bytes: &[u8],
    ) -> Result<PipelineOutput, StageError> {
        let start_time = Instant::now();

        tracing::info!("Parsing supplier invoice...");
        let supplier = self
            .extract_file(supplier_bytes, self.options.supplier_mode, Stage::ExtractSupplier)
            .await?;

        tracing::info!("Parsing client invoice...");
        let client = self
            .extract_file(client_bytes, self.options.client_mode, Stage::ExtractClient)
            .await?;

        let report = reconcile(&supplier, &client);
        let (artifacts, failure) = self.build_artifacts(&supplier, &client).await;

        if let Some(failure) = &failure {
            tracing::error!("Pipeline stopped at {}: {}", failure.stage, failure.source);
        }
        tracing::info!(
            "Pipeline finished for [{}]: {} artifacts, 耗时 {:?}",
            client.folder(),
            artifacts.len(),
            start_time.elapsed()
        );

        Ok(PipelineOutput {
            supplier,
            client,
            report,
            artifacts,
            failure,
        })
    }

    /// 依次生成 Items / Inv / Sales Invoice, 遇到失败即停止
    pub async fn build_artifacts(
        &self,
        supplier: &InvoiceRecord,
        client: &InvoiceRecord,
    ) -> (Vec<Artifact>, Option<StageError>) {
        let folder = client.folder();
        let mut artifacts = Vec::with_capacity(3);

        let items = map_items(supplier, client);
        match finish(ArtifactKind::Items, &folder, items) {
            Ok(artifact) => artifacts.push(artifact),
            Err(e) => return (artifacts, Some(StageError::new(Stage::MapItems, e))),
        }

        let date = self.dates.normalize(&supplier.invoice_date).await;
        let inv = map_inv(supplier, client, &date);
        match finish(ArtifactKind::Inv, &folder, inv) {
            Ok(artifact) => artifacts.push(artifact),
            Err(e) => return (artifacts, Some(StageError::new(Stage::MapInv, e))),
        }

        let sales = map_sales(supplier, client);
        match finish(ArtifactKind::Sales, &folder, sales) {
            Ok(artifact) => artifacts.push(artifact),
            Err(e) => return (artifacts, Some(StageError::new(Stage::MapSales, e))),
        }

        (artifacts, None)
    }
}

fn finish(
    kind: ArtifactKind,
    folder: &str,
    sheet: Result<Sheet, InvoiceError>,
) -> Result<Artifact, InvoiceError> {
    let sheet = sheet?;
    let bytes = sheet::write_xlsx(&sheet)?;
    let file_name = kind.file_name(folder);
    tracing::info!("Generated {} ({} rows, {} bytes)", file_name, sheet.rows.len(), bytes.len());
    Ok(Artifact {
        kind,
        file_name,
        sheet,
        bytes,
    })
}
