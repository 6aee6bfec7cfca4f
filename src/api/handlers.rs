use super::AppState;
use crate::error::{InvoiceError, Stage, StageError};
use crate::models::{
    Artifact, ArtifactKind, InvoiceRecord, ReconciliationReport, SessionStage, Upload,
};
use crate::service::PipelineOutput;
use crate::session::{expect_stage, ProcessingGuard, SessionError};
use crate::sheet;
use axum::{
    body::Bytes,
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// 接口错误, 对应 HTTP 状态码
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Session(SessionError),
    ArtifactNotFound(ArtifactKind),
    Extraction(StageError),
    Render(InvoiceError),
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        ApiError::Session(e)
    }
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, stage, raw) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, None, None),
            ApiError::Session(SessionError::NotFound(_)) => (StatusCode::NOT_FOUND, None, None),
            ApiError::Session(SessionError::WrongStage { .. }) => {
                (StatusCode::CONFLICT, None, None)
            }
            ApiError::ArtifactNotFound(_) => (StatusCode::NOT_FOUND, None, None),
            ApiError::Extraction(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Some(e.stage),
                e.source.raw_payload().map(str::to_string),
            ),
            ApiError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, None, None),
        };
        let message = match &self {
            ApiError::BadRequest(m) => m.clone(),
            ApiError::Session(e) => e.to_string(),
            ApiError::ArtifactNotFound(kind) => format!("{} file was not generated", kind.label()),
            ApiError::Extraction(e) => e.to_string(),
            ApiError::Render(e) => e.to_string(),
        };
        let body = ErrorResponse {
            success: false,
            message,
            stage,
            raw,
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub format: Option<String>,
}

/// 会话状态响应
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session_id: Uuid,
    pub stage: SessionStage,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportBody>,
}

#[derive(Debug, Serialize)]
pub struct ArtifactSummary {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub rows: usize,
}

impl From<&Artifact> for ArtifactSummary {
    fn from(a: &Artifact) -> Self {
        Self {
            kind: a.kind,
            file_name: a.file_name.clone(),
            rows: a.sheet.rows.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportBody {
    pub text: String,
    pub all_passed: bool,
    pub checks: ReconciliationReport,
}

impl From<ReconciliationReport> for ReportBody {
    fn from(report: ReconciliationReport) -> Self {
        Self {
            text: report.to_string(),
            all_passed: report.all_passed(),
            checks: report,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FailureBody {
    pub stage: Stage,
    pub reason: String,
}

/// 处理完成响应: 提取记录 + 核对报告 + 生成文件
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub session_id: Uuid,
    pub stage: SessionStage,
    pub folder: String,
    pub supplier: InvoiceRecord,
    pub client: InvoiceRecord,
    pub report: ReportBody,
    pub artifacts: Vec<ArtifactSummary>,
    pub failure: Option<FailureBody>,
}

impl ProcessResponse {
    fn new(session_id: Uuid, output: PipelineOutput) -> Self {
        let folder = output.folder();
        Self {
            success: output.failure.is_none(),
            session_id,
            stage: SessionStage::Completed,
            folder,
            report: ReportBody::from(output.report),
            artifacts: output.artifacts.iter().map(ArtifactSummary::from).collect(),
            failure: output.failure.map(|f| FailureBody {
                stage: f.stage,
                reason: f.source.to_string(),
            }),
            supplier: output.supplier,
            client: output.client,
        }
    }
}

/// 只接受 Excel 文件
fn accept_workbook(query: &UploadQuery) -> Result<String, ApiError> {
    let filename = query
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::BadRequest("filename query parameter is required".to_string()))?;
    let lower = filename.to_lowercase();
    if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        Ok(filename.to_string())
    } else {
        Err(ApiError::BadRequest(format!(
            "{}: only .xlsx and .xls files are accepted",
            filename
        )))
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn create_session(State(state): State<AppState>) -> Response {
    let session = state.store.create();
    let response = SessionResponse {
        success: true,
        session_id: session.id,
        stage: session.stage,
        artifacts: Vec::new(),
        report: None,
    };
    (StatusCode::CREATED, Json(response)).into_response()
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.store.get(id).ok_or(SessionError::NotFound(id))?;
    Ok(Json(SessionResponse {
        success: true,
        session_id: session.id,
        stage: session.stage,
        artifacts: session.artifacts.iter().map(ArtifactSummary::from).collect(),
        report: session.report.map(ReportBody::from),
    }))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.store.remove(id) {
        tracing::info!("Session {} removed", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(SessionError::NotFound(id).into())
    }
}

/// 第一步: 供应商发票
pub async fn upload_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<SessionResponse>, ApiError> {
    let filename = accept_workbook(&query)?;
    let mut upload = Some(Upload {
        filename,
        bytes: body.to_vec(),
    });

    let session = state.store.update(id, &mut |s| {
        expect_stage(s, SessionStage::AwaitingSupplier)?;
        s.supplier = upload.take();
        s.stage = SessionStage::AwaitingClient;
        Ok(())
    })?;
    tracing::info!(
        "Session {}: supplier file received ({} bytes)",
        id,
        body.len()
    );

    Ok(Json(SessionResponse {
        success: true,
        session_id: session.id,
        stage: session.stage,
        artifacts: Vec::new(),
        report: None,
    }))
}

/// 第二步: 客户发票, 触发完整处理
pub async fn upload_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<ProcessResponse>, ApiError> {
    accept_workbook(&query)?;

    // 抢占会话: 同一会话只能有一个处理任务
    let mut supplier: Option<Upload> = None;
    state.store.update(id, &mut |s| {
        expect_stage(s, SessionStage::AwaitingClient)?;
        supplier = s.supplier.clone();
        s.stage = SessionStage::Processing;
        Ok(())
    })?;
    // 失败或请求被取消时重置会话
    let guard = ProcessingGuard::new(state.store.clone(), id);
    let Some(supplier) = supplier else {
        return Err(SessionError::WrongStage {
            expected: SessionStage::AwaitingClient,
            actual: SessionStage::AwaitingSupplier,
        }
        .into());
    };

    tracing::info!(
        "Session {}: processing {} against client file",
        id,
        supplier.filename
    );
    let output = match state.pipeline.run(&supplier.bytes, &body).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!("Session {}: {}", id, e);
            return Err(ApiError::Extraction(e));
        }
    };

    let mut artifacts = Some(output.artifacts.clone());
    let mut report = Some(output.report.clone());
    state.store.update(id, &mut |s| {
        s.supplier = None;
        s.artifacts = artifacts.take().unwrap_or_default();
        s.report = report.take();
        s.stage = SessionStage::Completed;
        Ok(())
    })?;
    guard.disarm();

    Ok(Json(ProcessResponse::new(id, output)))
}

/// 下载生成的文件, 默认 xlsx, `?format=csv` 导出 CSV
pub async fn download_artifact(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, String)>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let kind = ArtifactKind::parse(&kind)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown artifact kind: {}", kind)))?;
    let session = state.store.get(id).ok_or(SessionError::NotFound(id))?;
    let artifact = session
        .artifact(kind)
        .ok_or(ApiError::ArtifactNotFound(kind))?;

    let (content_type, file_name, bytes) = match query.format.as_deref() {
        None | Some("xlsx") => (
            XLSX_CONTENT_TYPE,
            artifact.file_name.clone(),
            artifact.bytes.clone(),
        ),
        Some("csv") => {
            let bytes = sheet::write_csv(&artifact.sheet).map_err(ApiError::Render)?;
            let stem = artifact.file_name.trim_end_matches(".xlsx");
            ("text/csv; charset=utf-8", format!("{}.csv", stem), bytes)
        }
        Some(other) => {
            return Err(ApiError::BadRequest(format!("unsupported format: {}", other)));
        }
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&file_name)),
        ],
        bytes,
    )
        .into_response())
}

/// 文件名含西里尔字母, 按 RFC 5987 编码
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"') || c == ' ' { c } else { '_' })
        .collect();
    let mut encoded = String::with_capacity(file_name.len() * 3);
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}
