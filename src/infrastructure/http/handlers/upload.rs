//! Upload HTTP Handler - 从上传文件中提取正文

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::application::DocumentFormat;
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct ExtractTextResponse {
    pub filename: Option<String>,
    pub format: &'static str,
    pub text: String,
    pub char_count: usize,
}

/// 上传 txt / md / pdf / docx 文件并返回纯文本（不会写入存储）
pub async fn extract_text(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ExtractTextResponse>>, ApiError> {
    let mut upload: Option<(Option<String>, DocumentFormat, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(|s| s.to_string());
        let format = DocumentFormat::detect(filename.as_deref(), field.content_type())
            .ok_or_else(|| {
                ApiError::BadRequest(
                    "Unsupported file type. Allowed: .txt, .md, .pdf, .docx".to_string(),
                )
            })?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;

        upload = Some((filename, format, bytes.to_vec()));
    }

    let (filename, format, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("Missing file field".to_string()))?;

    tracing::info!(
        filename = ?filename,
        format = format.as_str(),
        size = bytes.len(),
        "Extracting text from upload"
    );

    // docx 解压与 XML 解析放到阻塞线程池
    let extractor = state.extractor.clone();
    let text = tokio::task::spawn_blocking(move || extractor.extract(format, &bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("Extraction task failed: {}", e)))??;

    Ok(Json(ApiResponse::success(ExtractTextResponse {
        filename,
        format: format.as_str(),
        char_count: text.chars().count(),
        text,
    })))
}
