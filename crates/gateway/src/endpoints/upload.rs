//! # POST /documents/upload
//!
//! ファイルを登録し、ダイジェストと証明アーティファクト参照を返す。

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tamperproof_types::*;

use crate::config::GatewayState;
use crate::error::GatewayError;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: Option<String>,
}

/// POST /documents/upload — 登録。
///
/// 同一内容のファイルでも毎回新しいレコードを作成する（409は返さない）。
pub async fn handle_upload(
    State(state): State<Arc<GatewayState>>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), GatewayError> {
    if body.len() > state.max_upload_size {
        return Err(GatewayError::BadRequest(format!(
            "ファイルサイズが上限を超えています: {} bytes (上限: {} bytes)",
            body.len(),
            state.max_upload_size
        )));
    }
    let filename = params.filename.ok_or_else(|| {
        GatewayError::BadRequest("filenameクエリパラメータが必要です".to_string())
    })?;

    let response = state.orchestrator.upload(&filename, &body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
