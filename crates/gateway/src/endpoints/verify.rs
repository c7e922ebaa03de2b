//! # POST /verify/file, GET /verify/hash
//!
//! 登録済みレコードの検証状態を返す。

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tamperproof_types::*;

use crate::config::GatewayState;
use crate::error::GatewayError;

#[derive(Debug, Deserialize)]
pub struct VerifyHashParams {
    pub document_hash: String,
}

/// POST /verify/file — リクエストボディの内容からダイジェストを計算して照合する。
pub async fn handle_verify_file(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> Result<Json<VerificationView>, GatewayError> {
    Ok(Json(state.orchestrator.verify_by_file(&body).await?))
}

/// GET /verify/hash — 与えられたダイジェストをそのまま照合する。
pub async fn handle_verify_hash(
    State(state): State<Arc<GatewayState>>,
    Query(params): Query<VerifyHashParams>,
) -> Result<Json<VerificationView>, GatewayError> {
    Ok(Json(
        state.orchestrator.verify_by_digest(&params.document_hash).await?,
    ))
}
