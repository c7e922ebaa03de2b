//! # POST /trust/confirm
//!
//! Ledgerの信頼確認とローカルの検証状態を合わせて返す。

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tamperproof_types::*;

use crate::config::GatewayState;
use crate::error::GatewayError;

#[derive(Debug, Default, Deserialize)]
pub struct TrustConfirmParams {
    /// trueの場合、Ledgerが応答しなければ502を返す
    #[serde(default)]
    pub strict: bool,
}

/// POST /trust/confirm — 相互確認。
///
/// 既定ではLedgerが応答しなくても200で `trust_status = "unavailable"` を返す。
pub async fn handle_trust_confirm(
    State(state): State<Arc<GatewayState>>,
    Query(params): Query<TrustConfirmParams>,
    Json(body): Json<DigestRequest>,
) -> Result<Json<CrossCheckResponse>, GatewayError> {
    Ok(Json(
        state
            .orchestrator
            .cross_check(&body.digest, params.strict)
            .await?,
    ))
}
