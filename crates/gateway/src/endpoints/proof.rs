//! # GET /qr/{id}
//!
//! ドキュメントの証明アーティファクト（QRにエンコードする検証参照と描画URL）。

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use tamperproof_types::*;

use crate::config::GatewayState;
use crate::error::GatewayError;

pub async fn handle_proof_artifact(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<ProofArtifact>, GatewayError> {
    Ok(Json(state.orchestrator.proof_artifact(&id).await?))
}
