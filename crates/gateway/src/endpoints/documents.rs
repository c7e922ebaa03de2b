//! # /documents 管理エンドポイント
//!
//! 一覧・集計・検証済み化・削除・ダウンロード。

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tamperproof_core::Transition;
use tamperproof_types::*;

use crate::config::GatewayState;
use crate::error::GatewayError;

/// GET /documents — 全ドキュメント（登録順）。
pub async fn handle_list(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<Vec<DocumentView>>, GatewayError> {
    Ok(Json(state.orchestrator.list().await?))
}

/// GET /documents/stats
pub async fn handle_stats(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<StatsResponse>, GatewayError> {
    Ok(Json(state.orchestrator.stats().await?))
}

/// PATCH /documents/{id}/verify — 検証済みにする。既に検証済みでも200。
pub async fn handle_mark_verified(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, GatewayError> {
    let message = match state.orchestrator.mark_verified(&id).await? {
        Transition::Transitioned => "Document verified successfully",
        Transition::AlreadyVerified => "Document already verified",
    };
    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}

/// DELETE /documents/{id} — レコードとバイト列を削除する。
pub async fn handle_delete(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, GatewayError> {
    state.orchestrator.delete(&id).await?;
    Ok(Json(MessageResponse {
        message: "Document deleted successfully".to_string(),
    }))
}

/// Content-Dispositionに埋め込めない文字を置き換える。
fn attachment_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() || !c.is_ascii() { '_' } else { c })
        .collect()
}

/// GET /documents/download/{id} — 登録時のバイト列をそのまま返す。
pub async fn handle_download(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Response, GatewayError> {
    let (doc, bytes) = state.orchestrator.download(&id).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment_filename(&doc.filename)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::attachment_filename;

    #[test]
    fn test_attachment_filename_sanitized() {
        assert_eq!(attachment_filename("report.pdf"), "report.pdf");
        assert_eq!(attachment_filename("a\"b\\c\n.txt"), "a_b_c_.txt");
        assert_eq!(attachment_filename("契約書.pdf"), "___.pdf");
    }
}
