//! # Ledger エラー型
//!
//! `GatewayError`（`crates/gateway/src/error.rs`）と同パターン。

use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// 内部エラー（署名対象のシリアライズ失敗等）
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for LedgerError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            LedgerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
