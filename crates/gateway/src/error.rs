//! # Gateway エラー型
//!
//! 「登録されていない」「ストレージ障害」「Ledgerが応答しない」を
//! それぞれ別のステータスとメッセージで返す。

use axum::http::StatusCode;
use tamperproof_core::StoreError;

use crate::proof::ProofError;
use crate::trust::TrustError;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 該当するドキュメントが存在しない
    #[error("ドキュメントが見つかりません: {0}")]
    NotFound(String),
    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// ストレージ操作に失敗
    #[error("ストレージ操作に失敗: {0}")]
    Storage(String),
    /// Ledgerへの信頼確認に失敗
    #[error("信頼確認サービスが応答しません: {0}")]
    Upstream(String),
}

impl From<StoreError> for GatewayError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(detail) => GatewayError::NotFound(detail),
            StoreError::StorageUnavailable(detail) => GatewayError::Storage(detail),
        }
    }
}

impl From<ProofError> for GatewayError {
    fn from(e: ProofError) -> Self {
        GatewayError::BadRequest(e.to_string())
    }
}

impl From<TrustError> for GatewayError {
    fn from(e: TrustError) -> Self {
        GatewayError::Upstream(e.to_string())
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "リクエスト処理に失敗");
        }
        (status, self.to_string()).into_response()
    }
}
