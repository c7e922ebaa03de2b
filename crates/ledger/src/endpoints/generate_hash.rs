//! # POST /generate-hash

use axum::body::Bytes;
use axum::Json;
use tamperproof_types::HashResponse;

/// リクエストボディのコンテンツダイジェストを返す。
pub async fn handle_generate_hash(body: Bytes) -> Json<HashResponse> {
    Json(HashResponse {
        hash: tamperproof_crypto::digest(&body),
    })
}
