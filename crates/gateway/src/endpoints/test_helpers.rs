//! # エンドポイントテスト用共通ヘルパー

use std::sync::Arc;
use std::time::Duration;

use tamperproof_core::{IndexedDocumentStore, MemoryBlobStore};

use crate::config::GatewayState;
use crate::orchestrator::Orchestrator;
use crate::proof::ProofArtifactGenerator;
use crate::trust::HttpTrustClient;

/// テスト用モックHTTPサーバーを起動し、ベースURLを返す。
pub async fn start_mock_server(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{port}")
}

/// メモリ内ストアと指定LedgerエンドポイントでGatewayStateを構築する。
pub fn test_state(trust_endpoint: &str, trust_timeout: Duration) -> Arc<GatewayState> {
    let store = IndexedDocumentStore::in_memory(Arc::new(MemoryBlobStore::new()));
    let proof = ProofArtifactGenerator::new(
        "http://localhost:3000/verify",
        "https://api.qrserver.com/v1/create-qr-code/",
    )
    .unwrap();
    let trust = HttpTrustClient::new(trust_endpoint, trust_timeout, None).unwrap();

    Arc::new(GatewayState {
        orchestrator: Orchestrator::new(Arc::new(store), proof, Arc::new(trust)),
        max_upload_size: 1024,
    })
}
