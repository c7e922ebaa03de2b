//! # TamperProof Ledger
//!
//! ダイジェストのアテステーションを行う信頼確認サービス。
//! Gatewayの `POST /trust/confirm` から問い合わせを受ける。
//!
//! ## API エンドポイント
//! - `POST /anchor` — ダイジェストを台帳に登録
//! - `POST /confirm` — ダイジェストが登録済みかを署名付きで回答
//! - `POST /generate-hash` — リクエストボディのダイジェスト計算
//! - `GET /.well-known/ledger-info` — 署名検証用公開鍵の公開

mod anchors;
mod config;
mod endpoints;
mod error;

use std::sync::Arc;

use anchors::AnchorBook;
use config::LedgerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let signing_key = config::signing_key_from_env()?;
    let anchors_path =
        std::env::var("LEDGER_ANCHORS_PATH").unwrap_or_else(|_| "anchors.json".to_string());
    let anchors = AnchorBook::open(&anchors_path).await?;
    let state = Arc::new(LedgerState::with_anchors(signing_key, anchors));
    tracing::info!(
        ledger_pubkey = %tamperproof_crypto::verifying_key_to_base58(&state.verifying_key),
        "Ledger署名用公開鍵"
    );

    let app = endpoints::router(state);

    let addr = std::env::var("LEDGER_ADDR").unwrap_or_else(|_| "0.0.0.0:8003".to_string());
    tracing::info!("Ledgerを {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
