//! # TamperProof Gateway
//!
//! ファイルを登録してコンテンツダイジェストを発行し、後からファイルまたは
//! ダイジェストだけで登録済みであること・検証済みであることを証明する。
//!
//! ## 役割
//! - コンテンツアドレッシング（SHA-256）
//! - ドキュメントレコードと生バイト列の永続化
//! - 検証状態（`pending → verified`）の管理
//! - 証明アーティファクト（QR）の参照生成
//! - Ledgerへの信頼確認の中継
//!
//! エンドポイント一覧は `endpoints` モジュールを参照。

mod config;
mod endpoints;
mod error;
mod orchestrator;
mod proof;
mod trust;

use std::sync::Arc;

use config::GatewayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env()?;
    let state = Arc::new(config::build_state(&config).await?);
    let app = endpoints::router(state);

    tracing::info!("Gatewayを {} で起動します", config.addr);

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
