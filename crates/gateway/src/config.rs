//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tamperproof_core::{BlobStore, FsBlobStore, IndexedDocumentStore, MemoryBlobStore};

use crate::orchestrator::Orchestrator;
use crate::proof::ProofArtifactGenerator;
use crate::trust::HttpTrustClient;

/// 生バイト列の格納先。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// プロセス内メモリ（再起動で消える）
    Memory,
    /// ローカルディレクトリ
    Fs,
    /// S3互換ストレージ
    S3,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(StorageBackend::Memory),
            "fs" => Ok(StorageBackend::Fs),
            "s3" => Ok(StorageBackend::S3),
            other => Err(anyhow::anyhow!(
                "STORAGE_BACKENDは memory / fs / s3 のいずれかです: {other}"
            )),
        }
    }
}

/// Gatewayの設定。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// 待ち受けアドレス
    pub addr: String,
    pub storage_backend: StorageBackend,
    /// fsバックエンドのBlob格納ディレクトリ
    pub storage_dir: PathBuf,
    /// レコードスナップショットのパス。memoryバックエンドでは使わない。
    pub records_path: PathBuf,
    /// 証明アーティファクトにエンコードする検証ページのベースURL
    pub verification_base_url: String,
    /// QR描画サービスのURL
    pub qr_render_base_url: String,
    /// LedgerのベースURL
    pub trust_endpoint: String,
    pub trust_timeout: Duration,
    /// Ledgerの署名検証用公開鍵（Base58）
    pub trust_pubkey: Option<String>,
    /// アップロード最大サイズ（バイト）
    pub max_upload_size: usize,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl GatewayConfig {
    /// 環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        let storage_backend = env_or("STORAGE_BACKEND", "fs").parse()?;
        let storage_dir = PathBuf::from(env_or("STORAGE_DIR", "uploads"));
        let records_path = std::env::var("RECORDS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| storage_dir.join("records.json"));

        let trust_timeout_ms: u64 = env_or("TRUST_TIMEOUT_MS", "5000")
            .parse()
            .map_err(|e| anyhow::anyhow!("TRUST_TIMEOUT_MSが不正です: {e}"))?;
        let max_upload_size: usize = env_or("MAX_UPLOAD_SIZE", &(50 * 1024 * 1024).to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("MAX_UPLOAD_SIZEが不正です: {e}"))?;

        Ok(Self {
            addr: env_or("GATEWAY_ADDR", "0.0.0.0:8002"),
            storage_backend,
            storage_dir,
            records_path,
            verification_base_url: env_or("VERIFICATION_BASE_URL", "http://localhost:3000/verify"),
            qr_render_base_url: env_or(
                "QR_RENDER_BASE_URL",
                "https://api.qrserver.com/v1/create-qr-code/",
            ),
            trust_endpoint: env_or("TRUST_ENDPOINT", "http://localhost:8003"),
            trust_timeout: Duration::from_millis(trust_timeout_ms),
            trust_pubkey: std::env::var("TRUST_PUBKEY").ok(),
            max_upload_size,
        })
    }
}

/// Gatewayの共有状態。
pub struct GatewayState {
    pub orchestrator: Orchestrator,
    /// アップロード最大サイズ（バイト）
    pub max_upload_size: usize,
}

fn blob_store(config: &GatewayConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    Ok(match config.storage_backend {
        StorageBackend::Memory => Arc::new(MemoryBlobStore::new()),
        StorageBackend::Fs => Arc::new(FsBlobStore::new(&config.storage_dir)),
        #[cfg(feature = "vendor-aws")]
        StorageBackend::S3 => Arc::new(tamperproof_core::blob::S3BlobStore::from_env()?),
        #[cfg(not(feature = "vendor-aws"))]
        StorageBackend::S3 => {
            anyhow::bail!("S3バックエンドは vendor-aws feature なしでは利用できません")
        }
    })
}

/// 設定からGatewayの共有状態を組み立てる。
pub async fn build_state(config: &GatewayConfig) -> anyhow::Result<GatewayState> {
    let blobs = blob_store(config)?;
    let store = match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("memoryバックエンドで起動します。再起動でドキュメントは失われます");
            IndexedDocumentStore::in_memory(blobs)
        }
        StorageBackend::Fs | StorageBackend::S3 => {
            IndexedDocumentStore::open(blobs, &config.records_path).await?
        }
    };

    let proof = ProofArtifactGenerator::new(
        &config.verification_base_url,
        &config.qr_render_base_url,
    )?;

    let ledger_pubkey = config
        .trust_pubkey
        .as_deref()
        .map(tamperproof_crypto::verifying_key_from_base58)
        .transpose()?;
    if ledger_pubkey.is_none() {
        tracing::warn!("TRUST_PUBKEYが未設定です。Ledger署名の検証をスキップします（開発環境用）");
    }
    let trust = HttpTrustClient::new(&config.trust_endpoint, config.trust_timeout, ledger_pubkey)?;

    tracing::info!(
        storage_backend = ?config.storage_backend,
        trust_endpoint = %config.trust_endpoint,
        trust_timeout_ms = config.trust_timeout.as_millis() as u64,
        "Gateway設定を読み込みました"
    );

    Ok(GatewayState {
        orchestrator: Orchestrator::new(Arc::new(store), proof, Arc::new(trust)),
        max_upload_size: config.max_upload_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("fs".parse::<StorageBackend>().unwrap(), StorageBackend::Fs);
        assert_eq!("s3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert!("mongo".parse::<StorageBackend>().is_err());
    }

    #[tokio::test]
    async fn test_build_state_fs_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig {
            addr: "127.0.0.1:0".to_string(),
            storage_backend: StorageBackend::Fs,
            storage_dir: dir.path().to_path_buf(),
            records_path: dir.path().join("records.json"),
            verification_base_url: "http://localhost:3000/verify".to_string(),
            qr_render_base_url: "https://api.qrserver.com/v1/create-qr-code/".to_string(),
            trust_endpoint: "http://127.0.0.1:9".to_string(),
            trust_timeout: Duration::from_millis(100),
            trust_pubkey: None,
            max_upload_size: 1024,
        };

        let state = build_state(&config).await.unwrap();
        let uploaded = state.orchestrator.upload("a.txt", b"hello").await.unwrap();
        assert!(dir.path().join("records.json").exists());
        assert!(dir.path().join(format!("uploads/{}", uploaded.id)).exists());
    }

    #[tokio::test]
    async fn test_build_state_rejects_bad_pubkey() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig {
            addr: "127.0.0.1:0".to_string(),
            storage_backend: StorageBackend::Memory,
            storage_dir: dir.path().to_path_buf(),
            records_path: dir.path().join("records.json"),
            verification_base_url: "http://localhost:3000/verify".to_string(),
            qr_render_base_url: "https://api.qrserver.com/v1/create-qr-code/".to_string(),
            trust_endpoint: "http://127.0.0.1:9".to_string(),
            trust_timeout: Duration::from_millis(100),
            trust_pubkey: Some("not-base58-0OIl".to_string()),
            max_upload_size: 1024,
        };
        assert!(build_state(&config).await.is_err());
    }
}
