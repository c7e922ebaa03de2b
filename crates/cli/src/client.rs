//! # Gateway / Ledger APIクライアント

use std::path::Path;

use serde::de::DeserializeOwned;
use tamperproof_types::*;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("ファイルを読み込めません ({path}): {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("サーバーに接続できません: {0}")]
    Connect(#[from] reqwest::Error),
    #[error("サーバーがエラーを返しました ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// 応答ステータスを確認し、成功時はJSONをデコードする。
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CliError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CliError::Status { status, body });
    }
    Ok(response.json().await?)
}

pub async fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    tokio::fs::read(path).await.map_err(|source| CliError::ReadFile {
        path: path.display().to_string(),
        source,
    })
}

/// アップロード時のファイル名。パスの末尾要素のみを送る。
pub fn upload_filename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string())
}

fn base_url(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

pub struct GatewayClient {
    base: String,
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base: &str) -> Self {
        Self {
            base: base_url(base),
            http: reqwest::Client::new(),
        }
    }

    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadResponse, CliError> {
        let response = self
            .http
            .post(format!("{}/documents/upload", self.base))
            .query(&[("filename", filename)])
            .body(bytes)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn verify_file(&self, bytes: Vec<u8>) -> Result<VerificationView, CliError> {
        let response = self
            .http
            .post(format!("{}/verify/file", self.base))
            .body(bytes)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn verify_hash(&self, digest: &str) -> Result<VerificationView, CliError> {
        let response = self
            .http
            .get(format!("{}/verify/hash", self.base))
            .query(&[("document_hash", digest)])
            .send()
            .await?;
        decode(response).await
    }

    pub async fn mark_verified(&self, id: &str) -> Result<MessageResponse, CliError> {
        let response = self
            .http
            .patch(format!("{}/documents/{id}/verify", self.base))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn stats(&self) -> Result<StatsResponse, CliError> {
        let response = self
            .http
            .get(format!("{}/documents/stats", self.base))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn trust_confirm(
        &self,
        digest: &str,
        strict: bool,
    ) -> Result<CrossCheckResponse, CliError> {
        let response = self
            .http
            .post(format!("{}/trust/confirm", self.base))
            .query(&[("strict", strict)])
            .json(&DigestRequest {
                digest: digest.to_string(),
            })
            .send()
            .await?;
        decode(response).await
    }
}

/// Ledgerへの直接登録用クライアント。
pub struct LedgerClient {
    base: String,
    http: reqwest::Client,
}

impl LedgerClient {
    pub fn new(base: &str) -> Self {
        Self {
            base: base_url(base),
            http: reqwest::Client::new(),
        }
    }

    pub async fn anchor(&self, digest: &str) -> Result<AnchorResponse, CliError> {
        let response = self
            .http
            .post(format!("{}/anchor", self.base))
            .json(&DigestRequest {
                digest: digest.trim().to_string(),
            })
            .send()
            .await?;
        decode(response).await
    }
}
