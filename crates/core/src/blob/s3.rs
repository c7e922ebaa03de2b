//! # S3互換Blobストレージ
//!
//! AWS S3, MinIO, Cloudflare R2 等のS3互換APIを使用するBlobストレージ実装。

use super::BlobStore;
use crate::error::StoreError;

/// S3互換ストレージによるBlobストレージ実装。
pub struct S3BlobStore {
    bucket: s3::Bucket,
}

impl S3BlobStore {
    /// S3互換バケットからBlobStoreを構築する。
    pub fn new(bucket: s3::Bucket) -> Self {
        Self { bucket }
    }

    /// S3互換バケットを初期化する。
    fn init_bucket(
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        bucket_name: &str,
    ) -> anyhow::Result<s3::Bucket> {
        // AWS S3エンドポイント（s3.REGION.amazonaws.com）からリージョンを自動検出。
        // 非AWSエンドポイントではus-east-1をフォールバックとして使用。
        let detected_region = std::env::var("S3_REGION").ok().unwrap_or_else(|| {
            endpoint
                .find("s3.")
                .and_then(|start| {
                    let rest = &endpoint[start + 3..];
                    rest.find(".amazonaws.com").map(|end| rest[..end].to_string())
                })
                .unwrap_or_else(|| "us-east-1".to_string())
        });
        let region = s3::Region::Custom {
            region: detected_region,
            endpoint: endpoint.to_string(),
        };

        let credentials = s3::creds::Credentials::new(
            Some(access_key),
            Some(secret_key),
            None,
            None,
            None,
        )?;

        let bucket = s3::Bucket::new(bucket_name, region, credentials)?.with_path_style();

        Ok(*bucket)
    }

    /// 環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        let endpoint = std::env::var("S3_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:9000".to_string());
        let access_key =
            std::env::var("S3_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let secret_key =
            std::env::var("S3_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let bucket_name =
            std::env::var("S3_BUCKET").unwrap_or_else(|_| "tamperproof-documents".to_string());

        tracing::info!(s3_endpoint = %endpoint, bucket = %bucket_name, "S3互換Blobストレージを設定");

        let bucket = Self::init_bucket(&endpoint, &access_key, &secret_key, &bucket_name)?;
        Ok(Self::new(bucket))
    }
}

fn check_status(op: &str, key: &str, status: u16) -> Result<(), StoreError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(StoreError::StorageUnavailable(format!(
            "S3 {op} がHTTP {status} を返しました ({key})"
        )))
    }
}

#[async_trait::async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let response = self
            .bucket
            .put_object(key, bytes)
            .await
            .map_err(|e| StoreError::unavailable("S3アップロード失敗", e))?;
        check_status("PUT", key, response.status_code())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self.bucket.get_object(key).await {
            Ok(response) if response.status_code() == 404 => Ok(None),
            Ok(response) => {
                check_status("GET", key, response.status_code())?;
                Ok(Some(response.bytes().to_vec()))
            }
            Err(s3::error::S3Error::HttpFailWithBody(404, _)) => Ok(None),
            Err(e) => Err(StoreError::unavailable("S3ダウンロード失敗", e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self.bucket.delete_object(key).await {
            Ok(response) if response.status_code() == 404 => Ok(()),
            Ok(response) => check_status("DELETE", key, response.status_code()),
            Err(s3::error::S3Error::HttpFailWithBody(404, _)) => Ok(()),
            Err(e) => Err(StoreError::unavailable("S3削除失敗", e)),
        }
    }
}
