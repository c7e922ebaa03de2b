//! # Blobストレージ
//!
//! ドキュメントの生バイト列を `storage_reference` キーで保持する抽象インターフェース。
//!
//! ## 実装
//! - `MemoryBlobStore`: プロセス内メモリ（開発・テスト用）
//! - `FsBlobStore`: ローカルディレクトリ
//! - `S3BlobStore`: S3互換ストレージ（AWS S3, MinIO, Cloudflare R2等、`vendor-aws` feature）

pub mod fs;
pub mod memory;
#[cfg(feature = "vendor-aws")]
pub mod s3;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;
#[cfg(feature = "vendor-aws")]
pub use s3::S3BlobStore;

use crate::error::StoreError;

/// Blobストレージの抽象インターフェース。
///
/// `put` が成功を返した時点で、キーは完全なバイト列を指していなければならない
/// （書き込み途中のバイト列が観測されてはならない）。
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// キーにバイト列を格納する。
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// キーのバイト列を取得する。存在しない場合は `None`。
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// キーを削除する。存在しないキーの削除は成功扱い。
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
