//! # TamperProof Core
//!
//! ドキュメントストア、生バイト列のBlobストレージ、検証状態遷移を提供する。
//!
//! ## 構成
//! - `blob`: 生バイト列の格納先（メモリ / ファイルシステム / S3互換）
//! - `store`: ドキュメントレコードの永続化とダイジェストによる検索
//! - `verification`: `Pending → Verified` の状態遷移規則

pub mod blob;
pub mod error;
pub mod store;
pub mod verification;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use error::StoreError;
pub use store::{DocumentStore, IndexedDocumentStore};
pub use verification::{Transition, VerificationState};
