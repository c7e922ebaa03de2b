//! # ドキュメントストア
//!
//! ドキュメントレコードの集合。主キーは生成されたドキュメントID、
//! 副次インデックスはダイジェスト（非一意）。
//!
//! 実装は `DocumentStore` トレイトの背後に置き、オーケストレーターは
//! 格納媒体を意識しない。

mod indexed;
mod journal;


pub use indexed::IndexedDocumentStore;

use tamperproof_types::{Document, StatsResponse};

use crate::error::StoreError;
use crate::verification::Transition;

/// ドキュメントストアの抽象インターフェース。
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// ダイジェストを計算し、新しいIDでバイト列とレコードを保存する。
    /// 返却されるレコードは `verified == false`。
    async fn create(&self, filename: &str, bytes: &[u8]) -> Result<Document, StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<Document, StoreError>;

    /// ダイジェストに一致する最初のレコード（登録順）を返す。
    async fn get_by_digest(&self, digest: &str) -> Result<Document, StoreError>;

    /// ダイジェストに一致する全レコードを登録順で返す。該当なしは空。
    async fn list_by_digest(&self, digest: &str) -> Result<Vec<Document>, StoreError>;

    /// 全レコードのスナップショットを登録順で返す。
    async fn list(&self) -> Result<Vec<Document>, StoreError>;

    /// レコードを検証済みにする。既に検証済みでも成功（冪等）。
    async fn mark_verified(&self, id: &str) -> Result<Transition, StoreError>;

    /// レコードとバイト列を削除する。
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// 現在の状態から集計する。
    async fn stats(&self) -> Result<StatsResponse, StoreError>;

    /// `create` に渡されたバイト列をそのまま返す。
    /// レコードとバイト列は同一時点のものが組で返る。
    async fn download(&self, id: &str) -> Result<(Document, Vec<u8>), StoreError>;
}
