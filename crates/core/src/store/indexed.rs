//! # インデックス付きドキュメントストア
//!
//! レコードはプロセス内インデックス（登録順 + ID + ダイジェスト）で保持し、
//! 生バイト列は `BlobStore` に委譲する。`open` で開いた場合は変更を
//! ジャーナルに追記してからインデックスに反映する（`journal` モジュール参照）。
//!
//! ## 同一IDに対する操作の直列化
//! レコードの変更は全てインデックスの書き込みロック下で行う。
//! `download` は読み込みロックを保持したままBlobを読むため、
//! 削除途中の状態（レコードだけ・バイト列だけ）が観測されることはない。
//!
//! ## 呼び出し側の中断
//! 変更操作は `tokio::spawn` したタスク内で最後まで実行する。
//! 呼び出し側のFutureが途中で破棄されても（クライアント切断等）、
//! ジャーナルとインデックスが食い違うことはない。

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tamperproof_types::{Document, StatsResponse};
use tokio::sync::RwLock;

use super::journal::{Journal, JournalEntry, DEFAULT_COMPACT_EVERY};
use super::DocumentStore;
use crate::blob::BlobStore;
use crate::error::StoreError;
use crate::verification::{self, Transition, VerificationState};

/// 登録順の連番をキーにしたレコード集合と、IDおよびダイジェストの副次インデックス。
#[derive(Default)]
struct Index {
    next_seq: u64,
    records: BTreeMap<u64, Document>,
    by_id: HashMap<String, u64>,
    /// 値は登録順（昇順）
    by_digest: HashMap<String, Vec<u64>>,
}

impl Index {
    fn insert(&mut self, doc: Document) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_id.insert(doc.id.clone(), seq);
        self.by_digest.entry(doc.digest.clone()).or_default().push(seq);
        self.records.insert(seq, doc);
    }

    fn remove(&mut self, id: &str) -> Option<Document> {
        let seq = self.by_id.remove(id)?;
        let doc = self.records.remove(&seq)?;
        if let Some(seqs) = self.by_digest.get_mut(&doc.digest) {
            seqs.retain(|s| *s != seq);
            if seqs.is_empty() {
                self.by_digest.remove(&doc.digest);
            }
        }
        Some(doc)
    }

    /// ジャーナルの1件を反映する。起動時の再適用でも使うため冪等。
    fn apply(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::Created { document } => {
                if !self.by_id.contains_key(&document.id) {
                    self.insert(document);
                }
            }
            JournalEntry::Verified { id } => {
                if let Some(doc) = self.get_mut(&id) {
                    verification::mark_verified(doc);
                }
            }
            JournalEntry::Deleted { id } => {
                self.remove(&id);
            }
        }
    }

    fn get(&self, id: &str) -> Option<&Document> {
        self.by_id.get(id).and_then(|seq| self.records.get(seq))
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Document> {
        let seq = *self.by_id.get(id)?;
        self.records.get_mut(&seq)
    }

    fn matching(&self, digest: &str) -> impl Iterator<Item = &Document> {
        self.by_digest
            .get(digest)
            .into_iter()
            .flatten()
            .filter_map(|seq| self.records.get(seq))
    }

    fn snapshot(&self) -> Vec<Document> {
        self.records.values().cloned().collect()
    }
}

/// 書き込みロックで保護される状態。
struct Guarded {
    index: Index,
    /// `in_memory` の場合はNone
    journal: Option<Journal>,
}

impl Guarded {
    /// 変更をジャーナルに追記し、成功した場合のみインデックスに反映する。
    async fn commit(&mut self, entry: JournalEntry) -> Result<(), StoreError> {
        if let Some(journal) = self.journal.as_mut() {
            journal.append(&entry).await?;
        }
        self.index.apply(entry);

        if let Some(journal) = self.journal.as_mut() {
            if journal.needs_compaction() {
                // 変更はジャーナル上で確定済みなので、失敗しても次回に再試行する
                if let Err(e) = journal.compact(&self.index.snapshot()).await {
                    tracing::warn!(error = %e, "スナップショットの書き直しに失敗");
                }
            }
        }
        Ok(())
    }
}

struct Inner {
    blobs: Arc<dyn BlobStore>,
    state: RwLock<Guarded>,
}

/// `BlobStore` とプロセス内インデックスによる `DocumentStore` 実装。
pub struct IndexedDocumentStore {
    inner: Arc<Inner>,
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn not_found(id: &str) -> StoreError {
    StoreError::NotFound(format!("id={id}"))
}

impl IndexedDocumentStore {
    fn with_state(blobs: Arc<dyn BlobStore>, index: Index, journal: Option<Journal>) -> Self {
        Self {
            inner: Arc::new(Inner {
                blobs,
                state: RwLock::new(Guarded { index, journal }),
            }),
        }
    }

    /// レコードをメモリ内のみに保持するストアを作成する。
    pub fn in_memory(blobs: Arc<dyn BlobStore>) -> Self {
        Self::with_state(blobs, Index::default(), None)
    }

    /// スナップショットとジャーナルからレコードを復元してストアを開く。
    /// ファイルが存在しない場合は空のストアになる。
    pub async fn open(
        blobs: Arc<dyn BlobStore>,
        snapshot_path: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        Self::open_with(blobs, snapshot_path.into(), DEFAULT_COMPACT_EVERY).await
    }

    pub(crate) async fn open_with(
        blobs: Arc<dyn BlobStore>,
        snapshot_path: PathBuf,
        compact_every: usize,
    ) -> Result<Self, StoreError> {
        let mut journal = Journal::new(snapshot_path.clone(), compact_every);
        let recovered = journal.recover().await?;

        let mut index = Index::default();
        for doc in recovered.records {
            index.insert(doc);
        }
        let replayed = recovered.entries.len();
        let has_log = recovered.has_log;
        for entry in recovered.entries {
            index.apply(entry);
        }
        if has_log {
            // 途切れた行を含むジャーナルを持ち越さない
            journal.compact(&index.snapshot()).await?;
        }

        tracing::info!(
            path = %snapshot_path.display(),
            records = index.records.len(),
            replayed,
            "ドキュメントストアを開きました"
        );

        Ok(Self::with_state(blobs, index, Some(journal)))
    }

    /// 変更操作を独立したタスクで最後まで実行する。
    async fn run_detached<T, F, Fut>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(Arc<Inner>) -> Fut,
        Fut: Future<Output = Result<T, StoreError>> + Send + 'static,
        T: Send + 'static,
    {
        tokio::spawn(op(self.inner.clone()))
            .await
            .map_err(|e| StoreError::unavailable("ストア操作タスクが異常終了", e))?
    }
}

impl Inner {
    async fn fresh_id(&self) -> String {
        let state = self.state.read().await;
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if !state.index.by_id.contains_key(&id) {
                return id;
            }
        }
    }

    async fn create(&self, filename: String, bytes: Vec<u8>) -> Result<Document, StoreError> {
        let digest = tamperproof_crypto::digest(&bytes);
        let id = self.fresh_id().await;
        let storage_reference = format!("uploads/{id}");

        // バイト列の保存が完了してからレコードを登録する
        self.blobs.put(&storage_reference, &bytes).await?;

        let doc = Document {
            id: id.clone(),
            filename,
            digest,
            upload_timestamp: now_unix_secs(),
            verified: false,
            storage_reference,
        };

        let mut state = self.state.write().await;
        let committed = if state.index.by_id.contains_key(&id) {
            Err(StoreError::StorageUnavailable(format!(
                "ドキュメントIDが衝突しました: {id}"
            )))
        } else {
            state
                .commit(JournalEntry::Created {
                    document: doc.clone(),
                })
                .await
        };
        drop(state);

        if let Err(e) = committed {
            if let Err(cleanup) = self.blobs.delete(&doc.storage_reference).await {
                tracing::warn!(document_id = %id, error = %cleanup, "孤立したBlobの削除に失敗");
            }
            return Err(e);
        }

        tracing::info!(
            document_id = %doc.id,
            digest = %doc.digest,
            size = bytes.len(),
            "ドキュメントを登録しました"
        );
        Ok(doc)
    }

    async fn mark_verified(&self, id: String) -> Result<Transition, StoreError> {
        let mut state = self.state.write().await;
        let doc = state.index.get(&id).ok_or_else(|| not_found(&id))?;
        if VerificationState::of(doc) == VerificationState::Verified {
            return Ok(Transition::AlreadyVerified);
        }

        state.commit(JournalEntry::Verified { id: id.clone() }).await?;
        tracing::info!(document_id = %id, "ドキュメントを検証済みにしました");
        Ok(Transition::Transitioned)
    }

    async fn delete(&self, id: String) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let storage_reference = state
            .index
            .get(&id)
            .map(|doc| doc.storage_reference.clone())
            .ok_or_else(|| not_found(&id))?;

        state.commit(JournalEntry::Deleted { id: id.clone() }).await?;

        // レコードは既に参照不能なので、Blob削除の失敗は孤立Blobとして記録のみ
        if let Err(e) = self.blobs.delete(&storage_reference).await {
            tracing::warn!(document_id = %id, error = %e, "Blobの削除に失敗（孤立Blob）");
        }
        tracing::info!(document_id = %id, "ドキュメントを削除しました");
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentStore for IndexedDocumentStore {
    async fn create(&self, filename: &str, bytes: &[u8]) -> Result<Document, StoreError> {
        let filename = filename.to_string();
        let bytes = bytes.to_vec();
        self.run_detached(move |inner| async move { inner.create(filename, bytes).await })
            .await
    }

    async fn get_by_id(&self, id: &str) -> Result<Document, StoreError> {
        self.inner
            .state
            .read()
            .await
            .index
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn get_by_digest(&self, digest: &str) -> Result<Document, StoreError> {
        self.inner
            .state
            .read()
            .await
            .index
            .matching(digest)
            .next()
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("digest={digest}")))
    }

    async fn list_by_digest(&self, digest: &str) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .inner
            .state
            .read()
            .await
            .index
            .matching(digest)
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self.inner.state.read().await.index.snapshot())
    }

    async fn mark_verified(&self, id: &str) -> Result<Transition, StoreError> {
        let id = id.to_string();
        self.run_detached(move |inner| async move { inner.mark_verified(id).await })
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        self.run_detached(move |inner| async move { inner.delete(id).await })
            .await
    }

    async fn stats(&self) -> Result<StatsResponse, StoreError> {
        let state = self.inner.state.read().await;
        let total = state.index.records.len() as u64;
        let verified_count = state.index.records.values().filter(|d| d.verified).count() as u64;
        Ok(StatsResponse {
            total,
            verified_count,
            pending_count: total - verified_count,
        })
    }

    async fn download(&self, id: &str) -> Result<(Document, Vec<u8>), StoreError> {
        let state = self.inner.state.read().await;
        let doc = state.index.get(id).cloned().ok_or_else(|| not_found(id))?;
        let bytes = self
            .inner
            .blobs
            .get(&doc.storage_reference)
            .await?
            .ok_or_else(|| {
                StoreError::StorageUnavailable(format!(
                    "レコードに対応するバイト列がありません: {}",
                    doc.storage_reference
                ))
            })?;
        Ok((doc, bytes))
    }
}
