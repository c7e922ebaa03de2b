//! # 登録・検証オーケストレーター
//!
//! リクエスト種別ごとに、コンテンツダイジェスト・ドキュメントストア・
//! 証明アーティファクト生成・信頼確認クライアントを組み合わせる。
//!
//! | 操作 | 処理 |
//! |------|------|
//! | 登録 | bytes → ダイジェスト → create → Ledgerへのアンカー → 証明アーティファクト参照 |
//! | ファイル検証 | bytes → ダイジェスト → get_by_digest |
//! | ダイジェスト検証 | digest（前後の空白を除く） → get_by_digest |
//! | 検証済み化 | mark_verified(id) |
//! | 相互確認 | digest → Ledger確認 + ローカルの `verified` |

use std::sync::Arc;

use tamperproof_core::{DocumentStore, StoreError, Transition};
use tamperproof_types::*;

use crate::error::GatewayError;
use crate::proof::ProofArtifactGenerator;
use crate::trust::TrustConfirmer;

/// ドキュメントIDから証明アーティファクト取得パスを作る。
pub fn proof_artifact_ref(document_id: &str) -> String {
    format!("/qr/{document_id}")
}

/// 入力されたダイジェストの前後の空白を除く。形式の検査はしない。
fn normalize_digest(digest: &str) -> &str {
    digest.trim()
}

fn verification_view(doc: &Document) -> VerificationView {
    VerificationView {
        verified: doc.verified,
        digest: doc.digest.clone(),
        filename: doc.filename.clone(),
        upload_timestamp: doc.upload_timestamp,
        document_id: doc.id.clone(),
        proof_artifact_ref: proof_artifact_ref(&doc.id),
    }
}

pub struct Orchestrator {
    store: Arc<dyn DocumentStore>,
    proof: ProofArtifactGenerator,
    trust: Arc<dyn TrustConfirmer>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        proof: ProofArtifactGenerator,
        trust: Arc<dyn TrustConfirmer>,
    ) -> Self {
        Self { store, proof, trust }
    }

    /// ファイルを登録する。同一内容でも毎回新しいレコードを作る。
    ///
    /// ダイジェストのLedgerへのアンカーはベストエフォートで、失敗しても登録は成功する
    /// （`anchored = false`）。
    pub async fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadResponse, GatewayError> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(GatewayError::BadRequest("ファイル名が指定されていません".to_string()));
        }

        let doc = self.store.create(filename, bytes).await?;
        // 参照先が生成可能であることをこの時点で確認する
        self.proof.generate(&doc.digest)?;

        let anchored = match self.trust.anchor(&doc.digest).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    document_id = %doc.id,
                    digest = %doc.digest,
                    error = %e,
                    "Ledgerへのアンカーに失敗しました（登録は完了）"
                );
                false
            }
        };

        Ok(UploadResponse {
            id: doc.id.clone(),
            digest: doc.digest,
            filename: doc.filename,
            verified: doc.verified,
            upload_timestamp: doc.upload_timestamp,
            proof_artifact_ref: proof_artifact_ref(&doc.id),
            anchored,
        })
    }

    /// ファイルの内容から登録済みレコードを検索する。
    pub async fn verify_by_file(&self, bytes: &[u8]) -> Result<VerificationView, GatewayError> {
        let digest = tamperproof_crypto::digest(bytes);
        self.verify_by_digest(&digest).await
    }

    /// ダイジェストから登録済みレコードを検索する。
    /// 形式の検査は行わないため、不正なダイジェストは単に `NotFound` となる。
    pub async fn verify_by_digest(&self, digest: &str) -> Result<VerificationView, GatewayError> {
        let digest = normalize_digest(digest);
        let doc = self.store.get_by_digest(digest).await?;
        tracing::debug!(digest = %digest, document_id = %doc.id, verified = doc.verified, "ダイジェスト照合");
        Ok(verification_view(&doc))
    }

    pub async fn mark_verified(&self, id: &str) -> Result<Transition, GatewayError> {
        Ok(self.store.mark_verified(id).await?)
    }

    /// Ledgerの信頼確認とローカルの検証状態を1つの応答にまとめる。
    ///
    /// Ledgerが応答しない場合、`strict` でなければ `trust_status = unavailable`
    /// としてローカルの状態だけを返す。`strict` の場合は `Upstream` エラー。
    pub async fn cross_check(
        &self,
        digest: &str,
        strict: bool,
    ) -> Result<CrossCheckResponse, GatewayError> {
        let digest = normalize_digest(digest);
        if digest.is_empty() {
            return Err(GatewayError::BadRequest("ダイジェストが空です".to_string()));
        }

        let local = match self.store.get_by_digest(digest).await {
            Ok(doc) => Some(doc),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };

        let (trust_status, attested, trust_detail) = match self.trust.confirm(digest).await {
            Ok(verdict) => {
                let status = if verdict.attested {
                    TrustStatus::Attested
                } else {
                    TrustStatus::NotAttested
                };
                (status, Some(verdict.attested), verdict.detail)
            }
            Err(e) if strict => return Err(e.into()),
            Err(e) => {
                tracing::warn!(digest = %digest, error = %e, "信頼確認が利用できないためローカル状態のみ返します");
                (TrustStatus::Unavailable, None, e.to_string())
            }
        };

        Ok(CrossCheckResponse {
            digest: digest.to_string(),
            document_id: local.as_ref().map(|d| d.id.clone()),
            local_verified: local.as_ref().map(|d| d.verified),
            trust_status,
            attested,
            trust_detail,
        })
    }

    pub async fn list(&self) -> Result<Vec<DocumentView>, GatewayError> {
        Ok(self
            .store
            .list()
            .await?
            .iter()
            .map(|doc| DocumentView::from_document(doc, proof_artifact_ref(&doc.id)))
            .collect())
    }

    pub async fn stats(&self) -> Result<StatsResponse, GatewayError> {
        Ok(self.store.stats().await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        Ok(self.store.delete(id).await?)
    }

    pub async fn download(&self, id: &str) -> Result<(Document, Vec<u8>), GatewayError> {
        Ok(self.store.download(id).await?)
    }

    /// ドキュメントIDに対応する証明アーティファクト。
    pub async fn proof_artifact(&self, id: &str) -> Result<ProofArtifact, GatewayError> {
        let doc = self.store.get_by_id(id).await?;
        Ok(self.proof.generate(&doc.digest)?)
    }
}
