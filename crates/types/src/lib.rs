//! # TamperProof 共有型定義
//!
//! Gateway・Ledger・CLIの間でやり取りされるデータ構造をRust構造体として提供する。
//!
//! ## エンコーディング規則
//! - Hex: コンテンツダイジェスト（SHA-256、小文字64文字）
//! - Base58: 公開鍵
//! - Base64: 署名

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ドキュメントレコード
// ---------------------------------------------------------------------------

/// 永続化されるドキュメントレコード。
///
/// `digest` は内容のみから決まり、同一バイト列は常に同一のダイジェストを持つ。
/// ダイジェストはレコード間で一意ではない（同じファイルを2回アップロードすると
/// 2件の独立したレコードになる）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// アップロード時に生成される一意なID（UUIDv4）
    pub id: String,
    /// アップロード元のファイル名（表示用、検索には使わない）
    pub filename: String,
    /// SHA-256ダイジェスト（小文字Hex）
    pub digest: String,
    /// アップロード時刻（UNIX秒）
    pub upload_timestamp: u64,
    /// 検証済みフラグ。falseで始まり、一度trueになったら戻らない。
    pub verified: bool,
    /// 生バイト列の格納先キー
    pub storage_reference: String,
}

/// ドキュメントの一覧・参照用ビュー。
/// `storage_reference` は外部に出さない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentView {
    pub id: String,
    pub filename: String,
    pub digest: String,
    pub upload_timestamp: u64,
    pub verified: bool,
    /// 証明アーティファクト（QR）の取得パス
    pub proof_artifact_ref: String,
}

impl DocumentView {
    /// レコードと証明アーティファクト参照からビューを構築する。
    pub fn from_document(doc: &Document, proof_artifact_ref: String) -> Self {
        Self {
            id: doc.id.clone(),
            filename: doc.filename.clone(),
            digest: doc.digest.clone(),
            upload_timestamp: doc.upload_timestamp,
            verified: doc.verified,
            proof_artifact_ref,
        }
    }
}

// ---------------------------------------------------------------------------
// Gateway API リクエスト/レスポンス
// ---------------------------------------------------------------------------

/// POST /documents/upload のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: String,
    pub digest: String,
    pub filename: String,
    /// アップロード直後は常にfalse
    pub verified: bool,
    pub upload_timestamp: u64,
    pub proof_artifact_ref: String,
    /// Ledgerへのダイジェスト登録に成功したか。失敗しても登録自体は完了している。
    pub anchored: bool,
}

/// POST /verify/file, GET /verify/hash のレスポンス。
/// 同一ダイジェストのレコードが複数ある場合は最初に登録されたもの。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationView {
    pub verified: bool,
    pub digest: String,
    pub filename: String,
    pub upload_timestamp: u64,
    pub document_id: String,
    pub proof_artifact_ref: String,
}

/// GET /documents/stats のレスポンス。
/// 常に `total == verified_count + pending_count` が成り立つ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total: u64,
    pub verified_count: u64,
    pub pending_count: u64,
}

/// 成功時の簡易メッセージレスポンス（PATCH/DELETE）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// 証明アーティファクト。
///
/// `payload` がスキャン可能なコードにエンコードされる内容
/// （`{verification_base}/{digest}`）。`render_url` は外部のQR描画サービスで
/// 画像を得るためのURL。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub digest: String,
    pub payload: String,
    pub render_url: String,
}

// ---------------------------------------------------------------------------
// 信頼確認 (Gateway <-> Ledger)
// ---------------------------------------------------------------------------

/// ダイジェストのみを運ぶリクエスト。
/// POST /trust/confirm（Gateway）、POST /confirm・/anchor（Ledger）で共用。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestRequest {
    pub digest: String,
}

/// Ledgerの署名対象。
/// Ed25519署名は本構造体のJSONシリアライズに対して行う。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationSignTarget {
    pub digest: String,
    pub attested: bool,
    pub anchored_at: Option<u64>,
}

/// Ledger POST /confirm のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmResponse {
    pub digest: String,
    pub attested: bool,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchored_at: Option<u64>,
    /// Base64エンコードされたEd25519署名（`AttestationSignTarget` が対象）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Ledger POST /anchor のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorResponse {
    pub digest: String,
    pub anchored_at: u64,
    /// 既に登録済みだった場合true（anchored_atは最初の登録時刻のまま）
    pub already_anchored: bool,
}

/// Ledger POST /generate-hash のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashResponse {
    pub hash: String,
}

/// Ledger GET /.well-known/ledger-info のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerInfo {
    /// Base58エンコードされたEd25519公開鍵
    pub signing_pubkey: String,
}

/// 外部信頼確認の結果区分。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustStatus {
    Attested,
    NotAttested,
    /// Ledgerが応答しなかった（タイムアウト、接続失敗、エラー応答）
    Unavailable,
}

/// Gateway POST /trust/confirm のレスポンス。
///
/// ローカルの `verified` フラグと外部の信頼確認は独立したシグナルとして
/// それぞれ別フィールドで返す。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossCheckResponse {
    pub digest: String,
    /// ローカルに該当レコードがない場合はNone
    pub document_id: Option<String>,
    /// ローカルの検証済みフラグ。レコードがない場合はNone。
    pub local_verified: Option<bool>,
    pub trust_status: TrustStatus,
    /// Ledgerが応答しなかった場合はNone
    pub attested: Option<bool>,
    pub trust_detail: String,
}
