//! # 信頼確認クライアント
//!
//! 外部の信頼確認サービス（Ledger）にダイジェストを登録（アンカー）し、
//! 後からアテステーションを問い合わせる。
//! 結果は助言的なもので、ドキュメントストアの `verified` フラグは変更しない。
//!
//! ## 実装
//! - `HttpTrustClient`: HTTP経由でLedgerに問い合わせる（タイムアウト付き）

pub mod http;

pub use http::HttpTrustClient;

/// 信頼確認の結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustVerdict {
    pub attested: bool,
    pub detail: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    /// Ledgerに到達できない、タイムアウト、非成功レスポンス、不正なレスポンス
    #[error("{0}")]
    UpstreamUnavailable(String),
}

/// 信頼確認の抽象インターフェース。
///
/// プロセス内合成（テスト）とネットワーク越しの呼び出しを
/// オーケストレーターを変更せずに差し替えられる。
#[async_trait::async_trait]
pub trait TrustConfirmer: Send + Sync {
    /// ダイジェストを台帳に登録する。登録済みでも成功。
    async fn anchor(&self, digest: &str) -> Result<(), TrustError>;

    async fn confirm(&self, digest: &str) -> Result<TrustVerdict, TrustError>;
}
