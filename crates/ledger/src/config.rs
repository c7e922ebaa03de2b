//! # Ledger設定・共有状態

use std::time::{SystemTime, UNIX_EPOCH};

use tamperproof_crypto::{Ed25519SigningKey, Ed25519VerifyingKey};

use crate::anchors::AnchorBook;

/// Ledgerの共有状態。
pub struct LedgerState {
    /// アテステーション署名用Ed25519秘密鍵
    pub signing_key: Ed25519SigningKey,
    pub verifying_key: Ed25519VerifyingKey,
    pub anchors: AnchorBook,
}

impl LedgerState {
    /// アンカーをメモリ内のみに保持する状態（テスト用）。
    pub fn new(signing_key: Ed25519SigningKey) -> Self {
        Self::with_anchors(signing_key, AnchorBook::in_memory())
    }

    pub fn with_anchors(signing_key: Ed25519SigningKey, anchors: AnchorBook) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
            anchors,
        }
    }
}

/// 環境変数 `LEDGER_SIGNING_KEY`（32バイトHex）から署名鍵を読み込む。
/// 未設定の場合はランダムに生成する（開発環境用）。
pub fn signing_key_from_env() -> anyhow::Result<Ed25519SigningKey> {
    match std::env::var("LEDGER_SIGNING_KEY") {
        Ok(key_hex) => Ok(tamperproof_crypto::signing_key_from_hex(&key_hex)?),
        Err(_) => {
            tracing::warn!("LEDGER_SIGNING_KEYが未設定です。ランダムキーを生成します（開発環境用）");
            Ok(Ed25519SigningKey::generate(&mut rand::rngs::OsRng))
        }
    }
}

pub(crate) fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
