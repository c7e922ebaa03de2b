//! # 検証状態遷移
//!
//! 状態は `Pending` と `Verified` の2つのみ。遷移は `Pending → Verified` の一方向で、
//! 明示的なID指定の検証操作によってのみ発生する。`Verified` は終端状態。
//! 状態はレコードの `verified` フィールドそのものであり、別エンティティは持たない。

use tamperproof_types::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    Pending,
    Verified,
}

/// `mark_verified` 適用結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// `Pending → Verified` に遷移した
    Transitioned,
    /// 既に `Verified` だった（何も変更しない）
    AlreadyVerified,
}

impl VerificationState {
    /// レコードの現在の状態。
    pub fn of(doc: &Document) -> Self {
        if doc.verified {
            VerificationState::Verified
        } else {
            VerificationState::Pending
        }
    }
}

/// レコードを `Verified` に遷移させる。冪等。
/// `verified` を `false` に戻す操作は存在しない。
pub fn mark_verified(doc: &mut Document) -> Transition {
    match VerificationState::of(doc) {
        VerificationState::Pending => {
            doc.verified = true;
            Transition::Transitioned
        }
        VerificationState::Verified => Transition::AlreadyVerified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_doc() -> Document {
        Document {
            id: "doc-1".to_string(),
            filename: "a.txt".to_string(),
            digest: tamperproof_crypto::digest(b"hello"),
            upload_timestamp: 0,
            verified: false,
            storage_reference: "uploads/doc-1".to_string(),
        }
    }

    #[test]
    fn test_new_document_is_pending() {
        assert_eq!(VerificationState::of(&pending_doc()), VerificationState::Pending);
    }

    #[test]
    fn test_mark_verified_is_idempotent() {
        let mut doc = pending_doc();
        assert_eq!(mark_verified(&mut doc), Transition::Transitioned);
        assert_eq!(VerificationState::of(&doc), VerificationState::Verified);
        assert_eq!(mark_verified(&mut doc), Transition::AlreadyVerified);
        assert!(doc.verified);
    }
}
