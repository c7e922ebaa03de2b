//! # TamperProof 暗号処理
//!
//! コンテンツアドレッシングとLedgerアテステーション署名を提供する。
//!
//! ## 暗号アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | コンテンツダイジェスト | SHA-256 (小文字Hex) |
//! | アテステーション署名 | Ed25519 |

pub mod attestation;

use base58::{FromBase58, ToBase58};
use ed25519_dalek::{Signer, Verifier};
use sha2::{Digest, Sha256};

pub use ed25519_dalek::{
    Signature as Ed25519Signature, SigningKey as Ed25519SigningKey,
    VerifyingKey as Ed25519VerifyingKey,
};

/// ダイジェストのHex文字数（SHA-256 = 32バイト）
pub const DIGEST_HEX_LEN: usize = 64;

/// 暗号処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Ed25519署名検証エラー
    #[error("Ed25519署名検証に失敗しました")]
    SignatureVerifyError,
    /// 鍵・署名のデコードエラー
    #[error("デコードに失敗しました: {0}")]
    DecodeError(String),
    /// 署名対象のシリアライズエラー
    #[error("署名対象のシリアライズに失敗しました: {0}")]
    SerializeError(String),
}

/// Base64エンジン（Standard）
pub fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// SHA-256ハッシュ計算。
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// バイト列のコンテンツダイジェストを計算する。
///
/// 純粋関数。空のバイト列に対しても定義される。
pub fn digest(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// ダイジェスト文字列の形式（小文字Hex 64文字）を検査する。
pub fn is_valid_digest(s: &str) -> bool {
    s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Ed25519による署名。
pub fn ed25519_sign(signing_key: &Ed25519SigningKey, message: &[u8]) -> Ed25519Signature {
    signing_key.sign(message)
}

/// Ed25519による署名検証。
pub fn ed25519_verify(
    verifying_key: &Ed25519VerifyingKey,
    message: &[u8],
    signature: &Ed25519Signature,
) -> Result<(), CryptoError> {
    verifying_key
        .verify(message, signature)
        .map_err(|_| CryptoError::SignatureVerifyError)
}

/// 32バイトのHex文字列からEd25519秘密鍵を復元する。
pub fn signing_key_from_hex(key_hex: &str) -> Result<Ed25519SigningKey, CryptoError> {
    let bytes = hex::decode(key_hex.trim())
        .map_err(|e| CryptoError::DecodeError(format!("秘密鍵のHexデコードに失敗: {e}")))?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::DecodeError("秘密鍵は32バイトである必要があります".to_string()))?;
    Ok(Ed25519SigningKey::from_bytes(&arr))
}

/// 公開鍵をBase58文字列にエンコードする。
pub fn verifying_key_to_base58(key: &Ed25519VerifyingKey) -> String {
    key.to_bytes().to_base58()
}

/// Base58文字列からEd25519公開鍵を復元する。
pub fn verifying_key_from_base58(s: &str) -> Result<Ed25519VerifyingKey, CryptoError> {
    let bytes = s
        .trim()
        .from_base58()
        .map_err(|e| CryptoError::DecodeError(format!("公開鍵のBase58デコードに失敗: {e:?}")))?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::DecodeError("公開鍵は32バイトである必要があります".to_string()))?;
    Ed25519VerifyingKey::from_bytes(&arr)
        .map_err(|e| CryptoError::DecodeError(format!("不正な公開鍵: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_hello() {
        assert_eq!(
            digest(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_digest_empty_input() {
        assert_eq!(
            digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_deterministic_and_distinct() {
        let fixtures: [&[u8]; 4] = [b"hello", b"hello ", b"Hello", b"\x00\x01\x02"];
        for f in fixtures {
            assert_eq!(digest(f), digest(&f.to_vec()));
            assert!(is_valid_digest(&digest(f)));
        }
        for (i, a) in fixtures.iter().enumerate() {
            for b in fixtures.iter().skip(i + 1) {
                assert_ne!(digest(a), digest(b));
            }
        }
    }

    #[test]
    fn test_is_valid_digest() {
        assert!(is_valid_digest(&"a".repeat(64)));
        assert!(!is_valid_digest(""));
        assert!(!is_valid_digest(&"a".repeat(63)));
        assert!(!is_valid_digest(&"A".repeat(64)));
        assert!(!is_valid_digest(&"g".repeat(64)));
    }

    #[test]
    fn test_key_encoding_roundtrip() {
        let signing_key = Ed25519SigningKey::generate(&mut rand::rngs::OsRng);
        let restored = signing_key_from_hex(&hex::encode(signing_key.to_bytes())).unwrap();
        assert_eq!(restored.to_bytes(), signing_key.to_bytes());

        let vk = signing_key.verifying_key();
        let decoded = verifying_key_from_base58(&verifying_key_to_base58(&vk)).unwrap();
        assert_eq!(decoded, vk);

        assert!(signing_key_from_hex("abcd").is_err());
        assert!(verifying_key_from_base58("0OIl").is_err());
    }
}
