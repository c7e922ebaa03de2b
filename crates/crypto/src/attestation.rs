//! # Ledgerアテステーション署名
//!
//! Ledgerが返す信頼確認結果に対するEd25519署名の生成と検証。
//! 署名対象は `AttestationSignTarget` のJSONシリアライズ。

use base64::Engine;
use tamperproof_types::AttestationSignTarget;

use crate::{b64, ed25519_sign, ed25519_verify, CryptoError, Ed25519Signature};
use crate::{Ed25519SigningKey, Ed25519VerifyingKey};

fn sign_bytes(target: &AttestationSignTarget) -> Result<Vec<u8>, CryptoError> {
    serde_json::to_vec(target).map_err(|e| CryptoError::SerializeError(e.to_string()))
}

/// 署名対象に署名し、Base64エンコードされた署名を返す。
pub fn sign_attestation(
    signing_key: &Ed25519SigningKey,
    target: &AttestationSignTarget,
) -> Result<String, CryptoError> {
    let bytes = sign_bytes(target)?;
    Ok(b64().encode(ed25519_sign(signing_key, &bytes).to_bytes()))
}

/// Base64エンコードされた署名を検証する。
pub fn verify_attestation(
    verifying_key: &Ed25519VerifyingKey,
    target: &AttestationSignTarget,
    signature_b64: &str,
) -> Result<(), CryptoError> {
    let sig_bytes = b64()
        .decode(signature_b64)
        .map_err(|e| CryptoError::DecodeError(format!("署名のBase64デコードに失敗: {e}")))?;
    let sig_arr: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| CryptoError::DecodeError("署名は64バイトである必要があります".to_string()))?;
    let signature = Ed25519Signature::from_bytes(&sig_arr);
    ed25519_verify(verifying_key, &sign_bytes(target)?, &signature)
}
