//! # 証明アーティファクト生成
//!
//! ダイジェストから、スキャン可能なコードにエンコードする検証参照
//! （`{verification_base}/{digest}`）と、外部QR描画サービスのURLを組み立てる。
//! 状態は持たない。

use reqwest::Url;
use tamperproof_types::ProofArtifact;

/// QR描画サービスに要求する画像サイズ
const QR_SIZE: &str = "150x150";

#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("証明アーティファクトの入力が不正です: {0}")]
    InvalidInput(String),
}

/// 証明アーティファクト生成器。
#[derive(Debug, Clone)]
pub struct ProofArtifactGenerator {
    verification_base: String,
    render_base: Url,
}

impl ProofArtifactGenerator {
    /// # 引数
    /// - `verification_base`: 検証ページのベースURL（例: "https://example.com/verify"）
    /// - `render_base`: QR描画サービスのURL（例: "https://api.qrserver.com/v1/create-qr-code/"）
    pub fn new(verification_base: &str, render_base: &str) -> Result<Self, ProofError> {
        let verification_base = verification_base.trim_end_matches('/');
        if verification_base.is_empty() {
            return Err(ProofError::InvalidInput(
                "検証ベースURLが空です".to_string(),
            ));
        }
        let render_base = Url::parse(render_base).map_err(|e| {
            ProofError::InvalidInput(format!("QR描画URLが不正です ({render_base}): {e}"))
        })?;
        Ok(Self {
            verification_base: verification_base.to_string(),
            render_base,
        })
    }

    /// ダイジェストから証明アーティファクトを生成する。
    /// ダイジェストが空または形式不正の場合は `InvalidInput`。
    pub fn generate(&self, digest: &str) -> Result<ProofArtifact, ProofError> {
        if digest.is_empty() {
            return Err(ProofError::InvalidInput("ダイジェストが空です".to_string()));
        }
        if !tamperproof_crypto::is_valid_digest(digest) {
            return Err(ProofError::InvalidInput(format!(
                "ダイジェストの形式が不正です: {digest}"
            )));
        }

        let payload = format!("{}/{digest}", self.verification_base);
        let mut render_url = self.render_base.clone();
        render_url
            .query_pairs_mut()
            .append_pair("size", QR_SIZE)
            .append_pair("data", &payload);

        Ok(ProofArtifact {
            digest: digest.to_string(),
            payload,
            render_url: render_url.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_DIGEST: &str =
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn generator() -> ProofArtifactGenerator {
        ProofArtifactGenerator::new(
            "https://verify.example.com/verify/",
            "https://api.qrserver.com/v1/create-qr-code/",
        )
        .unwrap()
    }

    #[test]
    fn test_generate_payload_and_render_url() {
        let artifact = generator().generate(HELLO_DIGEST).unwrap();

        assert_eq!(artifact.digest, HELLO_DIGEST);
        assert_eq!(
            artifact.payload,
            format!("https://verify.example.com/verify/{HELLO_DIGEST}")
        );

        let url = Url::parse(&artifact.render_url).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("size".to_string(), "150x150".to_string()),
                ("data".to_string(), artifact.payload.clone()),
            ]
        );
    }

    #[test]
    fn test_generate_is_pure() {
        let g = generator();
        assert_eq!(g.generate(HELLO_DIGEST).unwrap(), g.generate(HELLO_DIGEST).unwrap());
    }

    #[test]
    fn test_rejects_empty_or_malformed_digest() {
        let g = generator();
        assert!(matches!(g.generate(""), Err(ProofError::InvalidInput(_))));
        assert!(matches!(g.generate("abc"), Err(ProofError::InvalidInput(_))));
        assert!(matches!(
            g.generate(&HELLO_DIGEST.to_uppercase()),
            Err(ProofError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(ProofArtifactGenerator::new("", "https://qr.example.com").is_err());
        assert!(ProofArtifactGenerator::new("https://v.example.com", "not a url").is_err());
    }
}
