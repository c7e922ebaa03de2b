//! # HTTP 信頼確認クライアント
//!
//! `POST {endpoint}/anchor` でダイジェストを登録し、`POST {endpoint}/confirm` で
//! Ledgerの判定を中継する。
//! Ledgerの公開鍵が設定されている場合はアテステーション署名を検証する。

use std::time::Duration;

use serde::de::DeserializeOwned;
use tamperproof_crypto::Ed25519VerifyingKey;
use tamperproof_types::{AnchorResponse, AttestationSignTarget, ConfirmResponse, DigestRequest};

use super::{TrustConfirmer, TrustError, TrustVerdict};

/// HTTP経由の信頼確認クライアント。
pub struct HttpTrustClient {
    /// LedgerのベースURL
    endpoint: String,
    /// タイムアウト設定済みHTTPクライアント
    http_client: reqwest::Client,
    /// Ledgerの署名検証用公開鍵。Noneの場合は署名検証をスキップ（開発環境用）
    ledger_pubkey: Option<Ed25519VerifyingKey>,
}

impl HttpTrustClient {
    /// # 引数
    /// - `endpoint`: LedgerのベースURL（例: "http://localhost:8003"）
    /// - `timeout`: 1リクエストあたりの上限時間
    /// - `ledger_pubkey`: アテステーション署名の検証鍵
    pub fn new(
        endpoint: &str,
        timeout: Duration,
        ledger_pubkey: Option<Ed25519VerifyingKey>,
    ) -> Result<Self, TrustError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrustError::UpstreamUnavailable(format!("HTTPクライアント構築失敗: {e}")))?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http_client,
            ledger_pubkey,
        })
    }

    /// 署名を検証し、検証できない判定は `attested = false` に格下げする。
    fn check_signature(&self, response: ConfirmResponse) -> TrustVerdict {
        let Some(pubkey) = &self.ledger_pubkey else {
            return TrustVerdict {
                attested: response.attested,
                detail: response.detail,
            };
        };
        let Some(signature) = &response.signature else {
            return TrustVerdict {
                attested: false,
                detail: format!("Ledgerの応答に署名がありません: {}", response.detail),
            };
        };

        let target = AttestationSignTarget {
            digest: response.digest.clone(),
            attested: response.attested,
            anchored_at: response.anchored_at,
        };
        match tamperproof_crypto::attestation::verify_attestation(pubkey, &target, signature) {
            Ok(()) => TrustVerdict {
                attested: response.attested,
                detail: response.detail,
            },
            Err(e) => {
                tracing::warn!(digest = %response.digest, error = %e, "Ledger署名の検証に失敗");
                TrustVerdict {
                    attested: false,
                    detail: format!("Ledger署名の検証に失敗: {e}"),
                }
            }
        }
    }

    /// `POST {endpoint}{path}` にダイジェストを送り、成功レスポンスをデコードする。
    async fn post_digest<T: DeserializeOwned>(
        &self,
        path: &str,
        digest: &str,
    ) -> Result<T, TrustError> {
        let url = format!("{}{path}", self.endpoint);
        let response = self
            .http_client
            .post(&url)
            .json(&DigestRequest {
                digest: digest.to_string(),
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TrustError::UpstreamUnavailable(format!("Ledgerがタイムアウトしました ({url})"))
                } else {
                    TrustError::UpstreamUnavailable(format!("HTTP送信失敗 ({url}): {e}"))
                }
            })?;

        let status = response.status();
        let response_body = response.text().await.map_err(|e| {
            TrustError::UpstreamUnavailable(format!("レスポンス読み取り失敗: {e}"))
        })?;

        if !status.is_success() {
            return Err(TrustError::UpstreamUnavailable(format!(
                "Ledgerがエラーを返しました: HTTP {} - {}",
                status, response_body
            )));
        }

        serde_json::from_str(&response_body).map_err(|e| {
            TrustError::UpstreamUnavailable(format!("レスポンスのパースに失敗: {e}"))
        })
    }
}

fn check_digest(expected: &str, answered: &str) -> Result<(), TrustError> {
    if answered != expected {
        return Err(TrustError::UpstreamUnavailable(format!(
            "Ledgerが別のダイジェストに応答しました: {answered}"
        )));
    }
    Ok(())
}

#[async_trait::async_trait]
impl TrustConfirmer for HttpTrustClient {
    async fn anchor(&self, digest: &str) -> Result<(), TrustError> {
        let anchored: AnchorResponse = self.post_digest("/anchor", digest).await?;
        check_digest(digest, &anchored.digest)?;
        tracing::debug!(
            digest = %digest,
            anchored_at = anchored.anchored_at,
            already_anchored = anchored.already_anchored,
            "Ledgerにダイジェストを登録しました"
        );
        Ok(())
    }

    async fn confirm(&self, digest: &str) -> Result<TrustVerdict, TrustError> {
        let confirm: ConfirmResponse = self.post_digest("/confirm", digest).await?;
        check_digest(digest, &confirm.digest)?;
        Ok(self.check_signature(confirm))
    }
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use tamperproof_crypto::Ed25519SigningKey;

    use super::*;
    use crate::endpoints::test_helpers::start_mock_server;

    const HELLO_DIGEST: &str =
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn signed_response(key: &Ed25519SigningKey, digest: &str, attested: bool) -> ConfirmResponse {
        let target = AttestationSignTarget {
            digest: digest.to_string(),
            attested,
            anchored_at: Some(1_700_000_000),
        };
        ConfirmResponse {
            digest: digest.to_string(),
            attested,
            detail: "anchored".to_string(),
            anchored_at: target.anchored_at,
            signature: Some(
                tamperproof_crypto::attestation::sign_attestation(key, &target).unwrap(),
            ),
        }
    }

    #[tokio::test]
    async fn test_confirm_relays_verdict() {
        let app = axum::Router::new()
            .route(
                "/anchor",
                axum::routing::post(|Json(body): Json<DigestRequest>| async move {
                    Json(AnchorResponse {
                        digest: body.digest,
                        anchored_at: 1_700_000_000,
                        already_anchored: false,
                    })
                }),
            )
            .route(
                "/confirm",
                axum::routing::post(|Json(body): Json<DigestRequest>| async move {
                    Json(ConfirmResponse {
                        digest: body.digest,
                        attested: true,
                        detail: "anchored at 1700000000".to_string(),
                        anchored_at: Some(1_700_000_000),
                        signature: None,
                    })
                }),
            );
        let endpoint = start_mock_server(app).await;

        let client = HttpTrustClient::new(&endpoint, Duration::from_secs(5), None).unwrap();
        client.anchor(HELLO_DIGEST).await.unwrap();
        let verdict = client.confirm(HELLO_DIGEST).await.unwrap();
        assert!(verdict.attested);
        assert_eq!(verdict.detail, "anchored at 1700000000");
    }

    #[tokio::test]
    async fn test_confirm_timeout_is_upstream_unavailable() {
        let app = axum::Router::new().route(
            "/confirm",
            axum::routing::post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        );
        let endpoint = start_mock_server(app).await;

        let client = HttpTrustClient::new(&endpoint, Duration::from_millis(200), None).unwrap();
        let started = std::time::Instant::now();
        let result = client.confirm(HELLO_DIGEST).await;

        assert!(matches!(result, Err(TrustError::UpstreamUnavailable(_))));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_confirm_error_status_is_upstream_unavailable() {
        let app = axum::Router::new().route(
            "/confirm",
            axum::routing::post(|| async {
                (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "ledger down")
            }),
        );
        let endpoint = start_mock_server(app).await;

        let client = HttpTrustClient::new(&endpoint, Duration::from_secs(5), None).unwrap();
        assert!(matches!(
            client.confirm(HELLO_DIGEST).await,
            Err(TrustError::UpstreamUnavailable(_))
        ));
        // /anchor を持たないLedger（404）も同様
        assert!(matches!(
            client.anchor(HELLO_DIGEST).await,
            Err(TrustError::UpstreamUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_confirm_unreachable_is_upstream_unavailable() {
        // バインド後すぐに解放したポートには誰も待ち受けていない
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = HttpTrustClient::new(
            &format!("http://127.0.0.1:{port}"),
            Duration::from_secs(2),
            None,
        )
        .unwrap();
        assert!(matches!(
            client.confirm(HELLO_DIGEST).await,
            Err(TrustError::UpstreamUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_confirm_verifies_ledger_signature() {
        let ledger_key = Ed25519SigningKey::generate(&mut rand::rngs::OsRng);
        let forger_key = Ed25519SigningKey::generate(&mut rand::rngs::OsRng);

        let genuine = signed_response(&ledger_key, HELLO_DIGEST, true);
        let app = axum::Router::new().route(
            "/confirm",
            axum::routing::post(move || {
                let r = genuine.clone();
                async move { Json(r) }
            }),
        );
        let endpoint = start_mock_server(app).await;
        let client = HttpTrustClient::new(
            &endpoint,
            Duration::from_secs(5),
            Some(ledger_key.verifying_key()),
        )
        .unwrap();
        assert!(client.confirm(HELLO_DIGEST).await.unwrap().attested);

        // 別の鍵で署名された応答は attested=false に格下げされる
        let forged = signed_response(&forger_key, HELLO_DIGEST, true);
        let app = axum::Router::new().route(
            "/confirm",
            axum::routing::post(move || {
                let r = forged.clone();
                async move { Json(r) }
            }),
        );
        let endpoint = start_mock_server(app).await;
        let client = HttpTrustClient::new(
            &endpoint,
            Duration::from_secs(5),
            Some(ledger_key.verifying_key()),
        )
        .unwrap();
        let verdict = client.confirm(HELLO_DIGEST).await.unwrap();
        assert!(!verdict.attested);
    }
}
