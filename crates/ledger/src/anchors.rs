//! # アンカー台帳
//!
//! 登録済みダイジェストと最初の登録時刻（UNIX秒）。
//! パスを指定した場合は登録のたびにJSONファイルを一時ファイル経由で書き直し、
//! 起動時に読み戻す。ファイルへの書き込みが確定してからメモリに反映する。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;

use crate::error::LedgerError;

pub struct AnchorBook {
    path: Option<PathBuf>,
    entries: RwLock<HashMap<String, u64>>,
}

/// `anchor` の結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchored {
    pub anchored_at: u64,
    pub already_anchored: bool,
}

impl AnchorBook {
    /// プロセス内のみに保持する台帳（開発・テスト用）。
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// ファイルから台帳を開く。ファイルが存在しなければ空。
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let entries: HashMap<String, u64> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| anyhow::anyhow!("アンカー台帳のパースに失敗 ({}): {e}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(path = %path.display(), anchors = entries.len(), "アンカー台帳を開きました");
        Ok(Self {
            path: Some(path),
            entries: RwLock::new(entries),
        })
    }

    pub async fn get(&self, digest: &str) -> Option<u64> {
        self.entries.read().await.get(digest).copied()
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// ダイジェストを登録する。登録済みなら最初の登録時刻を返す。
    pub async fn anchor(&self, digest: &str, now: u64) -> Result<Anchored, LedgerError> {
        let mut entries = self.entries.write().await;
        if let Some(anchored_at) = entries.get(digest) {
            return Ok(Anchored {
                anchored_at: *anchored_at,
                already_anchored: true,
            });
        }

        if let Some(path) = &self.path {
            let mut next = entries.clone();
            next.insert(digest.to_string(), now);
            persist(path, &next).await?;
        }
        entries.insert(digest.to_string(), now);

        Ok(Anchored {
            anchored_at: now,
            already_anchored: false,
        })
    }
}

fn internal(path: &Path, context: &str, e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Internal(format!("{context} ({}): {e}", path.display()))
}

async fn persist(path: &Path, entries: &HashMap<String, u64>) -> Result<(), LedgerError> {
    let bytes = serde_json::to_vec(entries).map_err(|e| internal(path, "シリアライズ失敗", e))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| internal(path, "ディレクトリ作成失敗", e))?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|e| internal(path, "アンカー台帳の書き込み失敗", e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| internal(path, "アンカー台帳の確定失敗", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[tokio::test]
    async fn test_anchor_keeps_first_timestamp() {
        let book = AnchorBook::in_memory();
        let first = book.anchor(DIGEST, 100).await.unwrap();
        let second = book.anchor(DIGEST, 200).await.unwrap();

        assert!(!first.already_anchored);
        assert!(second.already_anchored);
        assert_eq!(second.anchored_at, 100);
        assert_eq!(book.get(DIGEST).await, Some(100));
        assert_eq!(book.count().await, 1);
    }

    /// 再起動後も登録済みダイジェストが残る
    #[tokio::test]
    async fn test_anchors_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger/anchors.json");

        let book = AnchorBook::open(&path).await.unwrap();
        book.anchor(DIGEST, 100).await.unwrap();
        drop(book);

        let reopened = AnchorBook::open(&path).await.unwrap();
        assert_eq!(reopened.get(DIGEST).await, Some(100));
        assert!(reopened.anchor(DIGEST, 300).await.unwrap().already_anchored);
    }

    /// 書き込めない場合は登録せずにエラーを返す
    #[tokio::test]
    async fn test_persist_failure_leaves_no_anchor() {
        let dir = tempfile::tempdir().unwrap();
        let book = AnchorBook::open(dir.path().join("sub/anchors.json"))
            .await
            .unwrap();
        // 親ディレクトリの位置にファイルを置き、書き込めなくする
        std::fs::write(dir.path().join("sub"), b"x").unwrap();

        assert!(matches!(
            book.anchor(DIGEST, 100).await,
            Err(LedgerError::Internal(_))
        ));
        assert_eq!(book.get(DIGEST).await, None);
    }
}
