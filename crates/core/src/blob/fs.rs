//! # ファイルシステムBlobストレージ
//!
//! `{root}/{key}` にバイト列を保存する。書き込みは一時ファイルに行い、
//! 完了後にrenameで確定させる。

use std::path::{Component, Path, PathBuf};

use super::BlobStore;
use crate::error::StoreError;

/// ローカルディレクトリにバイト列を保存するBlobストレージ。
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// 新しいFsBlobStoreを作成する。ディレクトリは初回書き込み時に作成される。
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// キーをルート配下のパスに変換する。
    /// `..` や絶対パスを含むキーは拒否する。
    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(key);
        let safe = !key.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StoreError::StorageUnavailable(format!(
                "不正なストレージキー: {key}"
            )));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait::async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::unavailable("ディレクトリ作成失敗", e))?;
        }

        let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::unavailable("Blob書き込み失敗", e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::unavailable("Blob確定失敗", e));
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::unavailable("Blob読み込み失敗", e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::unavailable("Blob削除失敗", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.put("uploads/abc", b"hello").await.unwrap();
        assert_eq!(store.get("uploads/abc").await.unwrap().unwrap(), b"hello");

        // 一時ファイルが残っていないこと
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("uploads"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("abc")]);

        store.delete("uploads/abc").await.unwrap();
        assert!(store.get("uploads/abc").await.unwrap().is_none());
        // 2回目の削除も成功扱い
        store.delete("uploads/abc").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        for key in ["", "../outside", "/etc/passwd", "uploads/../../x"] {
            assert!(
                matches!(store.put(key, b"x").await, Err(StoreError::StorageUnavailable(_))),
                "key {key:?} should be rejected"
            );
        }
    }
}
