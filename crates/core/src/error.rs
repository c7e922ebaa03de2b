//! # ストアエラー型

/// ドキュメントストア・Blobストレージのエラー型。
///
/// 検索で何も見つからない場合は `NotFound`、格納媒体の障害は
/// `StorageUnavailable`。後者は当該リクエストにとって致命的だがプロセスは継続する。
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 指定されたID・ダイジェストのレコードが存在しない
    #[error("ドキュメントが見つかりません: {0}")]
    NotFound(String),
    /// 格納媒体（Blob・レコードスナップショット）にアクセスできない
    #[error("ストレージにアクセスできません: {0}")]
    StorageUnavailable(String),
}

impl StoreError {
    pub(crate) fn unavailable(context: &str, e: impl std::fmt::Display) -> Self {
        StoreError::StorageUnavailable(format!("{context}: {e}"))
    }
}
