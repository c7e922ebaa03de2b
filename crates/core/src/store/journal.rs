//! # レコードジャーナル
//!
//! レコードの永続化形式は2つのファイルからなる。
//! - スナップショット（`records.json`）: ある時点の全レコード（登録順）
//! - ジャーナル（`records.log`）: スナップショット以降の変更を1行1件のJSONで追記
//!
//! 起動時はスナップショットにジャーナルを順に適用して復元する。
//! ジャーナルが一定件数を超えたらスナップショットを書き直してジャーナルを空にする。
//! 書き込み途中で途切れた行は読み込み時に読み飛ばす。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tamperproof_types::Document;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;

/// ジャーナルを何件追記したらスナップショットを書き直すか
pub(crate) const DEFAULT_COMPACT_EVERY: usize = 1024;

/// ジャーナルの1行。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum JournalEntry {
    Created { document: Document },
    Verified { id: String },
    Deleted { id: String },
}

/// ファイルから読み込んだ永続化状態。
pub(crate) struct Recovered {
    pub records: Vec<Document>,
    pub entries: Vec<JournalEntry>,
    /// ジャーナルが空でなかった（途切れた行のみの場合を含む）
    pub has_log: bool,
}

pub(crate) struct Journal {
    snapshot_path: PathBuf,
    log_path: PathBuf,
    /// 前回のコンパクション以降に追記した件数
    appended: usize,
    compact_every: usize,
    /// 直前の追記が途中で失敗した（行が途切れている可能性がある）
    torn: bool,
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::unavailable(
            &format!("読み込み失敗 ({})", path.display()),
            e,
        )),
    }
}

impl Journal {
    pub fn new(snapshot_path: PathBuf, compact_every: usize) -> Self {
        let log_path = snapshot_path.with_extension("log");
        Self {
            snapshot_path,
            log_path,
            appended: 0,
            compact_every: compact_every.max(1),
            torn: false,
        }
    }

    #[cfg(test)]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// スナップショットとジャーナルを読み込む。どちらも存在しなければ空。
    pub async fn recover(&self) -> Result<Recovered, StoreError> {
        let records = match read_optional(&self.snapshot_path).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::unavailable("スナップショットのパースに失敗", e))?,
            None => Vec::new(),
        };

        let mut entries = Vec::new();
        let mut has_log = false;
        if let Some(bytes) = read_optional(&self.log_path).await? {
            has_log = !bytes.is_empty();
            for (lineno, line) in bytes.split(|b| *b == b'\n').enumerate() {
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                match serde_json::from_slice::<JournalEntry>(line) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => tracing::warn!(
                        path = %self.log_path.display(),
                        line = lineno + 1,
                        error = %e,
                        "途切れたジャーナル行を読み飛ばします"
                    ),
                }
            }
        }

        Ok(Recovered {
            records,
            entries,
            has_log,
        })
    }

    /// 変更を1行追記する。
    pub async fn append(&mut self, entry: &JournalEntry) -> Result<(), StoreError> {
        let mut line = Vec::new();
        if self.torn {
            // 途切れた行の続きにならないよう改行を挟む
            line.push(b'\n');
        }
        serde_json::to_writer(&mut line, entry)
            .map_err(|e| StoreError::unavailable("ジャーナルのシリアライズに失敗", e))?;
        line.push(b'\n');

        if let Some(parent) = self.log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::unavailable("ディレクトリ作成失敗", e))?;
        }

        let written = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)
                .await?;
            file.write_all(&line).await?;
            file.flush().await
        }
        .await;

        match written {
            Ok(()) => {
                self.torn = false;
                self.appended += 1;
                Ok(())
            }
            Err(e) => {
                self.torn = true;
                Err(StoreError::unavailable("ジャーナル追記失敗", e))
            }
        }
    }

    pub fn needs_compaction(&self) -> bool {
        self.appended >= self.compact_every
    }

    /// スナップショットを一時ファイル経由で書き直し、ジャーナルを空にする。
    ///
    /// スナップショットの確定後、ジャーナルを空にする前に中断した場合でも、
    /// ジャーナルの再適用は冪等なので状態は変わらない。
    pub async fn compact(&mut self, records: &[Document]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(records)
            .map_err(|e| StoreError::unavailable("スナップショットのシリアライズに失敗", e))?;

        if let Some(parent) = self
            .snapshot_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::unavailable("ディレクトリ作成失敗", e))?;
        }
        let tmp = self.snapshot_path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::unavailable("スナップショット書き込み失敗", e))?;
        tokio::fs::rename(&tmp, &self.snapshot_path)
            .await
            .map_err(|e| StoreError::unavailable("スナップショット確定失敗", e))?;

        tokio::fs::write(&self.log_path, b"")
            .await
            .map_err(|e| StoreError::unavailable("ジャーナルの切り詰めに失敗", e))?;
        self.appended = 0;
        self.torn = false;

        tracing::debug!(
            path = %self.snapshot_path.display(),
            records = records.len(),
            "スナップショットを書き直しました"
        );
        Ok(())
    }
}
