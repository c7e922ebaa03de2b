//! # TamperProof CLI
//!
//! Gatewayへのアップロード・検証・信頼確認をコマンドラインから行う。
//! `digest` のみローカルで完結し、Gatewayには接続しない。
//! `anchor` はGatewayを経由せずLedgerに直接登録する。

mod client;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use client::{GatewayClient, LedgerClient};

#[derive(Parser)]
#[command(name = "tamperproof-cli")]
#[command(about = "TamperProof document fingerprinting client", long_about = None)]
struct Cli {
    /// GatewayのベースURL
    #[arg(long, env = "TAMPERPROOF_GATEWAY", default_value = "http://localhost:8002")]
    gateway: String,

    /// LedgerのベースURL（`anchor` で使用）
    #[arg(long, env = "TAMPERPROOF_LEDGER", default_value = "http://localhost:8003")]
    ledger: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// ファイルのコンテンツダイジェストを表示する（ローカル計算）
    Digest { file: PathBuf },
    /// ファイルをアップロードする
    Upload { file: PathBuf },
    /// ファイルの内容で登録状況を照会する
    Verify { file: PathBuf },
    /// ダイジェストで登録状況を照会する
    VerifyHash { digest: String },
    /// ドキュメントを検証済みにする
    MarkVerified { id: String },
    /// 登録件数の集計を表示する
    Stats,
    /// ローカル状態とLedgerの信頼確認を突き合わせる
    Confirm {
        digest: String,
        /// Ledgerが応答しない場合にエラーとする
        #[arg(long)]
        strict: bool,
    },
    /// ダイジェストをLedgerに登録する
    Anchor { digest: String },
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let gateway = GatewayClient::new(&cli.gateway);

    match cli.command {
        Command::Digest { file } => {
            let bytes = client::read_file(&file).await?;
            println!("{}", tamperproof_crypto::digest(&bytes));
        }
        Command::Upload { file } => {
            let bytes = client::read_file(&file).await?;
            let filename = client::upload_filename(&file);
            print_json(&gateway.upload(&filename, bytes).await?)?;
        }
        Command::Verify { file } => {
            let bytes = client::read_file(&file).await?;
            print_json(&gateway.verify_file(bytes).await?)?;
        }
        Command::VerifyHash { digest } => {
            print_json(&gateway.verify_hash(&digest).await?)?;
        }
        Command::MarkVerified { id } => {
            println!("{}", gateway.mark_verified(&id).await?.message);
        }
        Command::Stats => {
            print_json(&gateway.stats().await?)?;
        }
        Command::Confirm { digest, strict } => {
            print_json(&gateway.trust_confirm(&digest, strict).await?)?;
        }
        Command::Anchor { digest } => {
            print_json(&LedgerClient::new(&cli.ledger).anchor(&digest).await?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["tamperproof-cli", "--gateway", "http://gw:1", "stats"])
            .unwrap();
        assert_eq!(cli.gateway, "http://gw:1");
        assert!(matches!(cli.command, Command::Stats));

        let cli = Cli::try_parse_from(["tamperproof-cli", "confirm", "abc", "--strict"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Confirm { ref digest, strict: true } if digest == "abc"
        ));

        let cli = Cli::try_parse_from(["tamperproof-cli", "verify-hash", "abc"]).unwrap();
        assert!(matches!(cli.command, Command::VerifyHash { .. }));

        let cli = Cli::try_parse_from([
            "tamperproof-cli",
            "--ledger",
            "http://ledger:9",
            "anchor",
            "abc",
        ])
        .unwrap();
        assert_eq!(cli.ledger, "http://ledger:9");
        assert!(matches!(cli.command, Command::Anchor { ref digest } if digest == "abc"));
    }

    #[test]
    fn test_missing_argument_rejected() {
        assert!(Cli::try_parse_from(["tamperproof-cli", "upload"]).is_err());
    }
}
