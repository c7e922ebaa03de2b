//! # Ledgerエンドポイント

pub mod anchor;
pub mod confirm;
pub mod generate_hash;
pub mod ledger_info;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::routing::{get, post};

pub use anchor::handle_anchor;
pub use confirm::handle_confirm;
pub use generate_hash::handle_generate_hash;
pub use ledger_info::handle_ledger_info;

use crate::config::LedgerState;

pub fn router(state: Arc<LedgerState>) -> axum::Router {
    axum::Router::new()
        .route("/anchor", post(handle_anchor))
        .route("/confirm", post(handle_confirm))
        .route("/generate-hash", post(handle_generate_hash))
        .route("/.well-known/ledger-info", get(handle_ledger_info))
        .with_state(state)
}
