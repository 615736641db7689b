#![doc(test(attr(deny(warnings))))]

//! Welth Core provides the budget tracking, transaction ledger, and
//! budget-alert evaluation primitives behind the Welth personal finance app.

pub mod alerts;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod notify;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Welth Core tracing initialized.");
    });
}
