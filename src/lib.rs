// src/lib.rs

//! ptgen library: catalog extractors, description templates and the
//! `/api/gen` dispatcher.

pub mod dispatch;
pub mod error;
pub mod format;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(feature = "lambda")]
pub mod lambda;
#[cfg(feature = "server")]
pub mod server;
