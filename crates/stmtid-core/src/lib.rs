//! stmtid core library: build-time statement ids for JS/TS logging calls.
//!
//! The `instrument` module walks a project's sources, gives every logging
//! call site a stable id derived from its `file:line`, and injects that id
//! into the call's arguments. The `manifest` module exports the collected
//! statements, and the `sync` module pushes them to (or checks them against)
//! the remote statement registry. `runtime_logger` is the receiving end of
//! the injected ids.

pub mod config;
pub mod errors;
pub mod instrument;
pub mod manifest;
pub mod models;
pub mod runtime_logger;
pub mod sync;
