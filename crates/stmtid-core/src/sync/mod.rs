//! Clients that push the manifest to, and check ids against, the remote
//! statement registry.

pub mod api;
pub mod client;
pub mod lookup;
pub mod report;
pub mod telemetry;
pub mod upload;

#[cfg(test)]
pub(crate) mod fakes;
