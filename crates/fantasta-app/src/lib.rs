// Library root: re-exports all modules so integration tests and the binary
// share one public API.

pub mod api;
pub mod config;
pub mod db;
pub mod roster;
pub mod session;
pub mod store;
