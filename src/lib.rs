//! coderelay - HTTP bridge for a stateful AI coding engine.
//!
//! The engine itself is a black box: a synchronous, non-reentrant object
//! that mutates conversation state and files on disk each time it is
//! invoked. This crate multiplexes many HTTP clients onto such engines by
//! giving each client an isolated session with an exclusive turn slot,
//! and by forwarding the engine's print-style progress output as typed
//! events over SSE or as an aggregated buffered response.

pub mod api;
pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod server;
pub mod session;
pub mod turn;
