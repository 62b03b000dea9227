//! # agon-core
//!
//! Foundation types for the agon argument-graph client.
//!
//! This crate provides the shared vocabulary the other agon crates depend on:
//!
//! - **Identifiers**: [`StatementId`] — the judge-assigned `(sequence,
//!   generation)` pair identifying a statement node
//! - **Statements**: [`StatementState`] proof status, the wire-level
//!   [`StatementDto`] row, and the normalized [`Statement`] node
//! - **Errors**: [`AgonError`] hierarchy via `thiserror`
//! - **Backoff**: [`RetryConfig`] and the dial-backoff math
//!
//! No I/O happens here; everything is sync and portable.

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod ids;
pub mod retry;
pub mod statement;

pub use errors::{AgonError, CodecError, TransportError};
pub use ids::{ParseStatementIdError, StatementId};
pub use retry::RetryConfig;
pub use statement::{Statement, StatementDto, StatementState};
