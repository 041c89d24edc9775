#![forbid(unsafe_code)]
//! Conformance Test Harness for the Erbsland Configuration Language
//!
//! This crate validates third-party ELCL parser implementations against a
//! corpus of input documents and expected outcomes. The parser under test
//! is wrapped by an external "adapter" executable; the harness invokes it
//! per input file, decodes its verdict, compares it with the canonical
//! expectation, and scores the result across the whole corpus.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Per-case failures are not errors of the run**: anything that goes wrong while executing a single test case
//!   (adapter timeout, protocol violation, undecodable output) is converted into a failed comparison for that case;
//!   only setup and corpus integrity problems abort the process.

pub mod adapter;
pub mod cli;
pub mod compare;
pub mod corpus;
pub mod error;
pub mod outcome;
pub mod report;
pub mod runner;
pub mod version;

pub use adapter::{ADAPTER_TIMEOUT, AdapterError, AdapterRunner};
pub use compare::{ComparisonResult, ComparisonStatus, compare};
pub use corpus::{CorpusError, TestCase, Tier};
pub use error::HarnessError;
pub use outcome::codec::DecodeError;
pub use outcome::{ErrorClass, Outcome, Value};
pub use report::ReportFormat;
pub use runner::RunSummary;
