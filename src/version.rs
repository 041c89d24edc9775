//! Harness version information.
//!
//! This module exposes the harness version and the supported ELCL language
//! version as single constants so all subsystems (CLI, adapter client,
//! reporting) agree on the same values.

/// The conformance harness version string (for example, `0.1.0`).
pub const HARNESS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The ELCL language version this harness can test.
///
/// Passed to the adapter as `--version <value>`; currently the only
/// accepted value on the CLI as well.
pub const SUPPORTED_LANG_VERSION: &str = "1.0";
