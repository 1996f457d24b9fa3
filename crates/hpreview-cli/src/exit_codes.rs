//! Standard exit codes for the `hpreview` binary (§6).

#![allow(dead_code)]

/// Success — no DANGER-blocking policy outcome, no fatal failure.
pub const SUCCESS: i32 = 0;

/// A `RunError` in the primary path, or `crd_report.policy_result.blocked`.
pub const ISSUES_FOUND: i32 = 1;

/// Invalid CLI arguments, following sysexits.h's `EX_USAGE` rather than
/// collapsing into the generic code above — `clap` already distinguishes
/// this failure mode, so the binary preserves it.
pub const USAGE_ERROR: i32 = 64;
