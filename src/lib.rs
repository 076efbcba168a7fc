//! safety-net: a PreToolUse hook for Claude Code that blocks destructive commands.
//!
//! This crate analyzes shell commands before they run and returns either
//! [`eval::Decision::Allow`] or [`eval::Decision::Deny`] with a redacted reason.
//! Commands are tokenized with shell quoting rules, wrappers such as `sudo`,
//! `busybox` or `bash -c` are unwound (recursively, for command strings
//! embedded in arguments), and each resulting command is checked against a
//! [`RuleRegistry`](crate::eval::RuleRegistry) built from configuration.
//!
//! # Architecture
//!
//! - **[`parse`]**: tokenizer, wrapper canonicalization, embedded-command extraction.
//! - **[`eval`]**: rule registry, decision loop, fail-open / strict policy.
//! - **[`commands`]**: analysis rules (git, find, rm, dd, deny list).
//! - **[`redact`]**: credential scrubbing for deny reasons and logs.
//! - **[`hook`]**: Claude Code JSON request/response handling.
//! - **[`config`]**: embedded defaults + user overlay merge.
//! - **[`logging`]**: decision log at `~/.local/share/safety-net/decisions.log`.

/// Analysis rule trait and per-program implementations.
pub mod commands;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Decision engine: registry, worklist, policy, command context.
pub mod eval;
/// Hook protocol: request parsing and deny rendering.
pub mod hook;
/// File-based decision logging.
pub mod logging;
/// Shell parsing: tokenizer, canonicalizer, embedded commands.
pub mod parse;
/// Secret redaction.
pub mod redact;

use eval::{Decision, Policy};

/// Build the registry from default config and decide on a command string.
///
/// This is the main entry point for tests and simple usage.
/// The hook binary builds the registry from the user's merged config instead.
pub fn decide(command: &str, policy: Policy) -> Decision {
    let config = config::Config::default_config();
    let registry = eval::RuleRegistry::from_config(&config);
    registry.decide(command, policy)
}
