//! Analysis rules: per-program logic for spotting destructive invocations.
//!
//! Each program with dangerous modes (git, find, rm, dd) has its own
//! `CommandRule`. Programs that are destructive by nature are handled by
//! `DenyListRule`, driven by the `[commands] deny` config list. Rules are
//! registered by name in [`RuleRegistry`](crate::eval::RuleRegistry), which
//! keeps the full rule set in one explicit table.

/// Disk-overwrite detection for `dd of=/dev/...`.
pub mod dd;
/// Unconditional deny for inherently destructive programs (shred, mkfs, ...).
pub mod deny;
/// `find -delete` detection, ignoring primary values and `-exec` spans.
pub mod find;
/// Subcommand-aware git analysis: discarded changes, force pushes, dropped stashes.
pub mod git;
/// Recursive force-remove of root, home, or paths outside safe roots.
pub mod rm;

use crate::eval::{CommandContext, DenyReason};

/// Trait for analysis rules.
///
/// A rule is a pure function of the canonical command: it returns a deny
/// reason when the invocation is destructive and `None` otherwise.
pub trait CommandRule: Send + Sync {
    fn evaluate(&self, ctx: &CommandContext) -> Option<DenyReason>;
}
