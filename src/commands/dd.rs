use crate::commands::CommandRule;
use crate::eval::{CommandContext, DenyReason};

/// Device nodes that are safe to write to.
const HARMLESS_DEVICES: &[&str] = &["/dev/null", "/dev/zero", "/dev/stdout", "/dev/stderr"];

pub struct DdRule;

impl CommandRule for DdRule {
    fn evaluate(&self, ctx: &CommandContext) -> Option<DenyReason> {
        let target = ctx
            .lowered()
            .iter()
            .filter_map(|a| a.strip_prefix("of="))
            .find(|of| of.starts_with("/dev/") && !HARMLESS_DEVICES.contains(of))?;
        Some(
            DenyReason::new(format!("dd of={target} overwrites a device irreversibly."))
                .with_hint("Write to a regular file instead."),
        )
    }
}
