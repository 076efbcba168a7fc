use crate::commands::CommandRule;
use crate::eval::{CommandContext, DenyReason};

/// A rule that unconditionally denies its program.
///
/// Registered once per name in the `[commands] deny` list.
pub struct DenyListRule;

impl CommandRule for DenyListRule {
    fn evaluate(&self, ctx: &CommandContext) -> Option<DenyReason> {
        Some(
            DenyReason::new(format!("{} destroys data irreversibly.", ctx.program))
                .with_hint("Ask the user to run it manually if it is truly needed."),
        )
    }
}
