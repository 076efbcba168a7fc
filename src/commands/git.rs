use crate::commands::CommandRule;
use crate::eval::{CommandContext, DenyReason};

/// Global options that consume the next word (`git -C repo status`).
const GLOBAL_WITH_VALUE: &[&str] = &[
    "-c",
    "-C",
    "--exec-path",
    "--git-dir",
    "--namespace",
    "--super-prefix",
    "--work-tree",
];

pub struct GitRule;

impl GitRule {
    /// Index of the subcommand word, skipping global options.
    ///
    /// `--` ends global-option scanning; the word after it is the subcommand.
    fn subcommand_index(args: &[String]) -> Option<usize> {
        let mut i = 0;
        while let Some(arg) = args.get(i) {
            if arg == "--" {
                i += 1;
                break;
            }
            if !arg.starts_with('-') || arg == "-" {
                break;
            }
            let long = arg.starts_with("--");
            let name = if long { arg.to_lowercase() } else { arg.clone() };
            if GLOBAL_WITH_VALUE.contains(&name.as_str()) {
                i += 2;
            } else {
                // no-value options, `--opt=value`, and attached `-Crepo` / `-cname=value`
                i += 1;
            }
        }
        (i < args.len()).then_some(i)
    }

    fn checkout(ctx: &CommandContext) -> Option<DenyReason> {
        let dash = ctx.args.iter().position(|a| a == "--")?;
        if dash == 0 {
            Some(
                DenyReason::new("git checkout -- discards uncommitted changes permanently.")
                    .with_hint("Use 'git stash' first."),
            )
        } else {
            Some(
                DenyReason::new("git checkout <ref> -- <path> overwrites working tree.")
                    .with_hint("Use 'git stash' first."),
            )
        }
    }

    fn restore(ctx: &CommandContext) -> Option<DenyReason> {
        if ctx.has_any_flag(&["-h", "--help", "--version"]) {
            return None;
        }
        if ctx.has_flag("--worktree") || ctx.has_short('W') {
            return Some(DenyReason::new(
                "git restore --worktree discards uncommitted changes permanently.",
            ));
        }
        if ctx.has_flag("--staged") || ctx.has_short('S') {
            return None;
        }
        Some(
            DenyReason::new("git restore discards uncommitted changes.")
                .with_hint("Use 'git stash' or 'git diff' first."),
        )
    }

    fn reset(ctx: &CommandContext) -> Option<DenyReason> {
        if ctx.has_flag("--hard") {
            return Some(
                DenyReason::new("git reset --hard destroys uncommitted changes.")
                    .with_hint("Use 'git stash' first."),
            );
        }
        if ctx.has_flag("--merge") {
            return Some(DenyReason::new(
                "git reset --merge can lose uncommitted changes.",
            ));
        }
        None
    }

    fn clean(ctx: &CommandContext) -> Option<DenyReason> {
        if ctx.has_flag("--force") || ctx.has_short('f') {
            return Some(
                DenyReason::new("git clean -f removes untracked files permanently.")
                    .with_hint("Review with 'git clean -n' first."),
            );
        }
        None
    }

    fn push(ctx: &CommandContext) -> Option<DenyReason> {
        let lease = ctx.has_flag_prefix("--force-with-lease");
        let long_force = ctx.has_flag("--force");
        let short_force = ctx.has_short('f');
        // `+main` in a refspec forces that ref.
        let plus_refspec = ctx
            .args
            .iter()
            .any(|a| a.len() > 1 && a.starts_with('+'));

        let force = long_force || short_force || plus_refspec;
        // A lease only excuses a force push that has no explicit --force or -f.
        // With both present the invocation is still denied; this is intentional.
        let denied = (force && !lease) || (long_force && lease) || (short_force && lease);
        if denied {
            return Some(
                DenyReason::new("Force push can destroy remote history.")
                    .with_hint("Use --force-with-lease if necessary."),
            );
        }
        None
    }

    fn branch(ctx: &CommandContext) -> Option<DenyReason> {
        // `--delete --force` and `-d -f` are spellings of `-D`.
        let delete = ctx.has_flag("--delete") || ctx.has_short('d');
        let force = ctx.has_flag("--force") || ctx.has_short('f');
        if ctx.has_short('D') || (delete && force) {
            return Some(
                DenyReason::new("git branch -D force-deletes without merge check.")
                    .with_hint("Use -d for safety."),
            );
        }
        None
    }

    fn stash(ctx: &CommandContext) -> Option<DenyReason> {
        match ctx.first()? {
            "drop" => Some(
                DenyReason::new("git stash drop permanently deletes stashed changes.")
                    .with_hint("List stashes first with 'git stash list'."),
            ),
            "clear" => Some(DenyReason::new(
                "git stash clear permanently deletes ALL stashed changes.",
            )),
            _ => None,
        }
    }
}

impl CommandRule for GitRule {
    fn evaluate(&self, ctx: &CommandContext) -> Option<DenyReason> {
        let index = Self::subcommand_index(&ctx.args)?;
        let sub = ctx.lowered()[index].clone();
        let rest = ctx.tail(index + 1);
        log::debug!("git subcommand {sub:?} with {} args", rest.args.len());

        match sub.as_str() {
            "checkout" => Self::checkout(&rest),
            "restore" => Self::restore(&rest),
            "reset" => Self::reset(&rest),
            "clean" => Self::clean(&rest),
            "push" => Self::push(&rest),
            "branch" => Self::branch(&rest),
            "stash" => Self::stash(&rest),
            _ => None,
        }
    }
}
