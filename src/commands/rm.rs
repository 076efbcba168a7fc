use crate::commands::CommandRule;
use crate::config::RmConfig;
use crate::eval::{CommandContext, DenyReason};

pub struct RmRule {
    safe_roots: Vec<String>,
}

impl RmRule {
    pub fn from_config(config: &RmConfig) -> Self {
        Self {
            safe_roots: config
                .safe_roots
                .iter()
                .map(|r| shellexpand::tilde(r).trim_end_matches('/').to_string())
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }

    /// Strictly inside one of the safe roots (the root itself is not safe).
    fn under_safe_root(&self, path: &str) -> bool {
        self.safe_roots.iter().any(|root| {
            path.strip_prefix(root.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|rest| !rest.trim_matches('/').is_empty())
        })
    }

    /// Why deleting `target` recursively is too dangerous, if it is.
    fn classify(&self, target: &str) -> Option<&'static str> {
        if !target.is_empty() && target.chars().all(|c| c == '/') {
            return Some("rm -rf on the filesystem root is extremely dangerous.");
        }
        if target.starts_with('~') || target.starts_with("$HOME") || target.starts_with("${HOME}")
        {
            return Some("rm -rf on home paths is extremely dangerous.");
        }
        if matches!(target.trim_end_matches('/'), "." | ".." | "*" | "./*") {
            return Some("rm -rf on the current or parent directory deletes everything in it.");
        }
        if target.split('/').any(|seg| seg == "..") {
            return Some("rm -rf on a path containing '..' can escape the working directory.");
        }
        if target.starts_with('/') && !self.under_safe_root(target) {
            return Some("rm -rf on an absolute path outside the temp directories is destructive.");
        }
        None
    }
}

impl CommandRule for RmRule {
    fn evaluate(&self, ctx: &CommandContext) -> Option<DenyReason> {
        let mut recursive = false;
        let mut force = false;
        let mut targets = Vec::new();
        let mut options_done = false;

        for arg in &ctx.args {
            if options_done || !arg.starts_with('-') || arg == "-" {
                targets.push(arg.as_str());
                continue;
            }
            if arg == "--" {
                options_done = true;
                continue;
            }
            match arg.to_lowercase().as_str() {
                "--recursive" => recursive = true,
                "--force" => force = true,
                long if long.starts_with("--") => {}
                _ => {
                    recursive |= arg.contains(['r', 'R']);
                    force |= arg.contains('f');
                }
            }
        }

        if !(recursive && force) {
            return None;
        }
        targets.iter().find_map(|target| {
            self.classify(target).map(|message| {
                DenyReason::new(message).with_hint(
                    "Delete specific paths inside the project, or ask the user to run it manually.",
                )
            })
        })
    }
}
