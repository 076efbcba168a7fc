use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::eval::Decision;

/// Log level override (`error`, `warn`, `info`, `debug`, `trace`, `off`).
pub const LOG_ENV_VAR: &str = "SAFETY_NET_LOG";

/// Longest command prefix written to the log.
const MAX_LOGGED_COMMAND: usize = 200;

/// `~/.local/share/safety-net/decisions.log`
pub fn log_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".local/share/safety-net/decisions.log"))
}

fn level_from_env() -> LevelFilter {
    std::env::var(LOG_ENV_VAR)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install a file logger appending to [`log_path`].
/// Best-effort: failures are silently ignored (logging must never block the hook).
pub fn init() {
    let level = level_from_env();
    if level == LevelFilter::Off {
        return;
    }
    let Some(path) = log_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    else {
        return;
    };

    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    let _ = WriteLogger::init(level, config, file);
}

/// Record one decision. The command is redacted and truncated.
pub fn log_decision(command: &str, decision: &Decision) {
    let redacted = crate::redact::redact(command);
    let mut cmd: String = redacted.chars().take(MAX_LOGGED_COMMAND).collect();
    if redacted.chars().count() > MAX_LOGGED_COMMAND {
        cmd.push('…');
    }
    let cmd = cmd.replace('\n', "\\n");

    match decision {
        Decision::Allow => log::info!("{}\t{cmd}", decision.label()),
        Decision::Deny(reason) => {
            log::info!("{}\t{cmd}\t{reason}", decision.label());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_under_home() {
        if let Some(path) = log_path() {
            assert!(path.ends_with(".local/share/safety-net/decisions.log"));
        }
    }

    #[test]
    fn log_decision_without_logger_is_harmless() {
        log_decision("git status", &Decision::Allow);
        log_decision(
            &"x".repeat(500),
            &Decision::Deny(crate::eval::DenyReason::new("no")),
        );
    }
}
