use std::fmt;

/// Environment variable that switches the guard to fail-closed.
pub const STRICT_ENV_VAR: &str = "SAFETY_NET_STRICT";

/// What to do when a command cannot be analyzed with confidence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Policy {
    /// Unparseable or malformed input is allowed.
    #[default]
    FailOpen,
    /// Unparseable or malformed input is denied.
    Strict,
}

impl Policy {
    /// Read the policy from `SAFETY_NET_STRICT`. Re-read on every call.
    pub fn from_env() -> Self {
        match std::env::var(STRICT_ENV_VAR) {
            Ok(value) => Self::from_switch(&value),
            Err(_) => Self::FailOpen,
        }
    }

    /// Interpret an environment-style boolean switch.
    pub fn from_switch(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Self::Strict,
            _ => Self::FailOpen,
        }
    }

    pub fn is_strict(self) -> bool {
        self == Self::Strict
    }
}

/// Why a command was blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenyReason {
    pub message: String,
    /// Safer alternative, when one exists.
    pub hint: Option<String>,
    /// The simple command that triggered the deny.
    pub segment: Option<String>,
}

impl DenyReason {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hint: None,
            segment: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    /// Deny issued because strict mode refuses input it cannot analyze.
    pub fn strict(detail: impl fmt::Display) -> Self {
        Self::new(format!(
            "{STRICT_ENV_VAR} is set (strict mode), which denies any command it cannot analyze: {detail}"
        ))
        .with_hint(format!(
            "Fix the command, or unset {STRICT_ENV_VAR} to restore fail-open behavior."
        ))
    }

    /// Every field passed through the redactor.
    pub fn redacted(self) -> Self {
        Self {
            message: crate::redact::redact(&self.message),
            hint: self.hint.as_deref().map(crate::redact::redact),
            segment: self.segment.as_deref().map(crate::redact::redact),
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " {hint}")?;
        }
        Ok(())
    }
}

/// Outcome of evaluating one top-level command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Decision::Deny(_))
    }

    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(reason),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny(_) => "deny",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Deny(_) => "DENY",
        }
    }
}
