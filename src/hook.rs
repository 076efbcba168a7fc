//! Claude Code hook protocol handling.
//!
//! Reads the `PreToolUse` JSON request, hands Bash commands to the
//! [`RuleRegistry`], and renders a deny as the hook's JSON response.
//! An allow produces no output at all.

use std::io::Read;

use serde::Serialize;
use serde_json::Value;

use crate::eval::{Decision, DenyReason, Policy, RuleRegistry};
use crate::redact::redact;

/// The only tool whose input is analyzed.
pub const BASH_TOOL: &str = "Bash";

/// Printed when a deny cannot be serialized; never downgrade to an allow.
pub const FALLBACK_DENY_JSON: &str = r#"{"hookSpecificOutput":{"hookEventName":"PreToolUse","permissionDecision":"deny","permissionDecisionReason":"BLOCKED by safety-net"}}"#;

/// Stands in for the command in the decision log when the request was malformed.
pub const MALFORMED_INPUT: &str = "<malformed hook input>";

/// Request could not be turned into a command string.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolInputError {
    #[error("failed to read hook input: {0}")]
    Io(#[from] std::io::Error),
    #[error("hook input is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("hook input is not a JSON object")]
    NotAnObject,
    #[error("hook input has no tool_input object")]
    MissingToolInput,
    #[error("tool_input has no string command")]
    MissingCommand,
    #[error("command is empty")]
    EmptyCommand,
}

/// What the request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// A Bash command to analyze.
    Command(String),
    /// Some other tool; always allowed.
    OtherTool(Option<String>),
}

/// Outcome of one hook invocation.
#[derive(Debug, Clone)]
pub struct HookResponse {
    /// The Bash command, when the request carried one.
    pub command: Option<String>,
    pub decision: Decision,
    /// The request could not be read as a Bash command.
    pub malformed: bool,
}

#[derive(Debug, Serialize)]
struct HookOutput<'a> {
    #[serde(rename = "hookSpecificOutput")]
    hook_specific_output: HookSpecificOutput<'a>,
}

#[derive(Debug, Serialize)]
struct HookSpecificOutput<'a> {
    #[serde(rename = "hookEventName")]
    hook_event_name: &'static str,
    #[serde(rename = "permissionDecision")]
    permission_decision: &'static str,
    #[serde(rename = "permissionDecisionReason")]
    permission_decision_reason: &'a str,
}

/// Read the whole request from `reader`.
pub fn read_input(mut reader: impl Read) -> Result<String, ProtocolInputError> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    Ok(input)
}

/// Extract the command from a raw JSON request.
pub fn parse_request(input: &str) -> Result<Request, ProtocolInputError> {
    let value: Value = serde_json::from_str(input)?;
    let object = value.as_object().ok_or(ProtocolInputError::NotAnObject)?;

    let tool_name = object.get("tool_name").and_then(Value::as_str);
    if tool_name != Some(BASH_TOOL) {
        return Ok(Request::OtherTool(tool_name.map(str::to_string)));
    }

    let command = object
        .get("tool_input")
        .and_then(Value::as_object)
        .ok_or(ProtocolInputError::MissingToolInput)?
        .get("command")
        .and_then(Value::as_str)
        .ok_or(ProtocolInputError::MissingCommand)?;
    if command.trim().is_empty() {
        return Err(ProtocolInputError::EmptyCommand);
    }
    Ok(Request::Command(command.to_string()))
}

/// Decide on a raw JSON request.
pub fn respond(input: &str, registry: &RuleRegistry, policy: Policy) -> HookResponse {
    match parse_request(input) {
        Ok(Request::Command(command)) => {
            let decision = registry.decide(&command, policy);
            HookResponse {
                command: Some(command),
                decision,
                malformed: false,
            }
        }
        Ok(Request::OtherTool(name)) => {
            log::debug!("skipping tool {}", name.as_deref().unwrap_or("<none>"));
            HookResponse {
                command: None,
                decision: Decision::Allow,
                malformed: false,
            }
        }
        Err(err) => protocol_failure(&err, policy),
    }
}

/// Resolve a malformed request through the policy.
pub fn protocol_failure(err: &ProtocolInputError, policy: Policy) -> HookResponse {
    let decision = if policy.is_strict() {
        Decision::Deny(DenyReason::strict(err).redacted())
    } else {
        log::warn!("fail-open on malformed hook input: {err}");
        Decision::Allow
    };
    HookResponse {
        command: None,
        decision,
        malformed: true,
    }
}

/// User-visible explanation of a deny.
pub fn render_reason(reason: &DenyReason, command: Option<&str>) -> String {
    let mut text = format!("BLOCKED by safety-net\n\nReason: {reason}");
    if let Some(command) = command {
        text.push_str(&format!("\n\nCommand: {command}"));
    }
    if let Some(segment) = &reason.segment
        && command.is_none_or(|c| c.trim() != segment)
    {
        text.push_str(&format!("\n\nSegment: {segment}"));
    }
    text.push_str(
        "\n\nIf this operation is truly needed, ask the user for explicit permission \
         and have them run the command manually.",
    );
    redact(&text)
}

impl HookResponse {
    /// The JSON line to print, or `None` for an allow.
    pub fn to_json(&self) -> Result<Option<String>, serde_json::Error> {
        let Decision::Deny(reason) = &self.decision else {
            return Ok(None);
        };
        let text = render_reason(reason, self.command.as_deref());
        let output = HookOutput {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: "PreToolUse",
                permission_decision: "deny",
                permission_decision_reason: &text,
            },
        };
        serde_json::to_string(&output).map(Some)
    }

    /// What to print: [`Self::to_json`], or [`FALLBACK_DENY_JSON`] if a deny
    /// fails to serialize.
    pub fn output(&self) -> Option<String> {
        match self.to_json() {
            Ok(json) => json,
            Err(e) => {
                log::error!("cannot serialize hook output: {e}");
                Some(FALLBACK_DENY_JSON.to_string())
            }
        }
    }

    /// The command to record in the decision log, if this response gets logged.
    pub fn log_subject(&self) -> Option<&str> {
        match &self.command {
            Some(command) => Some(command.as_str()),
            None if self.malformed => Some(MALFORMED_INPUT),
            None => None,
        }
    }
}
