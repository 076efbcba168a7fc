use crate::parse::CanonicalCommand;

/// Arguments of one canonical command, as seen by a rule.
///
/// Flag lookups are case-insensitive. Short-option bundles (`-xfd`) are
/// exploded so every letter counts as present; letters keep their case so
/// rules can tell `-D` from `-d`.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Canonical program name (lower-cased basename).
    pub program: String,
    /// Argument values in order, as written.
    pub args: Vec<String>,
    lowered: Vec<String>,
}

impl CommandContext {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let lowered = args.iter().map(|a| a.to_lowercase()).collect();
        Self {
            program: program.into(),
            args,
            lowered,
        }
    }

    pub fn from_canonical(cmd: &CanonicalCommand) -> Self {
        Self::new(
            cmd.program.clone(),
            cmd.args.iter().map(|t| t.value.clone()).collect(),
        )
    }

    /// Build a context from the first simple command of `raw`.
    #[cfg(test)]
    pub fn from_command(raw: &str) -> Self {
        use crate::parse::{Canonicalizer, tokenize};

        let commands = tokenize(raw).expect("test command must tokenize");
        let first = commands.first().expect("test command must not be empty");
        Self::from_canonical(&Canonicalizer::default().canonicalize(first))
    }

    /// Arguments lower-cased.
    pub fn lowered(&self) -> &[String] {
        &self.lowered
    }

    /// A context over the arguments after the first `skip`.
    pub fn tail(&self, skip: usize) -> Self {
        Self::new(
            self.program.clone(),
            self.args.get(skip..).unwrap_or_default().to_vec(),
        )
    }

    /// First argument, lower-cased.
    pub fn first(&self) -> Option<&str> {
        self.lowered.first().map(String::as_str)
    }

    /// An argument equals `flag` (case-insensitive).
    pub fn has_flag(&self, flag: &str) -> bool {
        let flag = flag.to_lowercase();
        self.lowered.iter().any(|a| *a == flag)
    }

    /// An argument equals any of `flags`.
    pub fn has_any_flag(&self, flags: &[&str]) -> bool {
        flags.iter().any(|f| self.has_flag(f))
    }

    /// An argument starts with `prefix` (case-insensitive), e.g.
    /// `--force-with-lease=main` for `--force-with-lease`.
    pub fn has_flag_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.to_lowercase();
        self.lowered.iter().any(|a| a.starts_with(&prefix))
    }

    /// Letters of every single-dash option bundle before `--`.
    pub fn short_flags(&self) -> String {
        self.args
            .iter()
            .take_while(|a| *a != "--")
            .filter(|a| a.len() > 1 && a.starts_with('-') && !a.starts_with("--"))
            .flat_map(|a| a.chars().skip(1))
            .collect()
    }

    /// `letter` appears in a short-option bundle (case-sensitive).
    pub fn has_short(&self, letter: char) -> bool {
        self.short_flags().contains(letter)
    }
}
