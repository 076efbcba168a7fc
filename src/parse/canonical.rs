//! Canonicalization: a simple command → its effective program and arguments.
//!
//! Pass-through wrappers (`busybox find`, `sudo git`, `env FOO=1 rm`,
//! `xargs rm`, ...) are unwound so rules see the program that actually runs.
//! Along the way every command string carried as data (substitutions,
//! `sh -c`, `python -c`, `find -exec`, `eval`, ...) is collected for the
//! decision loop to tokenize and evaluate on its own.

use super::embedded;
use super::types::{SimpleCommand, Token, TokenKind};
use crate::config::WrapperConfig;

/// Leading reserved words that do not name a program.
const RESERVED_WORDS: &[&str] = &["!", "{", "if", "then", "else", "elif", "do", "while", "until"];

/// The effective form of one simple command.
#[derive(Debug, Clone)]
pub struct CanonicalCommand {
    /// Lower-cased basename of the program that runs (`""` if none).
    pub program: String,
    /// Arguments after the program, with redirections removed.
    pub args: Vec<Token>,
    /// Command strings carried by this command, to be evaluated recursively.
    pub embedded: Vec<String>,
    /// Here-document body or here-string fed to the command.
    pub stdin: Option<String>,
    /// Shell-quoted rendering of the original simple command.
    pub display: String,
}

/// Option syntax of a transparent wrapper.
struct WrapperSpec {
    name: &'static str,
    /// Short options that take a value (`-u root`, `-uroot`).
    short_with_value: &'static str,
    /// Long options that take a separate value unless written `--opt=value`.
    long_with_value: &'static [&'static str],
    /// Positional operands between the options and the command (`timeout 5s`).
    operands: usize,
    /// `NAME=value` operands may precede the command.
    assignments: bool,
}

const WRAPPERS: &[WrapperSpec] = &[
    WrapperSpec {
        name: "sudo",
        short_with_value: "CDghpRrtTUu",
        long_with_value: &[
            "--chdir",
            "--close-from",
            "--group",
            "--host",
            "--prompt",
            "--chroot",
            "--role",
            "--type",
            "--command-timeout",
            "--other-user",
            "--user",
        ],
        operands: 0,
        assignments: true,
    },
    WrapperSpec {
        name: "doas",
        short_with_value: "Cu",
        long_with_value: &[],
        operands: 0,
        assignments: false,
    },
    WrapperSpec {
        name: "env",
        short_with_value: "CSu",
        long_with_value: &["--chdir", "--split-string", "--unset"],
        operands: 0,
        assignments: true,
    },
    WrapperSpec {
        name: "command",
        short_with_value: "",
        long_with_value: &[],
        operands: 0,
        assignments: false,
    },
    WrapperSpec {
        name: "builtin",
        short_with_value: "",
        long_with_value: &[],
        operands: 0,
        assignments: false,
    },
    WrapperSpec {
        name: "exec",
        short_with_value: "a",
        long_with_value: &[],
        operands: 0,
        assignments: false,
    },
    WrapperSpec {
        name: "nice",
        short_with_value: "n",
        long_with_value: &["--adjustment"],
        operands: 0,
        assignments: false,
    },
    WrapperSpec {
        name: "nohup",
        short_with_value: "",
        long_with_value: &[],
        operands: 0,
        assignments: false,
    },
    WrapperSpec {
        name: "time",
        short_with_value: "fo",
        long_with_value: &["--format", "--output"],
        operands: 0,
        assignments: false,
    },
    WrapperSpec {
        name: "timeout",
        short_with_value: "ks",
        long_with_value: &["--kill-after", "--signal"],
        operands: 1,
        assignments: false,
    },
    WrapperSpec {
        name: "stdbuf",
        short_with_value: "eio",
        long_with_value: &["--error", "--input", "--output"],
        operands: 0,
        assignments: false,
    },
    WrapperSpec {
        name: "ionice",
        short_with_value: "cn",
        long_with_value: &["--class", "--classdata"],
        operands: 0,
        assignments: false,
    },
    WrapperSpec {
        name: "xargs",
        short_with_value: "adEILnPs",
        long_with_value: &[
            "--arg-file",
            "--delimiter",
            "--eof",
            "--max-args",
            "--max-chars",
            "--max-procs",
            "--process-slot-var",
        ],
        operands: 0,
        assignments: false,
    },
];

/// Options of `watch` that take a value.
const WATCH: WrapperSpec = WrapperSpec {
    name: "watch",
    short_with_value: "nq",
    long_with_value: &["--interval", "--equexit"],
    operands: 0,
    assignments: false,
};

/// Unwinds wrappers and collects embedded commands.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    /// Multi-call binaries whose first argument names the applet.
    multicall: Vec<String>,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(vec!["busybox".into(), "toybox".into()])
    }
}

impl Canonicalizer {
    pub fn new(multicall: Vec<String>) -> Self {
        Self {
            multicall: multicall.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &WrapperConfig) -> Self {
        Self::new(config.multicall.clone())
    }

    /// Resolve the program that actually runs and everything it would run.
    pub fn canonicalize(&self, cmd: &SimpleCommand) -> CanonicalCommand {
        self.canonicalize_fed(cmd, None)
    }

    /// Canonicalize a whole command list. A here-document or here-string
    /// fed to one pipeline stage flows on to the stages reading from it, so
    /// `cat <<EOF | bash` sees the body as shell input.
    pub fn canonicalize_all(&self, cmds: &[SimpleCommand]) -> Vec<CanonicalCommand> {
        let mut out: Vec<CanonicalCommand> = Vec::with_capacity(cmds.len());
        for cmd in cmds {
            let upstream = if cmd.piped_in {
                out.last().and_then(|prev| prev.stdin.clone())
            } else {
                None
            };
            out.push(self.canonicalize_fed(cmd, upstream));
        }
        out
    }

    fn canonicalize_fed(&self, cmd: &SimpleCommand, upstream: Option<String>) -> CanonicalCommand {
        let mut embedded: Vec<String> = cmd
            .tokens
            .iter()
            .flat_map(|t| t.substitutions.iter().cloned())
            .collect();
        let (words, own_stdin) = strip_redirections(&cmd.tokens);
        let stdin = own_stdin.or(upstream);

        let mut rest = skip_prelude(&words);
        while let Some(first) = rest.first() {
            let name = program_name(&first.value);
            if self.multicall.contains(&name) {
                match rest.get(1) {
                    Some(applet) if !applet.value.starts_with('-') => {
                        rest = &rest[1..];
                        continue;
                    }
                    _ => break,
                }
            }
            match unwrap_wrapper(&name, &rest[1..], &mut embedded) {
                Some(inner) => rest = skip_prelude(inner),
                None => break,
            }
        }

        let (program, args) = match rest.split_first() {
            Some((first, args)) => (program_name(&first.value), args.to_vec()),
            None => (String::new(), Vec::new()),
        };
        embedded.extend(embedded::extract(&program, &args, stdin.as_deref()));

        CanonicalCommand {
            program,
            args,
            embedded,
            stdin,
            display: cmd.display(),
        }
    }
}

/// Lower-cased basename: `/usr/bin/Git` → `git`.
pub fn program_name(word: &str) -> String {
    let base = match word.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => name,
        _ => word,
    };
    base.to_lowercase()
}

/// Drop redirection operators and their targets, keeping whatever is fed
/// to stdin by a here-document or here-string.
fn strip_redirections(tokens: &[Token]) -> (Vec<Token>, Option<String>) {
    let mut words = Vec::new();
    let mut stdin = None;
    let mut iter = tokens.iter().peekable();

    while let Some(tok) = iter.next() {
        let TokenKind::Redirect { heredoc } = &tok.kind else {
            words.push(tok.clone());
            continue;
        };
        let target = iter.next_if(|t| t.is_word());
        if let Some(body) = heredoc {
            stdin = Some(body.clone());
        } else if tok.value.ends_with("<<<")
            && let Some(target) = target
        {
            stdin = Some(target.value.clone());
        }
    }
    (words, stdin)
}

/// Skip leading assignments and reserved words.
fn skip_prelude(mut words: &[Token]) -> &[Token] {
    while let Some(first) = words.first() {
        let reserved = !first.quoted() && RESERVED_WORDS.contains(&first.value.as_str());
        if first.is_assignment() || reserved {
            words = &words[1..];
        } else {
            break;
        }
    }
    words
}

/// If `name` is a transparent wrapper, return the command it runs.
///
/// Wrappers that run their arguments as a string (`eval`, `watch`,
/// `env -S`) push that string onto `embedded` and return `None`.
fn unwrap_wrapper<'a>(
    name: &str,
    args: &'a [Token],
    embedded: &mut Vec<String>,
) -> Option<&'a [Token]> {
    match name {
        "eval" => {
            push_joined(embedded, args);
            return None;
        }
        "watch" => {
            let exec = args
                .iter()
                .take_while(|t| t.value.starts_with('-'))
                .any(|t| t.value == "-x" || t.value == "--exec");
            let command = skip_options(&WATCH, args);
            if exec {
                return non_empty(command);
            }
            push_joined(embedded, command);
            return None;
        }
        "command" => {
            let lookup_only = args
                .iter()
                .take_while(|t| t.value.starts_with('-') && t.value != "--")
                .any(|t| t.value.contains(['v', 'V']));
            if lookup_only {
                return None;
            }
        }
        "env" => {
            if let Some(split) = env_split_string(args) {
                embedded.push(split);
                return None;
            }
        }
        _ => {}
    }

    let spec = WRAPPERS.iter().find(|w| w.name == name)?;
    let mut rest = skip_options(spec, args);
    rest = rest.get(spec.operands..).unwrap_or(&[]);
    if spec.assignments {
        while rest.first().is_some_and(Token::is_assignment) {
            rest = &rest[1..];
        }
    }
    non_empty(rest)
}

fn non_empty(tokens: &[Token]) -> Option<&[Token]> {
    if tokens.is_empty() { None } else { Some(tokens) }
}

fn push_joined(embedded: &mut Vec<String>, args: &[Token]) {
    let joined = args
        .iter()
        .map(|t| t.value.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    if !joined.trim().is_empty() {
        embedded.push(joined);
    }
}

/// Skip the wrapper's own options, honouring `--`.
fn skip_options<'a>(spec: &WrapperSpec, mut args: &'a [Token]) -> &'a [Token] {
    while let Some(tok) = args.first() {
        let value = tok.value.as_str();
        if value == "--" {
            return &args[1..];
        }
        if !value.starts_with('-') || value == "-" {
            break;
        }
        let consumed = if value.starts_with("--") {
            if !value.contains('=') && spec.long_with_value.contains(&value) {
                2
            } else {
                1
            }
        } else {
            let letters = &value[1..];
            match letters.find(|c| spec.short_with_value.contains(c)) {
                // Value-taking letter at the end of the bundle: value is the next token.
                Some(idx) if idx + 1 == letters.len() => 2,
                _ => 1,
            }
        };
        args = args.get(consumed..).unwrap_or(&[]);
    }
    args
}

/// `env -S 'cmd args'` / `env --split-string=...`: the string plus any
/// trailing arguments form the command.
fn env_split_string(args: &[Token]) -> Option<String> {
    let mut i = 0;
    while let Some(tok) = args.get(i) {
        let value = tok.value.as_str();
        if !value.starts_with('-') || value == "--" {
            return None;
        }
        let (mut command, next) = if let Some(v) = value.strip_prefix("--split-string=") {
            (v.to_string(), i + 1)
        } else if value == "--split-string" || value == "-S" {
            (args.get(i + 1)?.value.clone(), i + 2)
        } else if let Some(v) = value.strip_prefix("-S") {
            (v.to_string(), i + 1)
        } else {
            i += if matches!(value, "-u" | "-C" | "--unset" | "--chdir") { 2 } else { 1 };
            continue;
        };
        for tok in args.get(next..).unwrap_or(&[]) {
            command.push(' ');
            command.push_str(&tok.display());
        }
        return Some(command);
    }
    None
}
