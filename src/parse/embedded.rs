//! Meta-execution extraction: command strings carried as program arguments.
//!
//! Recognised shapes:
//! - shells with `-c` (`bash -lc '...'`), or fed a here-document/here-string;
//! - interpreters running inline code (`python -c`, `ruby -e`, `perl -e`,
//!   `node -e`, `php -r`), where the code calls a process-execution primitive
//!   with a string literal (`os.system("...")`, `execSync('...')`, ...);
//! - `find ... -exec CMD ... ;`.
//!
//! Extraction is textual. String literals are taken verbatim (after escape
//! processing); nothing is interpolated or executed.

use std::ops::Range;

use super::types::{render, Token};

/// Interpreters whose inline code may hide a shell command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpreter {
    Shell,
    Python,
    Ruby,
    Perl,
    Node,
    Php,
}

impl Interpreter {
    /// Match a program name, allowing version suffixes (`python3.12`, `perl5`).
    pub fn from_program(program: &str) -> Option<Self> {
        let matches = |base: &str| {
            program.strip_prefix(base).is_some_and(|suffix| {
                suffix.is_empty()
                    || (suffix.starts_with(|c: char| c.is_ascii_digit())
                        && suffix.chars().all(|c| c.is_ascii_digit() || c == '.'))
            })
        };

        if ["sh", "bash", "zsh", "dash", "ksh", "mksh", "ash", "fish"]
            .iter()
            .any(|s| matches(s))
        {
            Some(Self::Shell)
        } else if matches("python") || matches("pypy") {
            Some(Self::Python)
        } else if matches("ruby") {
            Some(Self::Ruby)
        } else if matches("perl") {
            Some(Self::Perl)
        } else if matches("node") || matches("nodejs") {
            Some(Self::Node)
        } else if matches("php") {
            Some(Self::Php)
        } else {
            None
        }
    }

    /// Short flags whose value is inline source code.
    fn inline_flags(self) -> &'static str {
        match self {
            Self::Shell | Self::Python => "c",
            Self::Ruby => "e",
            Self::Perl => "eE",
            Self::Node => "ep",
            Self::Php => "r",
        }
    }

    /// Long spellings of the inline-code flag.
    fn inline_long_flags(self) -> &'static [&'static str] {
        match self {
            Self::Node => &["eval", "print"],
            _ => &[],
        }
    }

    /// Other short flags that consume a value.
    fn short_with_value(self) -> &'static str {
        match self {
            Self::Shell => "oO",
            Self::Python => "WX",
            Self::Ruby => "CIrEF",
            Self::Perl => "I",
            Self::Node => "r",
            Self::Php => "dc",
        }
    }

    /// Calls that run their string argument as a command.
    fn primitives(self) -> &'static [&'static str] {
        match self {
            Self::Shell => &[],
            Self::Python => &[
                "os.system",
                "os.popen",
                "subprocess.run",
                "subprocess.call",
                "subprocess.check_call",
                "subprocess.check_output",
                "subprocess.Popen",
                "subprocess.getoutput",
                "subprocess.getstatusoutput",
            ],
            Self::Ruby => &[
                "system",
                "exec",
                "spawn",
                "IO.popen",
                "Open3.capture2",
                "Open3.capture2e",
                "Open3.capture3",
                "Open3.popen3",
            ],
            Self::Perl => &["system", "exec"],
            Self::Node => &[
                "execSync",
                "exec",
                "spawnSync",
                "spawn",
                "execFileSync",
                "execFile",
            ],
            Self::Php => &["system", "exec", "shell_exec", "passthru", "popen", "proc_open"],
        }
    }

    /// Whether backtick / `qx` / `%x` literals run a shell command.
    fn has_backticks(self) -> bool {
        matches!(self, Self::Ruby | Self::Perl | Self::Php)
    }
}

/// Embedded commands carried by `program args` (excluding substitutions,
/// which the canonicalizer collects from tokens directly).
pub fn extract(program: &str, args: &[Token], stdin: Option<&str>) -> Vec<String> {
    if program == "find" {
        return exec_spans(args)
            .into_iter()
            .filter(|span| !span.is_empty())
            .map(|span| render(&args[span]))
            .collect();
    }

    let Some(interp) = Interpreter::from_program(program) else {
        return Vec::new();
    };
    let invocation = parse_invocation(interp, args);
    let source = if !invocation.inline.is_empty() {
        invocation.inline.join("\n")
    } else if !invocation.has_script {
        match stdin {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => return Vec::new(),
        }
    } else {
        return Vec::new();
    };

    match interp {
        Interpreter::Shell => vec![source],
        _ => scan_source(interp, &source),
    }
}

/// Ranges of `find` arguments between `-exec`/`-execdir`/`-ok`/`-okdir`
/// and the terminating `;` or `+` (both bounds exclusive).
pub fn exec_spans<S: AsRef<str>>(args: &[S]) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let word = args[i].as_ref().to_ascii_lowercase();
        if matches!(word.as_str(), "-exec" | "-execdir" | "-ok" | "-okdir") {
            let start = i + 1;
            let end = args[start..]
                .iter()
                .position(|a| matches!(a.as_ref(), ";" | "+"))
                .map_or(args.len(), |n| start + n);
            spans.push(start..end);
            i = end + 1;
        } else {
            i += 1;
        }
    }
    spans
}

#[derive(Debug, Default)]
struct Invocation {
    /// Inline source passed through the code flag(s).
    inline: Vec<String>,
    /// A script file (or `-m module`) is named, so stdin is not code.
    has_script: bool,
}

/// Walk interpreter options looking for inline-code flags.
fn parse_invocation(interp: Interpreter, args: &[Token]) -> Invocation {
    let mut inv = Invocation::default();
    // Shells take the command string from the first operand after `-c`.
    let mut shell_wants_command = false;
    let mut i = 0;

    while let Some(tok) = args.get(i) {
        let value = tok.value.as_str();
        i += 1;

        if value == "--" || value == "-" || !value.starts_with('-') {
            let operand = match value {
                "--" => args.get(i),
                "-" => None,
                _ => Some(tok),
            };
            if shell_wants_command {
                if let Some(op) = operand {
                    inv.inline.push(op.value.clone());
                }
            } else if value != "-" && operand.is_some() {
                inv.has_script = true;
            }
            break;
        }

        if let Some(long) = value.strip_prefix("--") {
            let (name, attached) = match long.split_once('=') {
                Some((n, v)) => (n, Some(v)),
                None => (long, None),
            };
            if interp.inline_long_flags().contains(&name) {
                match attached {
                    Some(code) => inv.inline.push(code.to_string()),
                    None => {
                        if let Some(code) = args.get(i) {
                            inv.inline.push(code.value.clone());
                            i += 1;
                        }
                    }
                }
            }
            continue;
        }

        let letters: Vec<char> = value[1..].chars().collect();
        for (idx, &letter) in letters.iter().enumerate() {
            let attached: String = letters[idx + 1..].iter().collect();
            if interp.inline_flags().contains(letter) {
                if interp == Interpreter::Shell {
                    shell_wants_command = true;
                    continue;
                }
                if attached.is_empty() {
                    if let Some(code) = args.get(i) {
                        inv.inline.push(code.value.clone());
                        i += 1;
                    }
                } else {
                    inv.inline.push(attached);
                }
                break;
            }
            if interp == Interpreter::Python && letter == 'm' {
                inv.has_script = true;
                return inv;
            }
            if interp.short_with_value().contains(letter) {
                if attached.is_empty() {
                    i += 1;
                }
                break;
            }
        }
    }
    inv
}

/// Find execution primitives in interpreter source and pull out the
/// command strings they are called with.
fn scan_source(interp: Interpreter, source: &str) -> Vec<String> {
    let chars: Vec<char> = source.chars().collect();
    let mut found = Vec::new();

    let mut i = 0;
    while i < chars.len() {
        if !is_ident_boundary(&chars, i) {
            i += 1;
            continue;
        }
        if let Some(name) = interp
            .primitives()
            .iter()
            .find(|p| starts_with_word(&chars, i, p))
        {
            let after = i + name.chars().count();
            if let Some(command) = call_literals(&chars, after) {
                found.push(command);
            }
            i = after;
            continue;
        }
        if interp.has_backticks()
            && let Some((command, next)) = shell_literal(&chars, i)
        {
            if !command.trim().is_empty() {
                found.push(command);
            }
            i = next;
            continue;
        }
        i += 1;
    }
    found
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `i` is not in the middle of an identifier.
fn is_ident_boundary(chars: &[char], i: usize) -> bool {
    i == 0 || !is_ident_char(chars[i - 1])
}

/// `word` appears at `i` and is not followed by more identifier characters.
fn starts_with_word(chars: &[char], i: usize, word: &str) -> bool {
    let mut end = i;
    for w in word.chars() {
        if chars.get(end) != Some(&w) {
            return false;
        }
        end += 1;
    }
    !chars.get(end).copied().is_some_and(is_ident_char)
}

/// Collect the string literal argument(s) of a call starting at `pos`
/// (just after the callee name). A single literal is a shell command line;
/// several literals (argv form) are shell-joined.
fn call_literals(chars: &[char], mut pos: usize) -> Option<String> {
    let mut parts = Vec::new();
    skip_ws(chars, &mut pos);
    if chars.get(pos) == Some(&'(') {
        pos += 1;
    }
    loop {
        skip_ws(chars, &mut pos);
        match chars.get(pos) {
            Some('[' | ']' | ',') => pos += 1,
            Some(_) => match string_literal(chars, pos) {
                Some((value, next)) => {
                    parts.push(value);
                    pos = next;
                }
                None => break,
            },
            None => break,
        }
    }

    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => shlex::try_join(parts.iter().map(String::as_str)).ok(),
    }
}

fn skip_ws(chars: &[char], pos: &mut usize) {
    while chars.get(*pos).is_some_and(|c| c.is_whitespace()) {
        *pos += 1;
    }
}

/// Read a quoted string literal at `pos`, with optional Python-style
/// prefixes (`r"..."`, `b'...'`) and triple quotes. Returns the decoded
/// value and the position after the closing quote.
fn string_literal(chars: &[char], mut pos: usize) -> Option<(String, usize)> {
    let mut raw = false;
    for _ in 0..2 {
        match chars.get(pos) {
            Some(c @ ('r' | 'R' | 'b' | 'B' | 'f' | 'F' | 'u' | 'U'))
                if chars.get(pos + 1).is_some_and(|n| n.is_ascii_alphabetic() || matches!(n, '"' | '\'')) =>
            {
                raw |= matches!(c, 'r' | 'R');
                pos += 1;
            }
            _ => break,
        }
    }

    let quote = *chars.get(pos).filter(|c| matches!(c, '"' | '\'' | '`'))?;
    let triple = quote != '`' && chars.get(pos + 1) == Some(&quote) && chars.get(pos + 2) == Some(&quote);
    pos += if triple { 3 } else { 1 };

    let mut value = String::new();
    loop {
        let c = *chars.get(pos)?;
        if c == quote {
            if !triple {
                return Some((value, pos + 1));
            }
            if chars.get(pos + 1) == Some(&quote) && chars.get(pos + 2) == Some(&quote) {
                return Some((value, pos + 3));
            }
        }
        if c == '\\' {
            let next = *chars.get(pos + 1)?;
            if raw {
                value.push('\\');
                value.push(next);
            } else {
                match next {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    '\\' | '\'' | '"' | '`' => value.push(next),
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
            }
            pos += 2;
            continue;
        }
        value.push(c);
        pos += 1;
    }
}

/// Backtick, `qx{...}` (Perl) and `%x(...)` (Ruby) shell literals at `pos`.
fn shell_literal(chars: &[char], pos: usize) -> Option<(String, usize)> {
    let (open, start) = match chars.get(pos)? {
        '`' => ('`', pos + 1),
        'q' if chars.get(pos + 1) == Some(&'x') => (*chars.get(pos + 2)?, pos + 3),
        '%' if chars.get(pos + 1) == Some(&'x') => (*chars.get(pos + 2)?, pos + 3),
        _ => return None,
    };
    let close = match open {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        c if c.is_alphanumeric() || c.is_whitespace() => return None,
        c => c,
    };
    let len = chars[start.min(chars.len())..].iter().position(|&c| c == close)?;
    let command: String = chars[start..start + len].iter().collect();
    Some((command, start + len + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<Token> {
        words.iter().map(|w| Token::word(*w)).collect()
    }

    #[test]
    fn interpreter_names() {
        assert_eq!(Interpreter::from_program("python3.12"), Some(Interpreter::Python));
        assert_eq!(Interpreter::from_program("bash"), Some(Interpreter::Shell));
        assert_eq!(Interpreter::from_program("perl5"), Some(Interpreter::Perl));
        assert_eq!(Interpreter::from_program("pythonic"), None);
        assert_eq!(Interpreter::from_program("shred"), None);
    }

    #[test]
    fn shell_dash_c() {
        assert_eq!(
            extract("bash", &toks(&["-c", "git stash clear"]), None),
            vec!["git stash clear"]
        );
    }

    #[test]
    fn shell_bundled_c() {
        assert_eq!(
            extract("sh", &toks(&["-lc", "rm -rf /"]), None),
            vec!["rm -rf /"]
        );
        assert_eq!(
            extract("bash", &toks(&["-c", "-e", "ls"]), None),
            vec!["ls"]
        );
    }

    #[test]
    fn shell_script_file_is_opaque() {
        assert!(extract("bash", &toks(&["deploy.sh"]), Some("rm -rf /")).is_empty());
    }

    #[test]
    fn shell_stdin() {
        assert_eq!(
            extract("bash", &[], Some("git reset --hard\n")),
            vec!["git reset --hard\n"]
        );
    }

    #[test]
    fn python_os_system() {
        assert_eq!(
            extract(
                "python",
                &toks(&["-c", "import os; os.system(\"find . -delete\")"]),
                None
            ),
            vec!["find . -delete"]
        );
    }

    #[test]
    fn python_subprocess_argv() {
        assert_eq!(
            extract(
                "python3",
                &toks(&["-c", "import subprocess; subprocess.run(['git', 'push', '--force'])"]),
                None
            ),
            vec!["git push --force"]
        );
    }

    #[test]
    fn python_shell_string_with_kwargs() {
        assert_eq!(
            extract(
                "python3",
                &toks(&["-c", "subprocess.run('git stash clear', shell=True)"]),
                None
            ),
            vec!["git stash clear"]
        );
    }

    #[test]
    fn python_module_is_opaque() {
        assert!(extract("python", &toks(&["-m", "http.server"]), Some("x")).is_empty());
    }

    #[test]
    fn python_without_primitive() {
        assert!(extract("python", &toks(&["-c", "print('find . -delete')"]), None).is_empty());
    }

    #[test]
    fn python_heredoc_source() {
        assert_eq!(
            extract("python3", &toks(&["-"]), Some("import os\nos.system('git stash drop')\n")),
            vec!["git stash drop"]
        );
    }

    #[test]
    fn ruby_system_without_parens() {
        assert_eq!(
            extract("ruby", &toks(&["-e", "system \"rm -rf /\""]), None),
            vec!["rm -rf /"]
        );
    }

    #[test]
    fn perl_backticks_and_qx() {
        assert_eq!(
            extract("perl", &toks(&["-e", "print `git stash clear`; qx{ls}"]), None),
            vec!["git stash clear", "ls"]
        );
    }

    #[test]
    fn node_exec_sync() {
        assert_eq!(
            extract(
                "node",
                &toks(&["-e", "require('child_process').execSync('git reset --hard')"]),
                None
            ),
            vec!["git reset --hard"]
        );
    }

    #[test]
    fn node_long_eval() {
        assert_eq!(
            extract("node", &toks(&["--eval=spawnSync('rm', ['-rf', '/'])"]), None),
            vec!["rm -rf /"]
        );
    }

    #[test]
    fn identifier_boundaries() {
        // `regexec(` must not match `exec(`
        assert!(extract("node", &toks(&["-e", "regexec('x')"]), None).is_empty());
    }

    #[test]
    fn php_shell_exec() {
        assert_eq!(
            extract("php", &toks(&["-r", "shell_exec(\"git clean -fd\");"]), None),
            vec!["git clean -fd"]
        );
    }

    #[test]
    fn find_exec_span() {
        assert_eq!(
            extract("find", &toks(&[".", "-exec", "rm", "-rf", "build", ";", "-print"]), None),
            vec!["rm -rf build"]
        );
    }

    #[test]
    fn exec_spans_multiple() {
        let args = [".", "-exec", "echo", "-delete", "+", "-ok", "ls", ";"];
        assert_eq!(exec_spans(&args), vec![2..4, 6..7]);
    }

    #[test]
    fn exec_span_unterminated_runs_to_end() {
        let args = [".", "-exec", "echo"];
        assert_eq!(exec_spans(&args), vec![2..3]);
    }
}
