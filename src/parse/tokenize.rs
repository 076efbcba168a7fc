//! Shell-aware tokenizer: raw command line → ordered simple commands.
//!
//! Splits at unquoted `;`, `&&`, `||`, `|`, `|&`, `&`, newline, and subshell
//! parentheses. Quote removal follows POSIX rules: single quotes are literal,
//! double quotes honour `\$`, `` \` ``, `\"`, `\\` and backslash-newline only.
//! Redirection operators become their own tokens and never split commands.
//!
//! Anything that cannot be lexed unambiguously (unterminated quote, trailing
//! backslash, unclosed substitution or here-document) is a [`ParseError`];
//! there is no best-effort fallback.

use super::types::{ParseError, SimpleCommand, Token, TokenKind};

/// Split `raw` into simple commands.
pub fn tokenize(raw: &str) -> Result<Vec<SimpleCommand>, ParseError> {
    Lexer::new(raw).run()
}

#[derive(Debug, Default)]
struct WordBuf {
    value: String,
    quote_start: Option<usize>,
    substitutions: Vec<String>,
}

impl WordBuf {
    fn mark_quoted(&mut self) {
        if self.quote_start.is_none() {
            self.quote_start = Some(self.value.len());
        }
    }

    fn push_quoted(&mut self, c: char) {
        self.mark_quoted();
        self.value.push(c);
    }

    fn push_substitution(&mut self, literal: &str, inner: String) {
        self.value.push_str(literal);
        if !inner.trim().is_empty() {
            self.substitutions.push(inner.trim().to_string());
        }
    }
}

/// A `<<` operator whose delimiter word has not been read yet.
#[derive(Debug)]
struct AwaitingDelimiter {
    token: usize,
    strip_tabs: bool,
    offset: usize,
}

/// A here-document whose body starts after the next newline.
#[derive(Debug)]
struct PendingHeredoc {
    command: usize,
    token: usize,
    delimiter: String,
    strip_tabs: bool,
    expand: bool,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    commands: Vec<SimpleCommand>,
    current: Vec<Token>,
    word: Option<WordBuf>,
    awaiting: Option<AwaitingDelimiter>,
    heredocs: Vec<PendingHeredoc>,
    /// The next command reads the previous one's output.
    piped: bool,
}

impl Lexer {
    fn new(raw: &str) -> Self {
        Self {
            chars: raw.chars().collect(),
            pos: 0,
            commands: Vec::new(),
            current: Vec::new(),
            word: None,
            awaiting: None,
            heredocs: Vec::new(),
            piped: false,
        }
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn word_mut(&mut self) -> &mut WordBuf {
        self.word.get_or_insert_with(WordBuf::default)
    }

    fn run(mut self) -> Result<Vec<SimpleCommand>, ParseError> {
        while let Some(c) = self.peek(0) {
            match c {
                ' ' | '\t' | '\r' => {
                    self.finish_word();
                    self.pos += 1;
                }
                '\n' => {
                    self.pos += 1;
                    self.end_command()?;
                    self.read_heredocs()?;
                }
                '#' if self.word.is_none() => self.skip_comment(),
                '\\' => self.read_escape()?,
                '\'' => self.read_single_quoted()?,
                '"' => self.read_double_quoted()?,
                '`' => {
                    let inner = self.read_backtick()?;
                    let literal = format!("`{inner}`");
                    self.word_mut().push_substitution(&literal, inner);
                }
                '$' => self.read_dollar()?,
                ';' | '(' | ')' => {
                    self.pos += 1;
                    self.end_command()?;
                }
                '&' => match self.peek(1) {
                    Some('&') => {
                        self.pos += 2;
                        self.end_command()?;
                    }
                    Some('>') => self.read_redirect(),
                    _ => {
                        self.pos += 1;
                        self.end_command()?;
                    }
                },
                '|' => {
                    let or = self.peek(1) == Some('|');
                    self.pos += if matches!(self.peek(1), Some('|' | '&')) { 2 } else { 1 };
                    self.end_command()?;
                    self.piped = !or;
                }
                '<' | '>' if self.peek(1) == Some('(') => {
                    let inner = self.read_parenthesized(2)?;
                    let literal = format!("{c}({inner})");
                    self.word_mut().push_substitution(&literal, inner);
                }
                '<' | '>' => self.read_redirect(),
                _ => {
                    self.word_mut().value.push(c);
                    self.pos += 1;
                }
            }
        }

        self.end_command()?;
        if let Some(pending) = self.heredocs.first() {
            return Err(ParseError::UnterminatedHeredoc {
                delimiter: pending.delimiter.clone(),
            });
        }
        Ok(self.commands)
    }

    fn finish_word(&mut self) {
        let Some(word) = self.word.take() else {
            return;
        };
        let expand = word.quote_start.is_none();
        let token = Token {
            value: word.value,
            kind: TokenKind::Word,
            substitutions: word.substitutions,
            quote_start: word.quote_start,
        };
        if let Some(awaiting) = self.awaiting.take() {
            self.heredocs.push(PendingHeredoc {
                command: self.commands.len(),
                token: awaiting.token,
                delimiter: token.value.clone(),
                strip_tabs: awaiting.strip_tabs,
                expand,
            });
        }
        self.current.push(token);
    }

    fn end_command(&mut self) -> Result<(), ParseError> {
        self.finish_word();
        if let Some(awaiting) = self.awaiting.take() {
            return Err(ParseError::MissingHeredocDelimiter {
                offset: awaiting.offset,
            });
        }
        if !self.current.is_empty() {
            self.commands.push(SimpleCommand {
                tokens: std::mem::take(&mut self.current),
                piped_in: std::mem::take(&mut self.piped),
            });
        }
        Ok(())
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn read_escape(&mut self) -> Result<(), ParseError> {
        match self.peek(1) {
            None => Err(ParseError::UnterminatedEscape { offset: self.pos }),
            Some('\n') => {
                self.pos += 2;
                Ok(())
            }
            Some(c) => {
                self.word_mut().push_quoted(c);
                self.pos += 2;
                Ok(())
            }
        }
    }

    fn read_single_quoted(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let close = self.chars[start + 1..]
            .iter()
            .position(|&c| c == '\'')
            .map(|n| start + 1 + n)
            .ok_or(ParseError::UnterminatedQuote {
                quote: '\'',
                offset: start,
            })?;
        let content: String = self.chars[start + 1..close].iter().collect();
        let word = self.word_mut();
        word.mark_quoted();
        word.value.push_str(&content);
        self.pos = close + 1;
        Ok(())
    }

    fn read_double_quoted(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let unterminated = ParseError::UnterminatedQuote {
            quote: '"',
            offset: start,
        };
        self.pos += 1;
        self.word_mut().mark_quoted();
        loop {
            let Some(c) = self.peek(0) else {
                return Err(unterminated);
            };
            match c {
                '"' => {
                    self.pos += 1;
                    return Ok(());
                }
                '\\' => match self.peek(1) {
                    None => return Err(unterminated),
                    Some('\n') => self.pos += 2,
                    Some(next @ ('$' | '`' | '"' | '\\')) => {
                        self.word_mut().value.push(next);
                        self.pos += 2;
                    }
                    Some(_) => {
                        self.word_mut().value.push('\\');
                        self.pos += 1;
                    }
                },
                '$' if self.peek(1) == Some('(') => {
                    let inner = self.read_parenthesized(2)?;
                    let literal = format!("$({inner})");
                    self.word_mut().push_substitution(&literal, inner);
                }
                '$' if self.peek(1) == Some('{') => {
                    let (literal, subs) = self.read_braced_expansion()?;
                    let word = self.word_mut();
                    word.value.push_str(&literal);
                    word.substitutions.extend(subs);
                }
                '`' => {
                    let inner = self.read_backtick()?;
                    let literal = format!("`{inner}`");
                    self.word_mut().push_substitution(&literal, inner);
                }
                _ => {
                    self.word_mut().value.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn read_dollar(&mut self) -> Result<(), ParseError> {
        match self.peek(1) {
            Some('(') => {
                let inner = self.read_parenthesized(2)?;
                let literal = format!("$({inner})");
                self.word_mut().push_substitution(&literal, inner);
            }
            Some('{') => {
                let (literal, subs) = self.read_braced_expansion()?;
                let word = self.word_mut();
                word.value.push_str(&literal);
                word.substitutions.extend(subs);
            }
            Some('\'') => self.read_ansi_c_quoted()?,
            Some('"') => {
                self.pos += 1;
                self.read_double_quoted()?;
            }
            _ => {
                self.word_mut().value.push('$');
                self.pos += 1;
            }
        }
        Ok(())
    }

    /// Read a balanced `(...)` body starting `open_len` chars from `pos`
    /// (`$(` and `<(` both have `open_len == 2`). Returns the inner text.
    fn read_parenthesized(&mut self, open_len: usize) -> Result<String, ParseError> {
        let start = self.pos;
        self.pos += open_len;
        let mut depth: u32 = 1;
        let mut inner = String::new();
        let (mut sq, mut dq, mut esc) = (false, false, false);

        loop {
            let Some(c) = self.peek(0) else {
                return Err(ParseError::UnterminatedSubstitution { offset: start });
            };
            self.pos += 1;
            if esc {
                esc = false;
            } else if c == '\\' && !sq {
                esc = true;
            } else if c == '\'' && !dq {
                sq = !sq;
            } else if c == '"' && !sq {
                dq = !dq;
            } else if !sq && !dq {
                if c == '(' {
                    depth += 1;
                } else if c == ')' {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(inner);
                    }
                }
            }
            inner.push(c);
        }
    }

    /// Read a backtick substitution. Returns the inner text with `` \` ``,
    /// `\\` and `\$` unescaped.
    fn read_backtick(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut inner = String::new();
        loop {
            match self.peek(0) {
                None => return Err(ParseError::UnterminatedSubstitution { offset: start }),
                Some('`') => {
                    self.pos += 1;
                    return Ok(inner);
                }
                Some('\\') => match self.peek(1) {
                    Some(next @ ('`' | '\\' | '$')) => {
                        inner.push(next);
                        self.pos += 2;
                    }
                    _ => {
                        inner.push('\\');
                        self.pos += 1;
                    }
                },
                Some(c) => {
                    inner.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    /// Read `${...}` as literal text, collecting any `$(...)` nested inside.
    fn read_braced_expansion(&mut self) -> Result<(String, Vec<String>), ParseError> {
        let start = self.pos;
        self.pos += 2;
        let mut literal = String::from("${");
        let mut subs = Vec::new();
        let mut depth: u32 = 1;
        loop {
            let Some(c) = self.peek(0) else {
                return Err(ParseError::UnterminatedExpansion { offset: start });
            };
            match c {
                '\\' => {
                    literal.push(c);
                    if let Some(next) = self.peek(1) {
                        literal.push(next);
                    }
                    self.pos += 2;
                }
                '$' if self.peek(1) == Some('(') => {
                    let inner = self.read_parenthesized(2)?;
                    literal.push_str(&format!("$({inner})"));
                    if !inner.trim().is_empty() {
                        subs.push(inner.trim().to_string());
                    }
                }
                _ => {
                    literal.push(c);
                    self.pos += 1;
                    if c == '{' {
                        depth += 1;
                    } else if c == '}' {
                        depth -= 1;
                        if depth == 0 {
                            return Ok((literal, subs));
                        }
                    }
                }
            }
        }
    }

    fn read_ansi_c_quoted(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let unterminated = ParseError::UnterminatedQuote {
            quote: '\'',
            offset: start,
        };
        self.pos += 2;
        self.word_mut().mark_quoted();
        loop {
            match self.peek(0) {
                None => return Err(unterminated),
                Some('\'') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some('\\') => {
                    let Some(next) = self.peek(1) else {
                        return Err(unterminated);
                    };
                    let word = self.word_mut();
                    match next {
                        'n' => word.value.push('\n'),
                        't' => word.value.push('\t'),
                        'r' => word.value.push('\r'),
                        'a' => word.value.push('\x07'),
                        'e' | 'E' => word.value.push('\x1b'),
                        '\\' | '\'' | '"' | '?' => word.value.push(next),
                        other => {
                            word.value.push('\\');
                            word.value.push(other);
                        }
                    }
                    self.pos += 2;
                }
                Some(c) => {
                    self.word_mut().value.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    /// Emit a redirection operator token (`>`, `>>`, `2>&`, `<<-`, `&>`, ...).
    fn read_redirect(&mut self) {
        let offset = self.pos;
        // A word made only of unquoted digits right before the operator is
        // its file descriptor (`2>`), not an argument.
        let is_fd = self.word.as_ref().is_some_and(|w| {
            w.quote_start.is_none()
                && w.substitutions.is_empty()
                && !w.value.is_empty()
                && w.value.chars().all(|c| c.is_ascii_digit())
        });
        let fd_prefix = if is_fd {
            self.word.take().map(|w| w.value)
        } else {
            self.finish_word();
            None
        };

        let mut op = fd_prefix.unwrap_or_default();
        let first = self.peek(0).unwrap_or('>');
        op.push(first);
        self.pos += 1;

        match first {
            '&' => {
                // &> or &>>
                op.push('>');
                self.pos += 1;
                if self.peek(0) == Some('>') {
                    op.push('>');
                    self.pos += 1;
                }
            }
            '>' => {
                if let Some(next @ ('>' | '&' | '|')) = self.peek(0) {
                    op.push(next);
                    self.pos += 1;
                }
            }
            _ => match self.peek(0) {
                Some('<') => {
                    op.push('<');
                    self.pos += 1;
                    if let Some(next @ ('<' | '-')) = self.peek(0) {
                        op.push(next);
                        self.pos += 1;
                    }
                }
                Some(next @ ('&' | '>')) => {
                    op.push(next);
                    self.pos += 1;
                }
                _ => {}
            },
        }

        let heredoc = (op.ends_with("<<") && !op.ends_with("<<<")) || op.ends_with("<<-");
        self.current.push(Token {
            value: op.clone(),
            kind: TokenKind::Redirect { heredoc: None },
            substitutions: Vec::new(),
            quote_start: None,
        });
        if heredoc {
            self.awaiting = Some(AwaitingDelimiter {
                token: self.current.len() - 1,
                strip_tabs: op.ends_with('-'),
                offset,
            });
        }
    }

    /// Consume the bodies of every here-document opened on the line just ended.
    fn read_heredocs(&mut self) -> Result<(), ParseError> {
        for pending in std::mem::take(&mut self.heredocs) {
            let mut body = String::new();
            loop {
                if self.pos >= self.chars.len() {
                    return Err(ParseError::UnterminatedHeredoc {
                        delimiter: pending.delimiter,
                    });
                }
                let end = self.chars[self.pos..]
                    .iter()
                    .position(|&c| c == '\n')
                    .map_or(self.chars.len(), |n| self.pos + n);
                let line: String = self.chars[self.pos..end].iter().collect();
                self.pos = (end + 1).min(self.chars.len());
                let line = if pending.strip_tabs {
                    line.trim_start_matches('\t')
                } else {
                    line.as_str()
                };
                if line == pending.delimiter {
                    break;
                }
                body.push_str(line);
                body.push('\n');
            }

            let subs = if pending.expand {
                heredoc_substitutions(&body)?
            } else {
                Vec::new()
            };
            if let Some(token) = self
                .commands
                .get_mut(pending.command)
                .and_then(|cmd| cmd.tokens.get_mut(pending.token))
            {
                token.substitutions.extend(subs);
                token.kind = TokenKind::Redirect {
                    heredoc: Some(body),
                };
            }
        }
        Ok(())
    }
}

/// Substitutions inside an unquoted-delimiter here-document body.
fn heredoc_substitutions(body: &str) -> Result<Vec<String>, ParseError> {
    let mut lexer = Lexer::new(body);
    let mut found = Vec::new();
    while let Some(c) = lexer.peek(0) {
        let inner = match c {
            '\\' => {
                lexer.pos += 2;
                continue;
            }
            '$' if lexer.peek(1) == Some('(') => lexer.read_parenthesized(2)?,
            '`' => lexer.read_backtick()?,
            _ => {
                lexer.pos += 1;
                continue;
            }
        };
        if !inner.trim().is_empty() {
            found.push(inner.trim().to_string());
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(raw: &str) -> Vec<Vec<String>> {
        tokenize(raw)
            .unwrap()
            .iter()
            .map(|cmd| cmd.tokens.iter().map(|t| t.value.clone()).collect())
            .collect()
    }

    #[test]
    fn simple_words() {
        assert_eq!(words("ls -la /tmp"), vec![vec!["ls", "-la", "/tmp"]]);
    }

    #[test]
    fn single_quotes_are_one_token() {
        assert_eq!(words("echo 'hello  world'"), vec![vec!["echo", "hello  world"]]);
    }

    #[test]
    fn double_quotes_are_one_token() {
        assert_eq!(
            words("echo \"find . -name *.pyc -delete\""),
            vec![vec!["echo", "find . -name *.pyc -delete"]]
        );
    }

    #[test]
    fn double_quote_escapes() {
        assert_eq!(
            words(r#"echo "a\"b\$c\\d\e""#),
            vec![vec!["echo", r#"a"b$c\d\e"#]]
        );
    }

    #[test]
    fn single_quotes_keep_backslashes() {
        assert_eq!(words(r"echo 'a\nb'"), vec![vec!["echo", r"a\nb"]]);
    }

    #[test]
    fn unquoted_backslash_escapes_next_char() {
        assert_eq!(words(r"find . -exec echo \; -print"), vec![vec![
            "find", ".", "-exec", "echo", ";", "-print"
        ]]);
    }

    #[test]
    fn escaped_token_is_quoted() {
        let cmds = tokenize(r"\rm x").unwrap();
        assert_eq!(cmds[0].tokens[0].value, "rm");
        assert!(cmds[0].tokens[0].quoted());
        assert!(!cmds[0].tokens[1].quoted());
    }

    #[test]
    fn empty_quotes_produce_empty_token() {
        assert_eq!(words("echo ''"), vec![vec!["echo", ""]]);
    }

    #[test]
    fn separators_split_commands() {
        assert_eq!(
            words("a; b && c || d | e |& f & g\nh"),
            vec![
                vec!["a"],
                vec!["b"],
                vec!["c"],
                vec!["d"],
                vec!["e"],
                vec!["f"],
                vec!["g"],
                vec!["h"]
            ]
        );
    }

    #[test]
    fn pipes_mark_the_reading_command() {
        let cmds = tokenize("a | b |& c || d; e").unwrap();
        let piped: Vec<_> = cmds.iter().map(|c| c.piped_in).collect();
        assert_eq!(piped, vec![false, true, true, false, false]);

        let cmds = tokenize("cat <<EOF | bash\ngit stash clear\nEOF").unwrap();
        assert_eq!(cmds.len(), 2);
        assert!(!cmds[0].piped_in);
        assert!(cmds[1].piped_in);
    }

    #[test]
    fn separators_inside_quotes_do_not_split() {
        assert_eq!(words("echo 'a && b; c'"), vec![vec!["echo", "a && b; c"]]);
    }

    #[test]
    fn empty_commands_dropped() {
        assert_eq!(words(";; ls ;"), vec![vec!["ls"]]);
    }

    #[test]
    fn subshell_parens_split() {
        assert_eq!(
            words("(cd repo && git status)"),
            vec![vec!["cd", "repo"], vec!["git", "status"]]
        );
    }

    #[test]
    fn redirections_are_tokens_not_separators() {
        let cmds = tokenize("git push 2>&1 >/dev/null").unwrap();
        assert_eq!(cmds.len(), 1);
        let values: Vec<_> = cmds[0].words();
        assert_eq!(values, vec!["git", "push", "2>&", "1", ">", "/dev/null"]);
        assert!(cmds[0].tokens[2].is_redirect());
        assert!(cmds[0].tokens[3].is_word());
    }

    #[test]
    fn ampersand_redirect_not_separator() {
        assert_eq!(words("cmd &> log"), vec![vec!["cmd", "&>", "log"]]);
    }

    #[test]
    fn redirect_glued_to_word() {
        assert_eq!(
            words("git reset --hard>/dev/null"),
            vec![vec!["git", "reset", "--hard", ">", "/dev/null"]]
        );
    }

    #[test]
    fn comment_skipped() {
        assert_eq!(words("git status # ; rm -rf /"), vec![vec!["git", "status"]]);
    }

    #[test]
    fn hash_inside_word_is_literal() {
        assert_eq!(words("echo a#b"), vec![vec!["echo", "a#b"]]);
    }

    #[test]
    fn line_continuation() {
        assert_eq!(words("git reset \\\n--hard"), vec![vec!["git", "reset", "--hard"]]);
    }

    #[test]
    fn ansi_c_quotes() {
        assert_eq!(words(r"echo $'a\tb\'c'"), vec![vec!["echo", "a\tb'c"]]);
    }

    #[test]
    fn dollar_paren_substitution_recorded() {
        let cmds = tokenize("echo $(git reset --hard; ls) done").unwrap();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].tokens[1].value, "$(git reset --hard; ls)");
        assert_eq!(cmds[0].tokens[1].substitutions, vec!["git reset --hard; ls"]);
    }

    #[test]
    fn substitution_in_double_quotes_recorded() {
        let cmds = tokenize("echo \"x $(rm -rf /) y\"").unwrap();
        assert_eq!(cmds[0].tokens[1].substitutions, vec!["rm -rf /"]);
    }

    #[test]
    fn substitution_in_single_quotes_ignored() {
        let cmds = tokenize("echo '$(rm -rf /)'").unwrap();
        assert!(cmds[0].tokens[1].substitutions.is_empty());
    }

    #[test]
    fn backtick_substitution_recorded() {
        let cmds = tokenize("echo `whoami`").unwrap();
        assert_eq!(cmds[0].tokens[1].substitutions, vec!["whoami"]);
    }

    #[test]
    fn process_substitution_recorded() {
        let cmds = tokenize("diff <(sort a) <(sort b)").unwrap();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].tokens[1].substitutions, vec!["sort a"]);
        assert_eq!(cmds[0].tokens[2].substitutions, vec!["sort b"]);
    }

    #[test]
    fn braced_expansion_is_literal() {
        assert_eq!(words("rm -rf ${HOME}/x"), vec![vec!["rm", "-rf", "${HOME}/x"]]);
    }

    #[test]
    fn heredoc_body_is_not_tokenized() {
        let cmds = tokenize("cat <<EOF\nfind . -delete\nEOF\necho done").unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(
            cmds[0].tokens[1].kind,
            TokenKind::Redirect {
                heredoc: Some("find . -delete\n".into())
            }
        );
        assert_eq!(cmds[1].words(), vec!["echo", "done"]);
    }

    #[test]
    fn heredoc_tab_stripping() {
        let cmds = tokenize("cat <<-END\n\tbody\n\tEND").unwrap();
        assert_eq!(
            cmds[0].tokens[1].kind,
            TokenKind::Redirect {
                heredoc: Some("body\n".into())
            }
        );
    }

    #[test]
    fn heredoc_unquoted_delimiter_collects_substitutions() {
        let cmds = tokenize("cat <<EOF\n$(git stash clear)\nEOF").unwrap();
        assert_eq!(cmds[0].tokens[1].substitutions, vec!["git stash clear"]);
    }

    #[test]
    fn heredoc_quoted_delimiter_is_inert() {
        let cmds = tokenize("cat <<'EOF'\n$(git stash clear)\nEOF").unwrap();
        assert!(cmds[0].tokens[1].substitutions.is_empty());
    }

    #[test]
    fn herestring_is_redirect() {
        assert_eq!(words("bash <<< 'ls'"), vec![vec!["bash", "<<<", "ls"]]);
    }

    #[test]
    fn unterminated_single_quote() {
        assert_eq!(
            tokenize("git reset --hard 'unterminated"),
            Err(ParseError::UnterminatedQuote {
                quote: '\'',
                offset: 17
            })
        );
    }

    #[test]
    fn unterminated_double_quote() {
        assert!(matches!(
            tokenize("echo \"abc"),
            Err(ParseError::UnterminatedQuote { quote: '"', .. })
        ));
    }

    #[test]
    fn trailing_backslash() {
        assert_eq!(
            tokenize("echo abc\\"),
            Err(ParseError::UnterminatedEscape { offset: 8 })
        );
    }

    #[test]
    fn unterminated_substitution() {
        assert!(matches!(
            tokenize("echo $(ls"),
            Err(ParseError::UnterminatedSubstitution { .. })
        ));
    }

    #[test]
    fn unterminated_heredoc() {
        assert!(matches!(
            tokenize("cat <<EOF\nbody"),
            Err(ParseError::UnterminatedHeredoc { .. })
        ));
    }

    #[test]
    fn heredoc_without_delimiter() {
        assert!(matches!(
            tokenize("cat << ; ls"),
            Err(ParseError::MissingHeredocDelimiter { .. })
        ));
    }

    #[test]
    fn assignment_detection() {
        let cmds = tokenize("FOO=\"a b\" 'BAR=x' git").unwrap();
        assert!(cmds[0].tokens[0].is_assignment());
        assert!(!cmds[0].tokens[1].is_assignment());
        assert!(!cmds[0].tokens[2].is_assignment());
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \n  ").unwrap().is_empty());
    }

    proptest::proptest! {
        #[test]
        fn never_panics_and_never_yields_empty_commands(raw in "\\PC{0,80}") {
            if let Ok(commands) = tokenize(&raw) {
                proptest::prop_assert!(commands.iter().all(|c| !c.tokens.is_empty()));
            }
        }

        #[test]
        fn shell_syntax_soup_never_panics(
            raw in r#"[a-z $`'"\\;&|()<>#{}=\n-]{0,60}"#
        ) {
            let _ = tokenize(&raw);
        }
    }
}
