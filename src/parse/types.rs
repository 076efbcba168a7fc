//! Types produced by the tokenizer and consumed by the canonicalizer and eval layer.

use std::borrow::Cow;

/// What a token is, syntactically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// An ordinary word (program name, argument, assignment).
    Word,
    /// A redirection operator such as `>`, `2>&`, `<<` or `<<<`.
    ///
    /// The redirect target is the following `Word` token. For here-documents
    /// the body text is carried here so it never becomes a command.
    Redirect { heredoc: Option<String> },
}

/// One word of a tokenized command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Literal value with quotes removed and escapes resolved.
    pub value: String,
    pub kind: TokenKind,
    /// Inner text of every `$(...)`, backtick, or process substitution
    /// found in this token (and, for heredocs, in the body).
    pub substitutions: Vec<String>,
    /// Byte offset in `value` where quoted or escaped content first appears.
    pub(crate) quote_start: Option<usize>,
}

impl Token {
    /// A plain unquoted word.
    pub fn word(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: TokenKind::Word,
            substitutions: Vec::new(),
            quote_start: None,
        }
    }

    /// Whether any part of this token came from quotes or a backslash escape.
    pub fn quoted(&self) -> bool {
        self.quote_start.is_some()
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.kind, TokenKind::Redirect { .. })
    }

    /// `NAME=value` where the name and `=` are unquoted.
    pub fn is_assignment(&self) -> bool {
        if !self.is_word() {
            return false;
        }
        let Some(eq) = self.value.find('=') else {
            return false;
        };
        if self.quote_start.is_some_and(|q| q <= eq) {
            return false;
        }
        let name = &self.value[..eq];
        name.chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Shell-safe rendering of this token for display.
    pub fn display(&self) -> Cow<'_, str> {
        if self.is_redirect() {
            return Cow::Borrowed(&self.value);
        }
        shlex::try_quote(&self.value).unwrap_or(Cow::Borrowed(&self.value))
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

/// One command between separators (`;`, `&&`, `||`, `|`, `|&`, `&`, newline).
///
/// Never empty: the tokenizer drops empty commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCommand {
    pub tokens: Vec<Token>,
    /// Stdin is the output of the previous command (`|` or `|&`).
    pub piped_in: bool,
}

impl SimpleCommand {
    /// Token values in order.
    pub fn words(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.value.as_str()).collect()
    }

    /// Shell-quoted rendering of the whole command.
    pub fn display(&self) -> String {
        render(&self.tokens)
    }
}

/// Render tokens back into a single shell-quoted line.
pub fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.display())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lexical failure: the input cannot be split into words unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unterminated {quote} quote starting at offset {offset}")]
    UnterminatedQuote { quote: char, offset: usize },
    #[error("trailing backslash at offset {offset}")]
    UnterminatedEscape { offset: usize },
    #[error("unterminated command substitution starting at offset {offset}")]
    UnterminatedSubstitution { offset: usize },
    #[error("unterminated parameter expansion starting at offset {offset}")]
    UnterminatedExpansion { offset: usize },
    #[error("here-document operator at offset {offset} has no delimiter")]
    MissingHeredocDelimiter { offset: usize },
    #[error("here-document delimited by {delimiter:?} is never closed")]
    UnterminatedHeredoc { delimiter: String },
}
