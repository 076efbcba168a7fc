pub mod canonical;
pub mod embedded;
pub mod tokenize;
pub mod types;

pub use canonical::{CanonicalCommand, Canonicalizer, program_name};
pub use tokenize::tokenize;
pub use types::{ParseError, SimpleCommand, Token, TokenKind, render};
