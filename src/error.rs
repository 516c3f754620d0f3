//! Expression evaluation errors with source-context formatting

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in expression source text
pub type Span = std::ops::Range<usize>;

/// Errors raised while parsing or evaluating a `${...}` expression
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("syntax error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },

    #[error("unterminated ${{...}} interpolation span")]
    UnterminatedInterpolation,

    #[error("unknown variable: {name}")]
    UnknownVariable { name: String },

    #[error("unknown property: {property}")]
    UnknownProperty { property: String },

    #[error("index {index} out of bounds (length {length})")]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },

    #[error("integer overflow in '{symbol}'")]
    IntegerOverflow { symbol: String },

    #[error("unknown filter: {name}")]
    UnknownFilter { name: String },
}

impl EvalError {
    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            EvalError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let mut buf = Vec::new();
                Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf)
                    .unwrap();
                String::from_utf8(buf).unwrap()
            }
            other => other.to_string(),
        }
    }
}

impl<'a> From<chumsky::error::Rich<'a, crate::eval::lexer::Token>> for EvalError {
    fn from(err: chumsky::error::Rich<'a, crate::eval::lexer::Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(tok) => format!("unexpected {}", format_token(tok)),
                None => "unexpected end of expression".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of expression".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        EvalError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &crate::eval::lexer::Token) -> String {
    use crate::eval::lexer::Token;
    match tok {
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::String(s) => format!("string \"{}\"", s),
        Token::Int(n) => format!("number {}", n),
        Token::Float(n) => format!("number {}", n),
        Token::True => "keyword 'true'".to_string(),
        Token::False => "keyword 'false'".to_string(),
        Token::Null => "keyword 'null'".to_string(),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::Percent => "'%'".to_string(),
        Token::Pipe => "'|'".to_string(),
        Token::Bang => "'!'".to_string(),
        Token::Question => "'?'".to_string(),
        Token::EqEq => "'=='".to_string(),
        Token::NotEq => "'!='".to_string(),
        Token::Less => "'<'".to_string(),
        Token::LessEq => "'<='".to_string(),
        Token::Greater => "'>'".to_string(),
        Token::GreaterEq => "'>='".to_string(),
        Token::AndAnd => "'&&'".to_string(),
        Token::OrOr => "'||'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::BracketOpen => "'['".to_string(),
        Token::BracketClose => "']'".to_string(),
        Token::BraceOpen => "'{'".to_string(),
        Token::BraceClose => "'}'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Colon => "':'".to_string(),
        Token::Dot => "'.'".to_string(),
    }
}
