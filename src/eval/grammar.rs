//! Expression parser using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::EvalError;
use crate::eval::ast::{BinaryOp, Expr, UnaryOp};
use crate::eval::lexer::Token;
use crate::value::Value;

/// Parse a single interpolation expression into an AST
pub fn parse(input: &str) -> Result<Expr, Vec<EvalError>> {
    let len = input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = crate::eval::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    expression_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// A postfix access applied to an atom
#[derive(Debug, Clone)]
enum Postfix {
    Property(String),
    Index(Expr),
}

fn expression_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|expr| {
        let literal = select! {
            Token::Int(n) => Expr::Literal(Value::Int(n)),
            Token::Float(n) => Expr::Literal(Value::Float(n)),
            Token::String(s) => Expr::Literal(Value::String(s)),
            Token::True => Expr::Literal(Value::Bool(true)),
            Token::False => Expr::Literal(Value::Bool(false)),
            Token::Null => Expr::Literal(Value::Null),
        };

        let identifier = select! {
            Token::Ident(s) => s,
        };

        let list = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
            .map(Expr::List);

        // Map keys are bare identifiers or quoted strings
        let map_key = choice((
            identifier.clone(),
            select! { Token::String(s) => s },
        ));
        let map = map_key
            .then_ignore(just(Token::Colon))
            .then(expr.clone())
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BraceOpen), just(Token::BraceClose))
            .map(Expr::Map);

        let atom = choice((
            literal,
            identifier.clone().map(Expr::Variable),
            list,
            map,
            expr.clone()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
        ));

        // Postfix chain: .name and [index]
        let postfix = choice((
            just(Token::Dot)
                .ignore_then(identifier.clone())
                .map(Postfix::Property),
            expr.clone()
                .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
                .map(Postfix::Index),
        ));
        let access = atom
            .then(postfix.repeated().collect::<Vec<_>>())
            .map(|(base, accesses)| {
                accesses.into_iter().fold(base, |object, access| match access {
                    Postfix::Property(name) => Expr::Property {
                        object: Box::new(object),
                        name,
                    },
                    Postfix::Index(index) => Expr::Index {
                        object: Box::new(object),
                        index: Box::new(index),
                    },
                })
            });

        // Prefix operators
        let unary_op = choice((
            just(Token::Minus).to(UnaryOp::Neg),
            just(Token::Bang).to(UnaryOp::Not),
        ));
        let unary = unary_op
            .repeated()
            .collect::<Vec<_>>()
            .then(access)
            .map(|(ops, operand)| {
                ops.into_iter().rev().fold(operand, |operand, op| Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            });

        let product = binary_chain(
            unary,
            choice((
                just(Token::Star).to(BinaryOp::Mul),
                just(Token::Slash).to(BinaryOp::Div),
                just(Token::Percent).to(BinaryOp::Rem),
            )),
        );

        let sum = binary_chain(
            product,
            choice((
                just(Token::Plus).to(BinaryOp::Add),
                just(Token::Minus).to(BinaryOp::Sub),
            )),
        );

        let comparison = binary_chain(
            sum,
            choice((
                just(Token::EqEq).to(BinaryOp::Eq),
                just(Token::NotEq).to(BinaryOp::NotEq),
                just(Token::LessEq).to(BinaryOp::LessEq),
                just(Token::GreaterEq).to(BinaryOp::GreaterEq),
                just(Token::Less).to(BinaryOp::Less),
                just(Token::Greater).to(BinaryOp::Greater),
            )),
        );

        let logical = binary_chain(
            comparison,
            choice((
                just(Token::AndAnd).to(BinaryOp::And),
                just(Token::OrOr).to(BinaryOp::Or),
            )),
        );

        // Pipeline: expr | filter or expr | filter(args)
        let filter = identifier
            .then(
                expr.clone()
                    .separated_by(just(Token::Comma))
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::ParenOpen), just(Token::ParenClose))
                    .or_not(),
            )
            .map(|(name, args)| (name, args.unwrap_or_default()));
        let piped = logical
            .then(
                just(Token::Pipe)
                    .ignore_then(filter)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(|(base, filters)| {
                filters.into_iter().fold(base, |input, (filter, args)| Expr::Pipeline {
                    input: Box::new(input),
                    filter,
                    args,
                })
            });

        // Conditional has the lowest precedence
        piped
            .then(
                just(Token::Question)
                    .ignore_then(expr.clone())
                    .then_ignore(just(Token::Colon))
                    .then(expr.clone())
                    .or_not(),
            )
            .map(|(condition, tail)| match tail {
                Some((then, otherwise)) => Expr::Conditional {
                    condition: Box::new(condition),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                },
                None => condition,
            })
    })
}

/// Left-associative chain of binary operators at one precedence level
fn binary_chain<'a, I, P, O>(
    operand: P,
    op: O,
) -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
    P: Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone,
    O: Parser<'a, I, BinaryOp, extra::Err<Rich<'a, Token>>> + Clone,
{
    operand
        .clone()
        .then(op.then(operand).repeated().collect::<Vec<_>>())
        .map(|(first, rest)| {
            rest.into_iter().fold(first, |left, (op, right)| Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Expr {
        parse(input).expect("Should parse")
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_ok("42"), Expr::Literal(Value::Int(42)));
        assert_eq!(
            parse_ok("'hi'"),
            Expr::Literal(Value::String("hi".to_string()))
        );
    }

    #[test]
    fn test_parse_variable() {
        assert_eq!(parse_ok("name"), Expr::Variable("name".to_string()));
    }

    #[test]
    fn test_parse_property_chain() {
        assert_eq!(
            parse_ok("user.address.city"),
            Expr::Property {
                object: Box::new(Expr::Property {
                    object: Box::new(Expr::Variable("user".to_string())),
                    name: "address".to_string(),
                }),
                name: "city".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(
            parse_ok("items[0]"),
            Expr::Index {
                object: Box::new(Expr::Variable("items".to_string())),
                index: Box::new(Expr::Literal(Value::Int(0))),
            }
        );
    }

    #[test]
    fn test_precedence_product_over_sum() {
        assert_eq!(
            parse_ok("1 + 2 * 3"),
            Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::Literal(Value::Int(1))),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: Box::new(Expr::Literal(Value::Int(2))),
                    right: Box::new(Expr::Literal(Value::Int(3))),
                }),
            }
        );
    }

    #[test]
    fn test_parens_override_precedence() {
        assert_eq!(
            parse_ok("(1 + 2) * 3"),
            Expr::Binary {
                op: BinaryOp::Mul,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Add,
                    left: Box::new(Expr::Literal(Value::Int(1))),
                    right: Box::new(Expr::Literal(Value::Int(2))),
                }),
                right: Box::new(Expr::Literal(Value::Int(3))),
            }
        );
    }

    #[test]
    fn test_parse_pipeline() {
        assert_eq!(
            parse_ok("name | upper"),
            Expr::Pipeline {
                input: Box::new(Expr::Variable("name".to_string())),
                filter: "upper".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_parse_pipeline_with_args() {
        assert_eq!(
            parse_ok("items | join(', ')"),
            Expr::Pipeline {
                input: Box::new(Expr::Variable("items".to_string())),
                filter: "join".to_string(),
                args: vec![Expr::Literal(Value::String(", ".to_string()))],
            }
        );
    }

    #[test]
    fn test_parse_conditional() {
        assert_eq!(
            parse_ok("ok ? 'yes' : 'no'"),
            Expr::Conditional {
                condition: Box::new(Expr::Variable("ok".to_string())),
                then: Box::new(Expr::Literal(Value::String("yes".to_string()))),
                otherwise: Box::new(Expr::Literal(Value::String("no".to_string()))),
            }
        );
    }

    #[test]
    fn test_parse_list_and_map_literals() {
        assert_eq!(
            parse_ok("[1, 2]"),
            Expr::List(vec![
                Expr::Literal(Value::Int(1)),
                Expr::Literal(Value::Int(2)),
            ])
        );
        assert_eq!(
            parse_ok("{a: 1}"),
            Expr::Map(vec![("a".to_string(), Expr::Literal(Value::Int(1)))])
        );
    }

    #[test]
    fn test_parse_unary() {
        assert_eq!(
            parse_ok("-n"),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(Expr::Variable("n".to_string())),
            }
        );
    }

    #[test]
    fn test_syntax_error_reported() {
        let errs = parse("1 +").unwrap_err();
        assert!(!errs.is_empty());
        assert!(matches!(errs[0], EvalError::Syntax { .. }));
    }
}
