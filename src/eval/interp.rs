//! Evaluates parsed expressions against a variable scope

use std::collections::BTreeMap;

use crate::error::EvalError;
use crate::eval::ast::{BinaryOp, Expr, UnaryOp};
use crate::value::{Scope, Value};

pub fn eval(expr: &Expr, scope: &Scope) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),

        Expr::Variable(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownVariable { name: name.clone() }),

        Expr::Property { object, name } => {
            let object = eval(object, scope)?;
            match (&object, name.as_str()) {
                (Value::Map(map), _) => {
                    map.get(name)
                        .cloned()
                        .ok_or_else(|| EvalError::UnknownProperty {
                            property: name.clone(),
                        })
                }
                (Value::String(s), "length") => Ok(Value::Int(s.chars().count() as i64)),
                (Value::List(items), "length") => Ok(Value::Int(items.len() as i64)),
                _ => Err(EvalError::TypeMismatch {
                    message: format!("cannot access property '{}' on {}", name, object.kind()),
                }),
            }
        }

        Expr::Index { object, index } => {
            let object = eval(object, scope)?;
            let index = eval(index, scope)?;
            match (object, index) {
                (Value::List(items), Value::Int(i)) => {
                    let length = items.len();
                    usize::try_from(i)
                        .ok()
                        .and_then(|i| items.get(i).cloned())
                        .ok_or(EvalError::IndexOutOfBounds { index: i, length })
                }
                (Value::Map(map), Value::String(key)) => {
                    map.get(&key)
                        .cloned()
                        .ok_or(EvalError::UnknownProperty { property: key })
                }
                (object, index) => Err(EvalError::TypeMismatch {
                    message: format!("cannot index {} with {}", object.kind(), index.kind()),
                }),
            }
        }

        Expr::Unary { op, operand } => {
            let operand = eval(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                UnaryOp::Neg => match operand {
                    Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(|| overflow("-")),
                    Value::Float(n) => Ok(Value::Float(-n)),
                    other => Err(EvalError::TypeMismatch {
                        message: format!("cannot negate {}", other.kind()),
                    }),
                },
            }
        }

        Expr::Binary { op, left, right } => {
            // Logical operators short-circuit
            if let BinaryOp::And | BinaryOp::Or = op {
                let left = eval(left, scope)?;
                return match op {
                    BinaryOp::And if !left.is_truthy() => Ok(Value::Bool(false)),
                    BinaryOp::Or if left.is_truthy() => Ok(Value::Bool(true)),
                    _ => Ok(Value::Bool(eval(right, scope)?.is_truthy())),
                };
            }
            binary(*op, eval(left, scope)?, eval(right, scope)?)
        }

        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if eval(condition, scope)?.is_truthy() {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }

        Expr::List(items) => items
            .iter()
            .map(|item| eval(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),

        Expr::Map(entries) => {
            let mut map = BTreeMap::new();
            for (key, value) in entries {
                map.insert(key.clone(), eval(value, scope)?);
            }
            Ok(Value::Map(map))
        }

        Expr::Pipeline {
            input,
            filter,
            args,
        } => {
            let input = eval(input, scope)?;
            let args = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            apply_filter(filter, input, &args)
        }
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => arithmetic(op, "-", left, right),
        BinaryOp::Mul => arithmetic(op, "*", left, right),
        BinaryOp::Div => arithmetic(op, "/", left, right),
        BinaryOp::Rem => arithmetic(op, "%", left, right),
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&left, &right))),
        BinaryOp::NotEq => Ok(Value::Bool(!values_equal(&left, &right))),
        BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
            compare(op, left, right)
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("handled by short-circuit"),
    }
}

/// `+` concatenates when either side is a string, and is numeric otherwise
fn add(left: Value, right: Value) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::String(_), _) | (_, Value::String(_)) => {
            Ok(Value::String(format!("{}{}", left, right)))
        }
        (Value::Int(a), Value::Int(b)) => {
            a.checked_add(*b).map(Value::Int).ok_or_else(|| overflow("+"))
        }
        _ => {
            let (a, b) = numeric_operands("+", &left, &right)?;
            Ok(Value::Float(a + b))
        }
    }
}

fn arithmetic(op: BinaryOp, symbol: &str, left: Value, right: Value) -> Result<Value, EvalError> {
    if let (Value::Int(a), Value::Int(b)) = (&left, &right) {
        // Integer division falls through to floats so `5 / 2` is 2.5, and
        // so does `% 0`; overflow is an error, never a wrap or a panic
        let checked = match op {
            BinaryOp::Sub => Some(a.checked_sub(*b).ok_or_else(|| overflow(symbol))),
            BinaryOp::Mul => Some(a.checked_mul(*b).ok_or_else(|| overflow(symbol))),
            BinaryOp::Rem if *b != 0 => Some(a.checked_rem(*b).ok_or_else(|| overflow(symbol))),
            _ => None,
        };
        if let Some(result) = checked {
            return result.map(Value::Int);
        }
    }
    let (a, b) = numeric_operands(symbol, &left, &right)?;
    let result = match op {
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        _ => unreachable!(),
    };
    Ok(Value::Float(result))
}

fn overflow(symbol: &str) -> EvalError {
    EvalError::IntegerOverflow {
        symbol: symbol.to_string(),
    }
}

fn numeric_operands(symbol: &str, left: &Value, right: &Value) -> Result<(f64, f64), EvalError> {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(EvalError::TypeMismatch {
            message: format!(
                "'{}' requires numeric operands, got {} and {}",
                symbol,
                left.kind(),
                right.kind()
            ),
        }),
    }
}

/// Equality compares ints and floats numerically; everything else is
/// structural
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn compare(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    let ordering = match (&left, &right) {
        (Value::String(a), Value::String(b)) => a.partial_cmp(b),
        _ => {
            let (a, b) = numeric_operands("comparison", &left, &right)?;
            a.partial_cmp(&b)
        }
    };
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    let result = match op {
        BinaryOp::Less => ordering.is_lt(),
        BinaryOp::LessEq => ordering.is_le(),
        BinaryOp::Greater => ordering.is_gt(),
        BinaryOp::GreaterEq => ordering.is_ge(),
        _ => unreachable!(),
    };
    Ok(Value::Bool(result))
}

fn apply_filter(name: &str, input: Value, args: &[Value]) -> Result<Value, EvalError> {
    match name {
        "upper" => text_filter(name, input, str::to_uppercase),
        "lower" => text_filter(name, input, str::to_lowercase),
        "trim" => text_filter(name, input, |s| s.trim().to_string()),
        "length" => match input {
            Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
            Value::List(items) => Ok(Value::Int(items.len() as i64)),
            Value::Map(map) => Ok(Value::Int(map.len() as i64)),
            other => Err(EvalError::TypeMismatch {
                message: format!("'length' requires a string or collection, got {}", other.kind()),
            }),
        },
        "join" => {
            let separator = match args.first() {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => ",".to_string(),
            };
            match input {
                Value::List(items) => Ok(Value::String(
                    items
                        .iter()
                        .map(Value::to_string)
                        .collect::<Vec<_>>()
                        .join(&separator),
                )),
                other => Err(EvalError::TypeMismatch {
                    message: format!("'join' requires a list, got {}", other.kind()),
                }),
            }
        }
        other => Err(EvalError::UnknownFilter {
            name: other.to_string(),
        }),
    }
}

fn text_filter(
    name: &str,
    input: Value,
    apply: impl Fn(&str) -> String,
) -> Result<Value, EvalError> {
    match input {
        Value::String(s) => Ok(Value::String(apply(&s))),
        other => Err(EvalError::TypeMismatch {
            message: format!("'{}' requires a string, got {}", name, other.kind()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::grammar;

    fn eval_str(input: &str, scope: &Scope) -> Result<Value, EvalError> {
        let expr = grammar::parse(input).expect("Should parse");
        eval(&expr, scope)
    }

    fn scope_with(entries: &[(&str, Value)]) -> Scope {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_arithmetic_int() {
        let scope = Scope::new();
        assert_eq!(eval_str("1 + 2 * 3", &scope).unwrap(), Value::Int(7));
        assert_eq!(eval_str("7 % 3", &scope).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_division_is_float() {
        let scope = Scope::new();
        assert_eq!(eval_str("5 / 2", &scope).unwrap(), Value::Float(2.5));
        assert_eq!(eval_str("6 / 2", &scope).unwrap(), Value::Float(3.0));
    }

    #[test]
    fn test_overflow_is_error_not_panic() {
        // 9223372036854775808 does not lex as an i64, so i64::MIN is
        // reached by subtraction
        let scope = Scope::new();
        let min = "(0 - 9223372036854775807 - 1)";
        assert!(matches!(
            eval_str(&format!("{} % (0 - 1)", min), &scope).unwrap_err(),
            EvalError::IntegerOverflow { .. }
        ));
        assert!(matches!(
            eval_str(&format!("-{}", min), &scope).unwrap_err(),
            EvalError::IntegerOverflow { .. }
        ));
        assert!(matches!(
            eval_str("9223372036854775807 + 1", &scope).unwrap_err(),
            EvalError::IntegerOverflow { .. }
        ));
        assert!(matches!(
            eval_str(&format!("{} * 2", min), &scope).unwrap_err(),
            EvalError::IntegerOverflow { .. }
        ));
    }

    #[test]
    fn test_rem_by_zero_is_float() {
        let scope = Scope::new();
        match eval_str("7 % 0", &scope).unwrap() {
            Value::Float(n) => assert!(n.is_nan()),
            other => panic!("Expected Float, got {:?}", other),
        }
    }

    #[test]
    fn test_string_concat() {
        let scope = scope_with(&[("name", Value::from("world"))]);
        assert_eq!(
            eval_str("'hello ' + name", &scope).unwrap(),
            Value::from("hello world")
        );
        assert_eq!(eval_str("'n=' + 3", &scope).unwrap(), Value::from("n=3"));
    }

    #[test]
    fn test_variable_lookup() {
        let scope = scope_with(&[("count", Value::Int(3))]);
        assert_eq!(eval_str("count", &scope).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_unknown_variable() {
        let err = eval_str("ghost", &Scope::new()).unwrap_err();
        assert!(matches!(err, EvalError::UnknownVariable { .. }));
    }

    #[test]
    fn test_property_access() {
        let mut user = BTreeMap::new();
        user.insert("name".to_string(), Value::from("ada"));
        let scope = scope_with(&[("user", Value::Map(user))]);
        assert_eq!(eval_str("user.name", &scope).unwrap(), Value::from("ada"));
    }

    #[test]
    fn test_index_access() {
        let scope = scope_with(&[(
            "items",
            Value::List(vec![Value::from("a"), Value::from("b")]),
        )]);
        assert_eq!(eval_str("items[1]", &scope).unwrap(), Value::from("b"));
        let err = eval_str("items[5]", &scope).unwrap_err();
        assert!(matches!(err, EvalError::IndexOutOfBounds { .. }));
    }

    #[test]
    fn test_comparison_and_logic() {
        let scope = scope_with(&[("n", Value::Int(5))]);
        assert_eq!(eval_str("n > 3", &scope).unwrap(), Value::Bool(true));
        assert_eq!(
            eval_str("n > 3 && n < 4", &scope).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(eval_str("n == 5.0", &scope).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_short_circuit_skips_bad_operand() {
        // `ghost` is undefined but must never be evaluated
        let scope = scope_with(&[("ok", Value::Bool(true))]);
        assert_eq!(eval_str("ok || ghost", &scope).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_conditional() {
        let scope = scope_with(&[("ok", Value::Bool(false))]);
        assert_eq!(
            eval_str("ok ? 'yes' : 'no'", &scope).unwrap(),
            Value::from("no")
        );
    }

    #[test]
    fn test_filters() {
        let scope = scope_with(&[
            ("name", Value::from("ada")),
            (
                "items",
                Value::List(vec![Value::from("x"), Value::from("y")]),
            ),
        ]);
        assert_eq!(eval_str("name | upper", &scope).unwrap(), Value::from("ADA"));
        assert_eq!(
            eval_str("'  padded  ' | trim", &scope).unwrap(),
            Value::from("padded")
        );
        assert_eq!(eval_str("items | length", &scope).unwrap(), Value::Int(2));
        assert_eq!(
            eval_str("items | join('-')", &scope).unwrap(),
            Value::from("x-y")
        );
    }

    #[test]
    fn test_unknown_filter() {
        let scope = scope_with(&[("name", Value::from("ada"))]);
        let err = eval_str("name | sparkle", &scope).unwrap_err();
        assert!(matches!(err, EvalError::UnknownFilter { .. }));
    }

    #[test]
    fn test_literal_collections() {
        let scope = Scope::new();
        assert_eq!(
            eval_str("[1, 2] | length", &scope).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            eval_str("{a: 1}.a", &scope).unwrap(),
            Value::Int(1)
        );
    }
}
