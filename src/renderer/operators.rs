//! Math and comparison on JSON values
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::context::{ValueNumber, ValueRender, ValueTruthy};
use crate::errors::{Error, Result};
use crate::parser::ast::{ComparisonOperator, MathOperator};

// 2^53, above that f64 can't represent every integer
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// The result of evaluating an expression.
///
/// JSON has no NaN or infinities: those stay floats while the expression is evaluated
/// and only become the strings `NaN`, `Infinity` and `-Infinity` once they leave it.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Json(Value),
    NonFinite(f64),
}

impl Operand {
    /// The JSON value to store, pass to a filter or render
    pub fn into_value(self) -> Value {
        match self {
            Operand::Json(v) => v,
            Operand::NonFinite(n) => Value::String(non_finite_str(n).to_string()),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Operand::Json(Value::Number(n)) => n.as_f64(),
            Operand::NonFinite(n) => Some(*n),
            _ => None,
        }
    }

    fn is_nan(&self) -> bool {
        matches!(self, Operand::NonFinite(n) if n.is_nan())
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Json(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Json(v) => v.fmt(f),
            Operand::NonFinite(n) => f.write_str(non_finite_str(*n)),
        }
    }
}

impl ValueRender for Operand {
    fn render(&self) -> Cow<'_, str> {
        match self {
            Operand::Json(v) => v.render(),
            Operand::NonFinite(n) => Cow::Borrowed(non_finite_str(*n)),
        }
    }
}

impl ValueTruthy for Operand {
    fn is_truthy(&self) -> bool {
        match self {
            Operand::Json(v) => v.is_truthy(),
            Operand::NonFinite(n) => !n.is_nan(),
        }
    }
}

fn non_finite_str(n: f64) -> &'static str {
    if n.is_nan() {
        "NaN"
    } else if n > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    }
}

/// Converts the result of a float operation back to an operand, integral results becoming integers
fn number_value(n: f64) -> Operand {
    if !n.is_finite() {
        Operand::NonFinite(n)
    } else if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        Operand::Json(Value::from(n as i64))
    } else {
        Operand::Json(Value::from(n))
    }
}

fn concat(left: &Operand, right: &Operand) -> Operand {
    let mut s = left.render().into_owned();
    s.push_str(&right.render());
    Operand::Json(Value::String(s))
}

/// `+ - * / % ** &`
pub fn eval_math(operator: MathOperator, left: &Operand, right: &Operand) -> Result<Operand> {
    let (l, r) = match (left.as_f64(), right.as_f64()) {
        _ if operator == MathOperator::Concat => return Ok(concat(left, right)),
        (Some(l), Some(r)) => (l, r),
        _ if operator == MathOperator::Add => return Ok(concat(left, right)),
        _ => {
            return Err(Error::msg(format!(
                "Tried to do math with a value that isn't a number: `{}` {} `{}`",
                left, operator, right
            )))
        }
    };

    if let (Operand::Json(Value::Number(ln)), Operand::Json(Value::Number(rn))) = (left, right) {
        if let (Some(li), Some(ri)) = (ln.as_i64(), rn.as_i64()) {
            let res = match operator {
                MathOperator::Add => li.checked_add(ri),
                MathOperator::Sub => li.checked_sub(ri),
                MathOperator::Mul => li.checked_mul(ri),
                MathOperator::Modulo => li.checked_rem(ri),
                MathOperator::Power => u32::try_from(ri).ok().and_then(|ri| li.checked_pow(ri)),
                MathOperator::Div | MathOperator::Concat => None,
            };
            if let Some(res) = res {
                return Ok(Operand::Json(Value::from(res)));
            }
        }
    }

    let res = match operator {
        MathOperator::Add => l + r,
        MathOperator::Sub => l - r,
        MathOperator::Mul => l * r,
        MathOperator::Div => l / r,
        MathOperator::Modulo => l % r,
        MathOperator::Power => l.powf(r),
        MathOperator::Concat => unreachable!("concatenation is not numeric"),
    };
    Ok(number_value(res))
}

/// Unary `-`
pub fn negate(value: &Operand) -> Result<Operand> {
    if let Operand::Json(v) = value {
        if let Some(n) = v.as_i64().and_then(i64::checked_neg) {
            return Ok(Operand::Json(Value::from(n)));
        }
    }
    match value.as_f64() {
        Some(n) => Ok(number_value(-n)),
        None => Err(Error::msg(format!("Tried to negate `{}` which isn't a number", value))),
    }
}

/// `===`: same JSON type and value, `1 === 1.0` being true. NaN equals nothing.
pub fn strict_eq(left: &Operand, right: &Operand) -> bool {
    match (left, right) {
        (Operand::Json(l), Operand::Json(r)) if !(l.is_number() && r.is_number()) => l == r,
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => l == r,
            _ => false,
        },
    }
}

fn loose_number(value: &Operand) -> Option<f64> {
    match value {
        Operand::NonFinite(n) => Some(*n),
        Operand::Json(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Operand::Json(v) => v.to_number(),
    }
}

/// `==`: numbers, numeric strings and booleans compare by numeric value. NaN equals nothing.
pub fn loose_eq(left: &Operand, right: &Operand) -> bool {
    if let (Operand::Json(l), Operand::Json(r)) = (left, right) {
        match (l, r) {
            (Value::String(l), Value::String(r)) => return l == r,
            (Value::Null, Value::Null) => return true,
            (Value::Array(_), _) | (_, Value::Array(_)) | (Value::Object(_), _) | (_, Value::Object(_)) => {
                return l == r
            }
            _ => (),
        }
    }
    match (left, right) {
        (Operand::Json(Value::Null), _) | (_, Operand::Json(Value::Null)) => false,
        (Operand::Json(Value::Array(_) | Value::Object(_)), _)
        | (_, Operand::Json(Value::Array(_) | Value::Object(_))) => false,
        _ => match (loose_number(left), loose_number(right)) {
            (Some(l), Some(r)) => l == r,
            _ => false,
        },
    }
}

/// All comparison operators
pub fn compare(operator: ComparisonOperator, left: &Operand, right: &Operand) -> Result<bool> {
    let ordering = match operator {
        ComparisonOperator::Eq => return Ok(loose_eq(left, right)),
        ComparisonOperator::NotEq => return Ok(!loose_eq(left, right)),
        ComparisonOperator::StrictEq => return Ok(strict_eq(left, right)),
        ComparisonOperator::StrictNotEq => return Ok(!strict_eq(left, right)),
        _ => match (left, right) {
            (Operand::Json(Value::String(l)), Operand::Json(Value::String(r))) => l.cmp(r),
            _ => match (left.as_f64(), right.as_f64()) {
                // NaN is unordered, every ordering comparison with it is false
                (Some(l), Some(r)) => match l.partial_cmp(&r) {
                    Some(ordering) => ordering,
                    None => return Ok(false),
                },
                _ => {
                    return Err(Error::msg(format!(
                        "Tried to compare `{}` {} `{}`: only numbers and strings can be ordered",
                        left, operator, right
                    )))
                }
            },
        },
    };

    Ok(match operator {
        ComparisonOperator::Gt => ordering == Ordering::Greater,
        ComparisonOperator::Gte => ordering != Ordering::Less,
        ComparisonOperator::Lt => ordering == Ordering::Less,
        ComparisonOperator::Lte => ordering != Ordering::Greater,
        _ => unreachable!("equality is handled above"),
    })
}
