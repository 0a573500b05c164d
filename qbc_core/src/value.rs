//! Runtime values and the arithmetic the executor performs on them.
//!
//! Numeric operations widen both operands per [`TypeSpec::widen`] and
//! compute in the widened representation. Comparisons and NOT produce
//! QBasic truth values: -1 for true, 0 for false. AND and OR operate
//! bitwise over integer-coerced operands, which doubles as the logical
//! reading for those truth values.

use std::cell::RefCell;
use std::rc::Rc;

use crate::array::QbArray;
use crate::error::RuntimeError;
use crate::program::BinOp;
use crate::types::TypeSpec;

#[derive(Debug, Clone)]
pub enum Value {
    Integer(i32),
    Long(i64),
    Single(f32),
    Double(f64),
    Str(String),
    /// Array handle; shared so built-ins can inspect the live object.
    Array(Rc<RefCell<QbArray>>),
}

impl Value {
    pub fn type_spec(&self) -> TypeSpec {
        match self {
            Value::Integer(_) => TypeSpec::Integer,
            Value::Long(_) => TypeSpec::Long,
            Value::Single(_) => TypeSpec::Single,
            Value::Double(_) => TypeSpec::Double,
            Value::Str(_) => TypeSpec::String,
            Value::Array(arr) => arr.borrow().type_spec(),
        }
    }

    /// The zero value a freshly declared slot holds. Arrays are created by
    /// DIM, never defaulted here.
    pub fn default_for(ty: &TypeSpec) -> Value {
        match ty {
            TypeSpec::Integer => Value::Integer(0),
            TypeSpec::Long => Value::Long(0),
            TypeSpec::Single => Value::Single(0.0),
            TypeSpec::Double => Value::Double(0.0),
            TypeSpec::String => Value::Str(String::new()),
            TypeSpec::Array { .. } => Value::Integer(0),
        }
    }

    pub fn from_bool(b: bool) -> Value {
        Value::Integer(if b { -1 } else { 0 })
    }

    pub fn is_numeric(&self) -> bool {
        self.type_spec().is_numeric()
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Integer(n) => *n != 0,
            Value::Long(n) => *n != 0,
            Value::Single(f) => *f != 0.0,
            Value::Double(f) => *f != 0.0,
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Result<f64, RuntimeError> {
        match self {
            Value::Integer(n) => Ok(*n as f64),
            Value::Long(n) => Ok(*n as f64),
            Value::Single(f) => Ok(*f as f64),
            Value::Double(f) => Ok(*f),
            _ => Err(RuntimeError::new("expected a numeric value")),
        }
    }

    pub fn as_i64(&self) -> Result<i64, RuntimeError> {
        match self {
            Value::Integer(n) => Ok(*n as i64),
            Value::Long(n) => Ok(*n),
            Value::Single(f) => Ok(f.round() as i64),
            Value::Double(f) => Ok(f.round() as i64),
            _ => Err(RuntimeError::new("expected a numeric value")),
        }
    }

    pub fn as_str(&self) -> Result<&str, RuntimeError> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(RuntimeError::new("expected a string value")),
        }
    }

    pub fn as_array(&self) -> Result<&Rc<RefCell<QbArray>>, RuntimeError> {
        match self {
            Value::Array(arr) => Ok(arr),
            _ => Err(RuntimeError::new("expected an array")),
        }
    }

    /// Convert to the target elementary type, rounding floats that narrow
    /// to an integral type.
    pub fn coerce_to(&self, ty: &TypeSpec) -> Result<Value, RuntimeError> {
        match ty {
            TypeSpec::Integer => Ok(Value::Integer(self.as_i64()? as i32)),
            TypeSpec::Long => Ok(Value::Long(self.as_i64()?)),
            TypeSpec::Single => Ok(Value::Single(self.as_f64()? as f32)),
            TypeSpec::Double => Ok(Value::Double(self.as_f64()?)),
            TypeSpec::String => Ok(Value::Str(self.as_str()?.to_string())),
            TypeSpec::Array { .. } => match self {
                Value::Array(arr) => Ok(Value::Array(Rc::clone(arr))),
                _ => Err(RuntimeError::new("Type mismatch")),
            },
        }
    }
}

/// Digits-only rendering of a number: integral values drop the decimal
/// point, everything else uses the shortest round-trip form.
pub fn format_number(v: &Value) -> Result<String, RuntimeError> {
    match v {
        Value::Integer(n) => Ok(n.to_string()),
        Value::Long(n) => Ok(n.to_string()),
        Value::Single(f) => Ok(format_f64(*f as f64, &f.to_string())),
        Value::Double(f) => Ok(format_f64(*f, &f.to_string())),
        _ => Err(RuntimeError::new("expected a numeric value")),
    }
}

fn format_f64(f: f64, fallback: &str) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1.0e15 {
        (f as i64).to_string()
    } else {
        fallback.to_string()
    }
}

pub fn binary(op: BinOp, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    match op {
        BinOp::Add => {
            if a.type_spec().is_string() && b.type_spec().is_string() {
                Ok(Value::Str(format!("{}{}", a.as_str()?, b.as_str()?)))
            } else {
                numeric_binary(op, a, b)
            }
        }
        BinOp::Sub | BinOp::Mul => numeric_binary(op, a, b),
        BinOp::Div => {
            let ty = TypeSpec::widen_for_divide(&a.type_spec(), &b.type_spec())
                .ok_or_else(type_mismatch)?;
            let quotient = a.as_f64()? / b.as_f64()?;
            Value::Double(quotient).coerce_to(&ty)
        }
        BinOp::IntDiv => {
            let ty = TypeSpec::widen(&a.type_spec(), &b.type_spec()).ok_or_else(type_mismatch)?;
            let divisor = b.as_f64()?;
            if divisor == 0.0 {
                return Err(RuntimeError::new("Division by zero"));
            }
            Value::Double((a.as_f64()? / divisor).floor()).coerce_to(&ty)
        }
        BinOp::Mod => {
            let ty = TypeSpec::widen(&a.type_spec(), &b.type_spec()).ok_or_else(type_mismatch)?;
            match ty {
                TypeSpec::Integer | TypeSpec::Long => {
                    let divisor = b.as_i64()?;
                    if divisor == 0 {
                        return Err(RuntimeError::new("Division by zero"));
                    }
                    Value::Long(a.as_i64()? % divisor).coerce_to(&ty)
                }
                _ => {
                    let divisor = b.as_f64()?;
                    if divisor == 0.0 {
                        return Err(RuntimeError::new("Division by zero"));
                    }
                    Value::Double(a.as_f64()? % divisor).coerce_to(&ty)
                }
            }
        }
        BinOp::Pow => {
            let ty = TypeSpec::widen(&a.type_spec(), &b.type_spec()).ok_or_else(type_mismatch)?;
            Value::Double(a.as_f64()?.powf(b.as_f64()?)).coerce_to(&ty)
        }
        BinOp::And => Ok(Value::Integer((a.as_i64()? & b.as_i64()?) as i32)),
        BinOp::Or => Ok(Value::Integer((a.as_i64()? | b.as_i64()?) as i32)),
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => compare(op, a, b),
    }
}

fn numeric_binary(op: BinOp, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    let ty = TypeSpec::widen(&a.type_spec(), &b.type_spec()).ok_or_else(type_mismatch)?;
    match ty {
        TypeSpec::Integer | TypeSpec::Long => {
            let (x, y) = (a.as_i64()?, b.as_i64()?);
            let r = match op {
                BinOp::Add => x.wrapping_add(y),
                BinOp::Sub => x.wrapping_sub(y),
                BinOp::Mul => x.wrapping_mul(y),
                _ => unreachable!("numeric_binary only handles + - *"),
            };
            Value::Long(r).coerce_to(&ty)
        }
        _ => {
            let (x, y) = (a.as_f64()?, b.as_f64()?);
            let r = match op {
                BinOp::Add => x + y,
                BinOp::Sub => x - y,
                BinOp::Mul => x * y,
                _ => unreachable!("numeric_binary only handles + - *"),
            };
            Value::Double(r).coerce_to(&ty)
        }
    }
}

fn compare(op: BinOp, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    let result = if a.type_spec().is_string() && b.type_spec().is_string() {
        let (x, y) = (a.as_str()?, b.as_str()?);
        match op {
            BinOp::Eq => x == y,
            BinOp::Ne => x != y,
            BinOp::Lt => x < y,
            BinOp::Le => x <= y,
            BinOp::Gt => x > y,
            BinOp::Ge => x >= y,
            _ => unreachable!(),
        }
    } else if a.is_numeric() && b.is_numeric() {
        let (x, y) = (a.as_f64()?, b.as_f64()?);
        match op {
            BinOp::Eq => x == y,
            BinOp::Ne => x != y,
            BinOp::Lt => x < y,
            BinOp::Le => x <= y,
            BinOp::Gt => x > y,
            BinOp::Ge => x >= y,
            _ => unreachable!(),
        }
    } else {
        return Err(type_mismatch());
    };
    Ok(Value::from_bool(result))
}

pub fn negate(v: &Value) -> Result<Value, RuntimeError> {
    match v {
        Value::Integer(n) => Ok(Value::Integer(n.wrapping_neg())),
        Value::Long(n) => Ok(Value::Long(n.wrapping_neg())),
        Value::Single(f) => Ok(Value::Single(-f)),
        Value::Double(f) => Ok(Value::Double(-f)),
        _ => Err(type_mismatch()),
    }
}

/// Logical NOT over QBasic truth values.
pub fn logical_not(v: &Value) -> Result<Value, RuntimeError> {
    if !v.is_numeric() {
        return Err(type_mismatch());
    }
    Ok(Value::from_bool(!v.truthy()))
}

fn type_mismatch() -> RuntimeError {
    RuntimeError::new("Type mismatch")
}
