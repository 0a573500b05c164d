//! Built-in function registry.
//!
//! Every built-in is an entry of name, parameter types, return type, and a
//! native implementation. Lookup walks the registry: case-insensitive name
//! match, then argument count, then per-argument type compatibility
//! (matching elementary types, or both arrays). With `exact` unset, a
//! failed type match falls back to the first same-name entry so a caller
//! can produce a targeted mismatch diagnostic.
//!
//! Overloaded arities (INSTR, MID$, LBOUND, UBOUND) are separate entries.

use once_cell::sync::Lazy;

use crate::error::RuntimeError;
use crate::types::TypeSpec;
use crate::value::{format_number, Value};

pub struct BuiltinFn {
    pub name: &'static str,
    pub param_types: Vec<TypeSpec>,
    pub return_type: TypeSpec,
    pub run: fn(&[Value]) -> Result<Value, RuntimeError>,
}

pub static BUILTINS: Lazy<Vec<BuiltinFn>> = Lazy::new(|| {
    use TypeSpec::{Integer, Single, String as Str};
    vec![
        BuiltinFn {
            name: "chr$",
            param_types: vec![Single],
            return_type: Str,
            run: chr,
        },
        BuiltinFn {
            name: "instr",
            param_types: vec![Str, Str],
            return_type: Integer,
            run: instr_2,
        },
        BuiltinFn {
            name: "instr",
            param_types: vec![Single, Str, Str],
            return_type: Integer,
            run: instr_3,
        },
        BuiltinFn {
            name: "lcase$",
            param_types: vec![Str],
            return_type: Str,
            run: lcase,
        },
        BuiltinFn {
            name: "ucase$",
            param_types: vec![Str],
            return_type: Str,
            run: ucase,
        },
        BuiltinFn {
            name: "left$",
            param_types: vec![Str, Single],
            return_type: Str,
            run: left,
        },
        BuiltinFn {
            name: "right$",
            param_types: vec![Str, Single],
            return_type: Str,
            run: right,
        },
        BuiltinFn {
            name: "mid$",
            param_types: vec![Str, Single],
            return_type: Str,
            run: mid_2,
        },
        BuiltinFn {
            name: "mid$",
            param_types: vec![Str, Single, Single],
            return_type: Str,
            run: mid_3,
        },
        BuiltinFn {
            name: "len",
            param_types: vec![Str],
            return_type: Integer,
            run: len,
        },
        BuiltinFn {
            name: "str$",
            param_types: vec![Single],
            return_type: Str,
            run: str_fn,
        },
        BuiltinFn {
            name: "val",
            param_types: vec![Str],
            return_type: Single,
            run: val,
        },
        BuiltinFn {
            name: "lbound",
            param_types: vec![TypeSpec::any_array()],
            return_type: Integer,
            run: lbound_1,
        },
        BuiltinFn {
            name: "lbound",
            param_types: vec![TypeSpec::any_array(), Single],
            return_type: Integer,
            run: lbound_2,
        },
        BuiltinFn {
            name: "ubound",
            param_types: vec![TypeSpec::any_array()],
            return_type: Integer,
            run: ubound_1,
        },
        BuiltinFn {
            name: "ubound",
            param_types: vec![TypeSpec::any_array(), Single],
            return_type: Integer,
            run: ubound_2,
        },
        BuiltinFn {
            name: "asc",
            param_types: vec![Str],
            return_type: Integer,
            run: asc,
        },
        BuiltinFn {
            name: "abs",
            param_types: vec![Single],
            return_type: Single,
            run: abs,
        },
        BuiltinFn {
            name: "sgn",
            param_types: vec![Single],
            return_type: Integer,
            run: sgn,
        },
        BuiltinFn {
            name: "int",
            param_types: vec![Single],
            return_type: Single,
            run: int_fn,
        },
        BuiltinFn {
            name: "sqr",
            param_types: vec![Single],
            return_type: Single,
            run: sqr,
        },
        BuiltinFn {
            name: "space$",
            param_types: vec![Single],
            return_type: Str,
            run: space,
        },
    ]
});

fn param_matches(param: &TypeSpec, arg: &TypeSpec) -> bool {
    if param.is_array() {
        return arg.is_array();
    }
    arg.is_elementary() && TypeSpec::are_matching_elementary(param, arg)
}

/// Resolve a built-in by name and argument types. With `exact` false, a
/// same-name entry is returned even when its signature does not match, so
/// the caller can explain which argument was wrong.
pub fn lookup_builtin(
    name: &str,
    arg_types: &[TypeSpec],
    exact: bool,
) -> Option<&'static BuiltinFn> {
    let mut first_name_match = None;
    for builtin in BUILTINS.iter() {
        if !builtin.name.eq_ignore_ascii_case(name) {
            continue;
        }
        if first_name_match.is_none() {
            first_name_match = Some(builtin);
        }
        if builtin.param_types.len() != arg_types.len() {
            continue;
        }
        if builtin
            .param_types
            .iter()
            .zip(arg_types)
            .all(|(p, a)| param_matches(p, a))
        {
            return Some(builtin);
        }
    }
    if exact {
        None
    } else {
        first_name_match
    }
}

pub fn is_builtin_name(name: &str) -> bool {
    BUILTINS.iter().any(|b| b.name.eq_ignore_ascii_case(name))
}

/// Distinct built-in names, for did-you-mean suggestions.
pub fn builtin_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for builtin in BUILTINS.iter() {
        if !names.contains(&builtin.name) {
            names.push(builtin.name);
        }
    }
    names
}

fn illegal_call() -> RuntimeError {
    RuntimeError::new("Illegal function call")
}

fn chr(args: &[Value]) -> Result<Value, RuntimeError> {
    let code = args[0].as_f64()?.floor();
    if !(0.0..=0x10FFFF as f64).contains(&code) {
        return Err(illegal_call());
    }
    let ch = char::from_u32(code as u32).ok_or_else(illegal_call)?;
    Ok(Value::Str(ch.to_string()))
}

fn instr_impl(start: i64, hay: &str, needle: &str) -> Result<Value, RuntimeError> {
    if start < 1 {
        return Err(illegal_call());
    }
    let hay_chars: Vec<char> = hay.chars().collect();
    let needle_chars: Vec<char> = needle.chars().collect();
    let start = start as usize;
    if start > hay_chars.len() + 1 {
        return Ok(Value::Integer(0));
    }
    if needle_chars.is_empty() {
        return Ok(Value::Integer(start as i32));
    }
    if needle_chars.len() > hay_chars.len() {
        return Ok(Value::Integer(0));
    }
    for i in (start - 1)..=(hay_chars.len() - needle_chars.len()) {
        if hay_chars[i..i + needle_chars.len()] == needle_chars[..] {
            return Ok(Value::Integer((i + 1) as i32));
        }
    }
    Ok(Value::Integer(0))
}

fn instr_2(args: &[Value]) -> Result<Value, RuntimeError> {
    instr_impl(1, args[0].as_str()?, args[1].as_str()?)
}

fn instr_3(args: &[Value]) -> Result<Value, RuntimeError> {
    instr_impl(args[0].as_i64()?, args[1].as_str()?, args[2].as_str()?)
}

fn lcase(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Str(args[0].as_str()?.to_lowercase()))
}

fn ucase(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Str(args[0].as_str()?.to_uppercase()))
}

fn left(args: &[Value]) -> Result<Value, RuntimeError> {
    let n = args[1].as_i64()?;
    if n < 0 {
        return Err(illegal_call());
    }
    Ok(Value::Str(args[0].as_str()?.chars().take(n as usize).collect()))
}

fn right(args: &[Value]) -> Result<Value, RuntimeError> {
    let n = args[1].as_i64()?;
    if n < 0 {
        return Err(illegal_call());
    }
    let chars: Vec<char> = args[0].as_str()?.chars().collect();
    let skip = chars.len().saturating_sub(n as usize);
    Ok(Value::Str(chars[skip..].iter().collect()))
}

fn mid_impl(s: &str, start: i64, len: Option<i64>) -> Result<Value, RuntimeError> {
    if start < 1 {
        return Err(illegal_call());
    }
    let chars = s.chars().skip(start as usize - 1);
    let result: String = match len {
        Some(len) if len < 0 => return Err(illegal_call()),
        Some(len) => chars.take(len as usize).collect(),
        None => chars.collect(),
    };
    Ok(Value::Str(result))
}

fn mid_2(args: &[Value]) -> Result<Value, RuntimeError> {
    mid_impl(args[0].as_str()?, args[1].as_i64()?, None)
}

fn mid_3(args: &[Value]) -> Result<Value, RuntimeError> {
    mid_impl(args[0].as_str()?, args[1].as_i64()?, Some(args[2].as_i64()?))
}

fn len(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Integer(args[0].as_str()?.chars().count() as i32))
}

fn str_fn(args: &[Value]) -> Result<Value, RuntimeError> {
    let digits = format_number(&args[0])?;
    let sign_cue = if digits.starts_with('-') { "" } else { " " };
    Ok(Value::Str(format!("{}{}", sign_cue, digits)))
}

fn val(args: &[Value]) -> Result<Value, RuntimeError> {
    let s = args[0].as_str()?.trim_start();
    let mut end = 0;
    let bytes = s.as_bytes();
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    let mut seen_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return Ok(Value::Single(0.0));
    }
    let parsed: f64 = s[..end].parse().unwrap_or(0.0);
    Ok(Value::Single(parsed as f32))
}

fn bound_dim(args: &[Value]) -> Result<i64, RuntimeError> {
    if args.len() < 2 {
        return Ok(1);
    }
    Ok(args[1].as_i64()?)
}

fn lbound_impl(args: &[Value]) -> Result<Value, RuntimeError> {
    let dim = bound_dim(args)?;
    if dim < 1 {
        return Err(RuntimeError::new("Subscript out of range"));
    }
    let arr = args[0].as_array()?;
    let bound = arr.borrow().lbound(dim as usize)?;
    Ok(Value::Integer(bound as i32))
}

fn ubound_impl(args: &[Value]) -> Result<Value, RuntimeError> {
    let dim = bound_dim(args)?;
    if dim < 1 {
        return Err(RuntimeError::new("Subscript out of range"));
    }
    let arr = args[0].as_array()?;
    let bound = arr.borrow().ubound(dim as usize)?;
    Ok(Value::Integer(bound as i32))
}

fn lbound_1(args: &[Value]) -> Result<Value, RuntimeError> {
    lbound_impl(args)
}

fn lbound_2(args: &[Value]) -> Result<Value, RuntimeError> {
    lbound_impl(args)
}

fn ubound_1(args: &[Value]) -> Result<Value, RuntimeError> {
    ubound_impl(args)
}

fn ubound_2(args: &[Value]) -> Result<Value, RuntimeError> {
    ubound_impl(args)
}

fn asc(args: &[Value]) -> Result<Value, RuntimeError> {
    let s = args[0].as_str()?;
    let ch = s.chars().next().ok_or_else(illegal_call)?;
    Ok(Value::Integer(ch as i32))
}

fn abs(args: &[Value]) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Integer(n) => Ok(Value::Integer(n.wrapping_abs())),
        Value::Long(n) => Ok(Value::Long(n.wrapping_abs())),
        Value::Single(f) => Ok(Value::Single(f.abs())),
        Value::Double(f) => Ok(Value::Double(f.abs())),
        _ => Err(illegal_call()),
    }
}

fn sgn(args: &[Value]) -> Result<Value, RuntimeError> {
    let f = args[0].as_f64()?;
    Ok(Value::Integer(if f > 0.0 {
        1
    } else if f < 0.0 {
        -1
    } else {
        0
    }))
}

fn int_fn(args: &[Value]) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        Value::Long(n) => Ok(Value::Long(*n)),
        Value::Single(f) => Ok(Value::Single(f.floor())),
        Value::Double(f) => Ok(Value::Double(f.floor())),
        _ => Err(illegal_call()),
    }
}

fn sqr(args: &[Value]) -> Result<Value, RuntimeError> {
    let f = args[0].as_f64()?;
    if f < 0.0 {
        return Err(illegal_call());
    }
    match &args[0] {
        Value::Double(_) => Ok(Value::Double(f.sqrt())),
        _ => Ok(Value::Single(f.sqrt() as f32)),
    }
}

fn space(args: &[Value]) -> Result<Value, RuntimeError> {
    let n = args[0].as_i64()?;
    if n < 0 {
        return Err(illegal_call());
    }
    Ok(Value::Str(" ".repeat(n as usize)))
}
