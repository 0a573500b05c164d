//! INPUT line tokenization and field coercion.
//!
//! A response line splits on commas into fields; a field is either
//! whitespace-trimmed bare text or a double-quoted string whose content is
//! taken verbatim. Coercion failures are reported to the caller, which
//! re-prompts with `Redo from start` rather than surfacing an error.

use crate::error::RuntimeError;
use crate::types::TypeSpec;
use crate::value::Value;

/// Split one response line into fields.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let chars: Vec<char> = line.chars().collect();
    let mut pos = 0;
    loop {
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        if pos < chars.len() && chars[pos] == '"' {
            pos += 1;
            let mut field = String::new();
            while pos < chars.len() && chars[pos] != '"' {
                field.push(chars[pos]);
                pos += 1;
            }
            if pos < chars.len() {
                pos += 1;
            }
            // Skip trailing junk up to the next separator.
            while pos < chars.len() && chars[pos] != ',' {
                pos += 1;
            }
            fields.push(field);
        } else {
            let mut field = String::new();
            while pos < chars.len() && chars[pos] != ',' {
                field.push(chars[pos]);
                pos += 1;
            }
            fields.push(field.trim().to_string());
        }
        if pos < chars.len() && chars[pos] == ',' {
            pos += 1;
            continue;
        }
        break;
    }
    fields
}

/// Coerce one field to the requested elementary type. `None` means the
/// field is not a valid value and the whole line must be redone.
pub fn coerce_field(field: &str, ty: &TypeSpec) -> Option<Value> {
    if ty.is_string() {
        return Some(Value::Str(field.to_string()));
    }
    let parsed: f64 = field.trim().parse().ok()?;
    Value::Double(parsed).coerce_to(ty).ok()
}

/// Parse a full response line against the requested types. An error
/// means arity mismatch or an invalid field; the caller re-prompts.
pub fn parse_response(line: &str, types: &[TypeSpec]) -> Result<Vec<Value>, RuntimeError> {
    let fields = split_fields(line);
    if fields.len() != types.len() {
        return Err(RuntimeError::new("wrong number of input fields"));
    }
    fields
        .iter()
        .zip(types)
        .map(|(field, ty)| {
            coerce_field(field, ty).ok_or_else(|| RuntimeError::new("invalid input field"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_split_on_commas_and_trim() {
        assert_eq!(split_fields("5, hello ,3"), vec!["5", "hello", "3"]);
    }

    #[test]
    fn quoted_fields_keep_spaces_and_commas() {
        assert_eq!(
            split_fields("\"a, b\", c"),
            vec!["a, b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn single_field_line() {
        assert_eq!(split_fields("  42  "), vec!["42"]);
    }

    #[test]
    fn empty_line_is_one_empty_field() {
        assert_eq!(split_fields(""), vec![""]);
    }

    #[test]
    fn numeric_coercion_accepts_decimals() {
        let v = coerce_field("2.5", &TypeSpec::Single).unwrap();
        assert!(matches!(v, Value::Single(f) if f == 2.5));
    }

    #[test]
    fn numeric_coercion_rejects_garbage() {
        assert!(coerce_field("not-a-number", &TypeSpec::Single).is_none());
        assert!(coerce_field("", &TypeSpec::Integer).is_none());
    }

    #[test]
    fn string_coercion_accepts_anything() {
        let v = coerce_field("not-a-number", &TypeSpec::String).unwrap();
        assert_eq!(v.as_str().unwrap(), "not-a-number");
    }

    #[test]
    fn parse_response_checks_arity() {
        assert!(parse_response("1, 2", &[TypeSpec::Single]).is_err());
        assert!(parse_response("1", &[TypeSpec::Single, TypeSpec::Single]).is_err());
    }

    #[test]
    fn parse_response_coerces_each_field() {
        let values =
            parse_response("5, hello", &[TypeSpec::Single, TypeSpec::String]).unwrap();
        assert!(matches!(values[0], Value::Single(f) if f == 5.0));
        assert_eq!(values[1].as_str().unwrap(), "hello");
    }
}
