//! Variable reference resolution for configuration values.
//!
//! String values may contain `${section.field}` to splice in another value.
//! `$${...}` escapes to a literal `${...}`.

use serde_json::{Map, Value};

use super::bag::{BagOptions, ParameterBag};
use super::ConfigError;

const MAX_ITERATIONS: usize = 100;

/// Resolves all `${path.to.field}` references in `data`.
///
/// Passes repeat until nothing changes, so references may point at values that
/// themselves contain references. Paths are split with the separator from
/// `options`.
pub fn resolve_references(
    data: &mut Map<String, Value>,
    options: &BagOptions,
) -> Result<(), ConfigError> {
    for _ in 0..MAX_ITERATIONS {
        let snapshot = ParameterBag::new(data.clone(), options.clone());
        let mut substitutions = 0;
        for value in data.values_mut() {
            substitutions += resolve_value(value, &snapshot)?;
        }
        if substitutions == 0 {
            return Ok(());
        }
    }

    Err(ConfigError::CircularReference)
}

fn resolve_value(value: &mut Value, root: &ParameterBag) -> Result<usize, ConfigError> {
    match value {
        Value::String(s) => resolve_string(s, root),
        Value::Object(map) => {
            let mut count = 0;
            for item in map.values_mut() {
                count += resolve_value(item, root)?;
            }
            Ok(count)
        }
        Value::Array(items) => {
            let mut count = 0;
            for item in items.iter_mut() {
                count += resolve_value(item, root)?;
            }
            Ok(count)
        }
        _ => Ok(0),
    }
}

fn resolve_string(s: &mut String, root: &ParameterBag) -> Result<usize, ConfigError> {
    if !s.contains('$') {
        return Ok(0);
    }

    let mut result = String::with_capacity(s.len());
    let mut substitutions = 0;
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                result.push('$');
            }
            Some('{') => {
                chars.next();
                let path = consume_until(&mut chars, '}').ok_or(ConfigError::UnclosedReference)?;
                result.push_str(&lookup_path(root, &path)?);
                substitutions += 1;
            }
            _ => result.push('$'),
        }
    }

    *s = result;
    Ok(substitutions)
}

fn consume_until(chars: &mut std::iter::Peekable<std::str::Chars>, delim: char) -> Option<String> {
    let mut result = String::new();
    for ch in chars.by_ref() {
        if ch == delim {
            return Some(result);
        }
        result.push(ch);
    }
    None
}

fn lookup_path(root: &ParameterBag, path: &str) -> Result<String, ConfigError> {
    let options = root.options();
    let empty_segment = if options.multi && !options.separator.is_empty() {
        path.split(options.separator.as_str()).any(str::is_empty)
    } else {
        path.is_empty()
    };
    if empty_segment {
        return Err(ConfigError::InvalidReferencePath(path.to_string()));
    }

    match root.get(path) {
        None => Err(ConfigError::ReferenceNotFound(path.to_string())),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Null) => Ok(String::new()),
        Some(Value::Array(_) | Value::Object(_)) => {
            Err(ConfigError::NonScalarReference(path.to_string()))
        }
    }
}
