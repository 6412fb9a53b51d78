//! Transport-safe serialisation: value sanitising, collision-free field
//! injection, optional key flattening, and line framing.
//!
//! A caller-supplied replacer always runs before the built-in transforms, so
//! built-in safety cannot be bypassed by a custom transform. Recursion depth
//! is bounded; anything deeper than [`MAX_DEPTH`] is replaced with the
//! circular-reference marker instead of recursing without bound.

use serde_json::{Map, Value};

/// Marker substituted at the point a value graph re-enters itself (or
/// exceeds the recursion budget).
pub const CIRCULAR_MARKER: &str = "[Circular ~]";

/// Nesting budget applied while sanitising and flattening.
pub const MAX_DEPTH: usize = 128;

/// Caller-supplied per-value transform, applied before built-in safety.
pub type ReplacerFn = dyn Fn(Value) -> Value + Send + Sync;

/// Walk a value, applying the replacer then the built-in transforms.
///
/// Negative zero becomes the string `"-0"`; JSON has no way to round-trip
/// it. Non-finite floats never appear inside a `Value` and are normalised
/// at payload construction instead.
pub fn sanitise(value: Value, replacer: Option<&ReplacerFn>, depth: usize) -> Value {
    if depth == 0 {
        return Value::String(CIRCULAR_MARKER.to_owned());
    }

    let value = match replacer {
        Some(transform) => transform(value),
        None => value,
    };

    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 && f.is_sign_negative() => Value::String("-0".to_owned()),
            _ => Value::Number(n),
        },
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| (key, sanitise(val, replacer, depth - 1)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|val| sanitise(val, replacer, depth - 1))
                .collect(),
        ),
        other => other,
    }
}

/// Find a key that does not collide with any caller-supplied field,
/// prefixing underscores until free.
pub fn safe_key(map: &Map<String, Value>, desired: &str) -> String {
    let mut key = desired.to_owned();
    while map.contains_key(&key) {
        key.insert(0, '_');
    }
    key
}

/// Replace literal newlines with U+2028 and terminate the frame.
///
/// A multi-line entry must not be mistaken for multiple frames by a
/// newline-delimited receiver.
pub fn clean_line(body: &str) -> String {
    let mut line = body.replace('\n', "\u{2028}");
    line.push('\n');
    line
}

/// Encode a sanitised value; sanitised trees cannot fail to encode, but the
/// fallback keeps the never-panics contract honest.
pub fn stringify(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        log::warn!("failed to encode log entry: {err}");
        String::from("{}")
    })
}

/// Join nested keys with `.` into a single-level mapping.
///
/// Without `arrays_too`, arrays stay in place but their object elements are
/// each flattened individually; with it, array indices become key segments.
/// Non-object inputs are returned untouched.
pub fn flatten(value: Value, arrays_too: bool) -> Value {
    let Value::Object(map) = value else {
        return value;
    };

    let mut target = Map::new();
    for (key, val) in map {
        flatten_entry(&mut target, vec![key], val, arrays_too);
    }
    Value::Object(target)
}

fn flatten_entry(
    target: &mut Map<String, Value>,
    context: Vec<String>,
    value: Value,
    arrays_too: bool,
) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let mut ctx = context.clone();
                ctx.push(key);
                flatten_entry(target, ctx, val, arrays_too);
            }
        }
        Value::Array(items) if arrays_too => {
            for (index, val) in items.into_iter().enumerate() {
                let mut ctx = context.clone();
                ctx.push(index.to_string());
                flatten_entry(target, ctx, val, arrays_too);
            }
        }
        Value::Array(items) => {
            let kept = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(_) => flatten(item, arrays_too),
                    other => other,
                })
                .collect();
            target.insert(context.join("."), Value::Array(kept));
        }
        leaf => {
            target.insert(context.join("."), leaf);
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn clean_line_reframes_embedded_newlines() {
        assert_eq!(clean_line("one\ntwo"), "one\u{2028}two\n");
        assert_eq!(clean_line("plain"), "plain\n");
    }

    #[rstest]
    fn safe_key_prefixes_underscores_until_free() {
        let map = json!({"level": "o", "_level": 1});
        let Value::Object(map) = map else { unreachable!() };

        assert_eq!(safe_key(&map, "level"), "__level");
        assert_eq!(safe_key(&map, "time"), "time");
    }

    #[rstest]
    fn sanitise_terminates_on_deep_nesting() {
        let mut value = json!("leaf");
        for _ in 0..MAX_DEPTH + 10 {
            value = json!({ "next": value });
        }

        let out = sanitise(value, None, MAX_DEPTH);
        let text = stringify(&out);
        assert!(text.contains(CIRCULAR_MARKER));
    }

    #[rstest]
    fn sanitise_rewrites_negative_zero() {
        let value = json!({ "zero": -0.0 });
        let out = sanitise(value, None, MAX_DEPTH);
        assert_eq!(out, json!({ "zero": "-0" }));
    }

    #[rstest]
    fn replacer_runs_before_builtin_transforms() {
        // The replacer output still passes through the negative-zero rule.
        let replacer = |value: Value| match value {
            Value::String(_) => json!(-0.0),
            other => other,
        };
        let out = sanitise(json!({ "field": "text" }), Some(&replacer), MAX_DEPTH);
        assert_eq!(out, json!({ "field": "-0" }));
    }

    #[rstest]
    fn flatten_joins_nested_keys_with_dots() {
        let value = json!({ "a": { "b": { "c": 1 }, "d": 2 }, "e": 3 });
        let flat = flatten(value, false);
        assert_eq!(flat, json!({ "a.b.c": 1, "a.d": 2, "e": 3 }));
    }

    #[rstest]
    fn flatten_keeps_arrays_but_flattens_their_objects() {
        let value = json!({ "items": [ { "a": { "b": 1 } }, 2 ] });
        let flat = flatten(value, false);
        assert_eq!(flat, json!({ "items": [ { "a.b": 1 }, 2 ] }));
    }

    #[rstest]
    fn flatten_arrays_uses_indices_as_key_segments() {
        let value = json!({ "items": [ { "a": 1 }, 2 ] });
        let flat = flatten(value, true);
        assert_eq!(flat, json!({ "items.0.a": 1, "items.1": 2 }));
    }

    #[rstest]
    fn flatten_passes_non_objects_through() {
        assert_eq!(flatten(json!("text"), false), json!("text"));
    }
}
