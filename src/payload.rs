//! Payload shapes accepted by [`Logger::log`](crate::Logger::log).
//!
//! A payload is either plain text, a structured JSON object, an ordered list
//! (logged one entry per element), or a captured error. Conversions from
//! scalar types normalise values JSON cannot carry: non-finite floats become
//! the strings `"NaN"`, `"Infinity"` and `"-Infinity"`, and negative zero
//! becomes `"-0"`.

use serde_json::{Map, Value};

/// One log call argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Rendered as `<levelName> <text>` on the wire.
    Text(String),
    /// Rendered as a JSON object with injected time/level fields.
    Data(Map<String, Value>),
    /// Logged recursively, one call per element, preserving order.
    List(Vec<Payload>),
    /// An error captured as `{name, message}` plus an optional source chain.
    Error(ErrorInfo),
    /// Absent payload; reported as a missing-payload call error.
    Empty,
}

/// Error value shaped for transport.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    /// Messages of the error and its `source()` chain, outermost first.
    /// Only serialised when the stack-inclusion option is enabled.
    pub chain: Vec<String>,
}

impl ErrorInfo {
    /// Capture an error's short type name, message, and source chain.
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let full = std::any::type_name::<E>();
        let name = full.rsplit("::").next().unwrap_or(full).to_owned();

        let mut chain = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }

        Self {
            name,
            message: err.to_string(),
            chain,
        }
    }

    /// Build the transport map, including the source chain when requested.
    pub(crate) fn to_map(&self, with_stack: bool) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_owned(), Value::String(self.name.clone()));
        map.insert("message".to_owned(), Value::String(self.message.clone()));
        if with_stack {
            let stack = self
                .chain
                .iter()
                .map(|line| Value::String(line.trim().to_owned()))
                .collect();
            map.insert("stack".to_owned(), Value::Array(stack));
        }
        map
    }
}

/// Textual form of a float, preserving values JSON cannot represent.
pub(crate) fn float_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value == f64::INFINITY {
        "Infinity".to_owned()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_owned()
    } else if value == 0.0 && value.is_sign_negative() {
        "-0".to_owned()
    } else {
        value.to_string()
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_owned())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<i64> for Payload {
    fn from(value: i64) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<u64> for Payload {
    fn from(value: u64) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<f64> for Payload {
    fn from(value: f64) -> Self {
        Payload::Text(float_text(value))
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<ErrorInfo> for Payload {
    fn from(info: ErrorInfo) -> Self {
        Payload::Error(info)
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Payload::Data(map)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Payload::Empty,
            Value::Object(map) => Payload::Data(map),
            Value::Array(items) => Payload::List(items.into_iter().map(Payload::from).collect()),
            Value::String(text) => Payload::Text(text),
            Value::Number(n) => Payload::Text(n.to_string()),
            Value::Bool(b) => Payload::Text(b.to_string()),
        }
    }
}

impl<P: Into<Payload>> From<Vec<P>> for Payload {
    fn from(items: Vec<P>) -> Self {
        Payload::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(f64::NAN, "NaN")]
    #[case(f64::INFINITY, "Infinity")]
    #[case(f64::NEG_INFINITY, "-Infinity")]
    #[case(-0.0, "-0")]
    #[case(2.5, "2.5")]
    fn troublesome_floats_render_as_text(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(Payload::from(value), Payload::Text(expected.to_owned()));
    }

    #[rstest]
    fn json_values_map_onto_payload_shapes() {
        assert_eq!(Payload::from(json!(null)), Payload::Empty);
        assert_eq!(Payload::from(json!("hi")), Payload::Text("hi".into()));
        assert_eq!(Payload::from(json!(3)), Payload::Text("3".into()));
        assert!(matches!(Payload::from(json!({"a": 1})), Payload::Data(_)));
        assert!(matches!(Payload::from(json!([1, 2])), Payload::List(items) if items.len() == 2));
    }

    #[rstest]
    fn captured_errors_carry_name_message_and_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "no kittens found");
        let info = ErrorInfo::from_error(&io_err);

        assert_eq!(info.name, "Error");
        assert_eq!(info.message, "no kittens found");
        assert_eq!(info.chain, vec!["no kittens found".to_owned()]);
    }

    #[rstest]
    fn stack_is_omitted_unless_requested() {
        let info = ErrorInfo {
            name: "Error".into(),
            message: "boom".into(),
            chain: vec!["boom".into(), "  root cause ".into()],
        };

        let plain = info.to_map(false);
        assert!(!plain.contains_key("stack"));

        let with_stack = info.to_map(true);
        assert_eq!(with_stack["stack"], json!(["boom", "root cause"]));
    }
}
