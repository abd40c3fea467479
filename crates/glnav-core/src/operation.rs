//! Operation descriptors, arguments and outcomes.
//!
//! Every operation a resource exposes is described by an
//! [`OperationDescriptor`]: its selector and an ordered list of
//! [`Param`]s. The explorer never reflects on code; it only reads these
//! descriptors to decide what to ask the operator.
//!
//! # Typed defaults
//!
//! A parameter default is stored as a typed `serde_json::Value` whose shape
//! matches the parameter's [`ParamKind`]. It is rendered to text only for
//! display, and reused verbatim when the operator accepts it, so a `false`
//! default is passed on as the boolean `false`, never as the string
//! `"false"`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capability::Selector;
use crate::resource::Record;
use crate::{Error, Result};

// ============================================================================
// Parameters
// ============================================================================

/// How operator text is turned into an argument value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Taken literally.
    Text,
    /// Signed integer.
    Integer,
    /// `true`/`false` (also `yes`/`no`, `y`/`n`, `1`/`0`).
    Boolean,
    /// Structured payload, parsed as JSON.
    Json,
}

impl ParamKind {
    /// Parse operator input into a value of this kind.
    pub fn parse(self, input: &str) -> Result<Value> {
        match self {
            ParamKind::Text => Ok(Value::String(input.to_string())),
            ParamKind::Integer => input
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| Error::invalid_input(format!("'{input}' is not an integer"))),
            ParamKind::Boolean => match input.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "n" | "0" => Ok(Value::Bool(false)),
                _ => Err(Error::invalid_input(format!("'{input}' is not a boolean"))),
            },
            ParamKind::Json => serde_json::from_str(input)
                .map_err(|e| Error::invalid_input(format!("invalid JSON payload: {e}"))),
        }
    }

    /// Render a value of this kind for display as a prompt suggestion.
    pub fn render(self, value: &Value) -> String {
        match (self, value) {
            (ParamKind::Json, other) => other.to_string(),
            (_, Value::String(s)) => s.clone(),
            (_, other) => other.to_string(),
        }
    }
}

/// One declared parameter of an operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    /// Parameter name, also used as the prompt label.
    pub name: String,
    /// Value kind.
    pub kind: ParamKind,
    /// Typed default; `None` means the parameter is required.
    pub default: Option<Value>,
}

impl Param {
    /// A required parameter.
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// A parameter with a typed default.
    pub fn optional(name: impl Into<String>, kind: ParamKind, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            default: Some(default.into()),
        }
    }

    /// Whether the operator must supply a value.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Default rendered for display, if any.
    pub fn suggestion(&self) -> Option<String> {
        self.default.as_ref().map(|v| self.kind.render(v))
    }
}

/// Description of one operation exposed by a resource.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationDescriptor {
    /// Operation selector.
    pub selector: Selector,
    /// Declared parameters, in call order.
    pub params: Vec<Param>,
}

impl OperationDescriptor {
    /// An operation without parameters.
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            params: Vec::new(),
        }
    }

    /// Append a parameter.
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Whether the operation takes a parameter of this name.
    pub fn takes(&self, name: &str) -> bool {
        self.param(name).is_some()
    }
}

// ============================================================================
// Arguments
// ============================================================================

/// Ordered named arguments for an invocation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Args(Vec<(String, Value)>);

impl Args {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace an argument, keeping first-insertion order.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Argument value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Argument as text: strings verbatim, other scalars in JSON notation.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Required argument as text.
    pub fn require_text(&self, name: &str) -> Result<String> {
        self.text(name)
            .ok_or_else(|| Error::invalid_input(format!("missing argument '{name}'")))
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// What an invocation produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Nothing to show beyond completion.
    Done,
    /// A structured value.
    Value(Value),
    /// A set of records.
    Records(Vec<Record>),
    /// Raw bytes (downloads).
    Bytes(Vec<u8>),
}

impl Outcome {
    /// Records carried by the outcome, or an error for other shapes.
    pub fn into_records(self) -> Result<Vec<Record>> {
        match self {
            Outcome::Records(records) => Ok(records),
            Outcome::Value(Value::Array(items)) => items
                .into_iter()
                .map(Record::try_from)
                .collect::<Result<Vec<_>>>(),
            other => Err(Error::invalid_data(format!(
                "expected a list of records, got {}",
                other.shape()
            ))),
        }
    }

    /// Short description of the outcome shape, for messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Outcome::Done => "nothing",
            Outcome::Value(_) => "a value",
            Outcome::Records(_) => "records",
            Outcome::Bytes(_) => "bytes",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_text_is_literal() {
        assert_eq!(ParamKind::Text.parse(" 42 ").unwrap(), json!(" 42 "));
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(ParamKind::Integer.parse("30").unwrap(), json!(30));
        assert!(ParamKind::Integer.parse("thirty").is_err());
    }

    #[test]
    fn test_parse_boolean_variants() {
        assert_eq!(ParamKind::Boolean.parse("yes").unwrap(), json!(true));
        assert_eq!(ParamKind::Boolean.parse("False").unwrap(), json!(false));
        assert!(matches!(
            ParamKind::Boolean.parse("maybe"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_json_payload() {
        let value = ParamKind::Json.parse(r#"{"title": "x"}"#).unwrap();
        assert_eq!(value["title"], "x");
        assert!(matches!(
            ParamKind::Json.parse("{title"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_render_default_keeps_type_shape() {
        assert_eq!(ParamKind::Boolean.render(&json!(false)), "false");
        assert_eq!(ParamKind::Integer.render(&json!(30)), "30");
        assert_eq!(ParamKind::Json.render(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(ParamKind::Text.render(&json!("main")), "main");
    }

    #[test]
    fn test_param_required_and_optional() {
        let id = Param::required("id", ParamKind::Text);
        let force = Param::optional("force", ParamKind::Boolean, false);
        assert!(id.is_required());
        assert!(!force.is_required());
        assert_eq!(force.suggestion().as_deref(), Some("false"));
        assert!(id.suggestion().is_none());
    }

    #[test]
    fn test_descriptor_lookup() {
        let op = OperationDescriptor::new(Selector::DELETE)
            .with_param(Param::required("id", ParamKind::Text))
            .with_param(Param::optional("force", ParamKind::Boolean, false));
        assert!(op.takes("id"));
        assert!(!op.takes("data"));
        assert!(op.param("id").unwrap().is_required());
    }

    #[test]
    fn test_args_keep_insertion_order_and_replace() {
        let mut args = Args::new().with("b", 1).with("a", 2);
        args.insert("b", 3);
        let names: Vec<&str> = args.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(args.get("b"), Some(&json!(3)));
        assert_eq!(args.text("a").as_deref(), Some("2"));
    }

    #[test]
    fn test_require_text_missing() {
        assert!(matches!(
            Args::new().require_text("id"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_outcome_into_records_from_array() {
        let outcome = Outcome::Value(json!([{"id": 1}, {"id": 2}]));
        let records = outcome.into_records().unwrap();
        assert_eq!(records.len(), 2);
        assert!(Outcome::Done.into_records().is_err());
    }
}
