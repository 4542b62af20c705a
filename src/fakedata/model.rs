//! Record models for the fake data generator
//!
//! A model is an ordered list of fields, each with a kind describing how its
//! value is produced. Models can be written in a compact JSON shorthand, and
//! fields keep the order they are declared in:
//!
//! ```json
//! { "id": "number", "caption": "string", "imageUrl": "picsum400",
//!   "label": ["A", "B"], "owner": { "email": "email" } }
//! ```

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FakeDataError {
    #[error("field '{field}': unknown kind '{kind}'")]
    UnknownKind { field: String, kind: String },
    #[error("field '{field}': invalid picsum resolution '{raw}'")]
    InvalidPicsum { field: String, raw: String },
    #[error("field '{field}': choice list is empty")]
    EmptyChoice { field: String },
    #[error("field '{field}': null is not a field kind")]
    NullKind { field: String },
    #[error("model must be a JSON object")]
    NotAnObject,
    #[error("model is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// How a single field value is generated
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Eight random base-36 characters
    Text,
    /// `user{n}@example.com`
    Email,
    /// RFC 3339 timestamp within the last year
    Date,
    /// Integer in `0..1000`
    Number,
    Boolean,
    /// Random picsum.photos image URL of the given square resolution
    Picsum(u32),
    /// One of the listed values
    OneOf(Vec<Value>),
    Nested(Model),
}

/// Ordered field list describing one record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    fields: Vec<(String, FieldKind)>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, builder style
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push((name.into(), kind));
        self
    }

    pub fn fields(&self) -> &[(String, FieldKind)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses the JSON shorthand
    pub fn from_json(value: &Value) -> Result<Self, FakeDataError> {
        let Value::Object(map) = value else {
            return Err(FakeDataError::NotAnObject);
        };
        let mut model = Model::new();
        for (name, raw) in map {
            let kind = parse_kind(name, raw)?;
            model.fields.push((name.clone(), kind));
        }
        Ok(model)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, FakeDataError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_json(&value)
    }

    /// Model for polaroid-style cards: image, caption and label
    pub fn polaroid() -> Self {
        Model::new()
            .field("id", FieldKind::Number)
            .field("imageUrl", FieldKind::Picsum(400))
            .field("caption", FieldKind::Text)
            .field(
                "label",
                FieldKind::OneOf(vec![Value::from("A"), Value::from("B"), Value::from("C")]),
            )
            .field("createdAt", FieldKind::Date)
    }
}

fn parse_kind(field: &str, raw: &Value) -> Result<FieldKind, FakeDataError> {
    match raw {
        Value::String(kind) => parse_named_kind(field, kind),
        Value::Number(_) => Ok(FieldKind::Number),
        Value::Bool(_) => Ok(FieldKind::Boolean),
        Value::Array(choices) if choices.is_empty() => Err(FakeDataError::EmptyChoice {
            field: field.to_string(),
        }),
        Value::Array(choices) => Ok(FieldKind::OneOf(choices.clone())),
        Value::Object(_) => Model::from_json(raw).map(FieldKind::Nested),
        Value::Null => Err(FakeDataError::NullKind {
            field: field.to_string(),
        }),
    }
}

fn parse_named_kind(field: &str, kind: &str) -> Result<FieldKind, FakeDataError> {
    if let Some(resolution) = kind.strip_prefix("picsum") {
        return resolution
            .parse::<u32>()
            .ok()
            .filter(|res| *res > 0)
            .map(FieldKind::Picsum)
            .ok_or_else(|| FakeDataError::InvalidPicsum {
                field: field.to_string(),
                raw: kind.to_string(),
            });
    }
    match kind.to_ascii_lowercase().as_str() {
        "string" => Ok(FieldKind::Text),
        "email" => Ok(FieldKind::Email),
        "date" => Ok(FieldKind::Date),
        "number" => Ok(FieldKind::Number),
        "boolean" => Ok(FieldKind::Boolean),
        _ => Err(FakeDataError::UnknownKind {
            field: field.to_string(),
            kind: kind.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shorthand_parses_every_kind() {
        let model = Model::from_json(&json!({
            "active": "boolean",
            "createdAt": "date",
            "email": "email",
            "id": "number",
            "name": "String",
            "photo": "picsum400",
            "role": ["admin", "user"],
            "score": 0,
            "verified": true,
            "owner": { "email": "email" }
        }))
        .unwrap();

        let kind_of = |name: &str| {
            model
                .fields()
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, kind)| kind.clone())
        };
        assert_eq!(kind_of("active"), Some(FieldKind::Boolean));
        assert_eq!(kind_of("createdAt"), Some(FieldKind::Date));
        assert_eq!(kind_of("name"), Some(FieldKind::Text));
        assert_eq!(kind_of("photo"), Some(FieldKind::Picsum(400)));
        assert_eq!(kind_of("score"), Some(FieldKind::Number));
        assert_eq!(kind_of("verified"), Some(FieldKind::Boolean));
        assert!(matches!(kind_of("role"), Some(FieldKind::OneOf(choices)) if choices.len() == 2));
        assert!(matches!(kind_of("owner"), Some(FieldKind::Nested(inner)) if inner.len() == 1));
        assert_eq!(model.len(), 10);
    }

    #[test]
    fn bad_shorthand_is_rejected() {
        assert!(matches!(
            Model::from_json(&json!({ "x": "uuid" })),
            Err(FakeDataError::UnknownKind { .. })
        ));
        assert!(matches!(
            Model::from_json(&json!({ "x": "picsumbig" })),
            Err(FakeDataError::InvalidPicsum { .. })
        ));
        assert!(matches!(
            Model::from_json(&json!({ "x": [] })),
            Err(FakeDataError::EmptyChoice { .. })
        ));
        assert!(matches!(
            Model::from_json(&json!({ "x": null })),
            Err(FakeDataError::NullKind { .. })
        ));
        assert!(matches!(
            Model::from_json(&json!([1, 2])),
            Err(FakeDataError::NotAnObject)
        ));
    }

    #[test]
    fn text_models_report_their_parse_error() {
        let err = Model::from_json_str(r#"{ "id": "number", "#).unwrap_err();
        assert!(matches!(&err, FakeDataError::InvalidJson(inner) if inner.is_eof()));
        assert!(err.to_string().starts_with("model is not valid JSON"));

        assert!(matches!(
            Model::from_json_str("[\"id\"]"),
            Err(FakeDataError::NotAnObject)
        ));
    }

    #[test]
    fn parsed_fields_keep_declaration_order() {
        let model = Model::from_json_str(
            r#"{ "zeta": "string", "alpha": "number", "mid": { "b": "date", "a": "email" } }"#,
        )
        .unwrap();
        let names: Vec<&str> = model.fields().iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);

        let Some((_, FieldKind::Nested(inner))) = model.fields().last() else {
            panic!("mid should be a nested model");
        };
        let inner: Vec<&str> = inner.fields().iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(inner, vec!["b", "a"]);
    }

    #[test]
    fn builder_keeps_field_order() {
        let model = Model::polaroid();
        let names: Vec<&str> = model.fields().iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["id", "imageUrl", "caption", "label", "createdAt"]);
    }
}
