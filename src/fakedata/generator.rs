//! Random record generation from a [`Model`]

use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use rand::Rng;
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::window::DataSource;
use crate::fakedata::model::{FieldKind, Model};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const YEAR_MS: i64 = 31_536_000_000;

/// Generates `quantity` records following `model`
pub fn make_fake_records<R: Rng + ?Sized>(
    model: &Model,
    quantity: usize,
    rng: &mut R,
) -> Vec<Value> {
    debug!(fields = model.len(), quantity, "generating fake records");
    (0..quantity).map(|_| generate_object(model, rng)).collect()
}

fn generate_object<R: Rng + ?Sized>(model: &Model, rng: &mut R) -> Value {
    let mut object = Map::new();
    for (name, kind) in model.fields() {
        object.insert(name.clone(), generate_value(kind, rng));
    }
    Value::Object(object)
}

fn generate_value<R: Rng + ?Sized>(kind: &FieldKind, rng: &mut R) -> Value {
    match kind {
        FieldKind::Text => Value::String(
            (0..8)
                .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
                .collect(),
        ),
        FieldKind::Email => Value::String(format!("user{}@example.com", rng.gen_range(0..1000))),
        FieldKind::Date => {
            let age = ChronoDuration::milliseconds(rng.gen_range(0..YEAR_MS));
            Value::String((Utc::now() - age).to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        FieldKind::Number => Value::from(rng.gen_range(0..1000u32)),
        FieldKind::Boolean => Value::Bool(rng.gen_bool(0.5)),
        FieldKind::Picsum(resolution) => Value::String(format!(
            "https://picsum.photos/{resolution}?random={}",
            rng.gen_range(0..10_000)
        )),
        FieldKind::OneOf(choices) => choices
            .get(rng.gen_range(0..choices.len().max(1)))
            .cloned()
            .unwrap_or(Value::Null),
        FieldKind::Nested(inner) => generate_object(inner, rng),
    }
}

/// Generated records exposed as a pile data source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<Value>,
}

impl RecordSet {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }

    pub fn generate<R: Rng + ?Sized>(model: &Model, quantity: usize, rng: &mut R) -> Self {
        Self::new(make_fake_records(model, quantity, rng))
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// String field of a record, for captions and logs
    pub fn text_field(&self, index: usize, field: &str) -> Option<&str> {
        self.records.get(index)?.get(field)?.as_str()
    }
}

impl DataSource for RecordSet {
    type Record = Value;

    fn len(&self) -> usize {
        self.records.len()
    }

    fn get(&self, index: usize) -> Option<&Value> {
        self.records.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(2024)
    }

    #[test]
    fn records_follow_field_kinds() {
        let model = Model::from_json(&json!({
            "caption": "string",
            "email": "email",
            "createdAt": "date",
            "id": "number",
            "active": "boolean",
            "photo": "picsum300",
            "role": ["admin", "guest"],
            "owner": { "name": "string" }
        }))
        .unwrap();

        let records = make_fake_records(&model, 20, &mut rng());
        assert_eq!(records.len(), 20);

        for record in &records {
            let caption = record["caption"].as_str().unwrap();
            assert_eq!(caption.len(), 8);
            assert!(caption.bytes().all(|b| BASE36.contains(&b)));

            let email = record["email"].as_str().unwrap();
            assert!(email.starts_with("user") && email.ends_with("@example.com"));

            let created = record["createdAt"].as_str().unwrap();
            let created = DateTime::parse_from_rfc3339(created).unwrap();
            assert!(created.with_timezone(&Utc) <= Utc::now());

            assert!(record["id"].as_u64().unwrap() < 1000);
            assert!(record["active"].is_boolean());
            assert!(record["photo"]
                .as_str()
                .unwrap()
                .starts_with("https://picsum.photos/300?random="));

            let role = record["role"].as_str().unwrap();
            assert!(role == "admin" || role == "guest");
            assert_eq!(record["owner"]["name"].as_str().map(str::len), Some(8));
        }
    }

    #[test]
    fn same_seed_same_shape() {
        let model = Model::polaroid();
        let first = make_fake_records(&model, 5, &mut rng());
        let second = make_fake_records(&model, 5, &mut rng());
        assert_eq!(first[0]["caption"], second[0]["caption"]);
        assert_eq!(first[4]["imageUrl"], second[4]["imageUrl"]);
    }

    #[test]
    fn record_set_is_a_data_source() {
        let set = RecordSet::generate(&Model::polaroid(), 6, &mut rng());
        assert_eq!(DataSource::len(&set), 6);
        assert!(DataSource::get(&set, 5).is_some());
        assert!(DataSource::get(&set, 6).is_none());
        assert_eq!(set.text_field(0, "caption").map(str::len), Some(8));
        assert_eq!(set.text_field(0, "missing"), None);
    }
}
