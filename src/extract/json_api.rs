//! JSON API strategy
//!
//! Fetches one JSON document, descends a dot-separated data path to the item
//! sequence, and maps each item's fields through per-field dot-path lookups
//! and named transforms. A top-level fetch failure aborts the whole target;
//! there are no partial records from this strategy.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{Extractor, resolve_url};
use crate::client::HttpClient;
use crate::config::TargetConfig;
use crate::error::HarvestError;
use crate::schema::{RawValue, Record};

fn default_data_path() -> String {
    "data".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ApiSettings {
    url: String,
    #[serde(default = "default_data_path")]
    data_path: String,
}

/// Settings consumed by the JSON API strategy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct JsonApiSettings {
    api: ApiSettings,
    /// output key → dot-path into each item; order decides the name fallback
    field_mapping: Map<String, Value>,
    name_field: String,
    url_field: String,
    /// output key → transform name (`raw`, `list_join`, `andrew_email`)
    transforms: BTreeMap<String, String>,
}

pub struct JsonApiExtractor {
    source_id: String,
    base_url: String,
    settings: JsonApiSettings,
    client: HttpClient,
}

impl JsonApiExtractor {
    pub fn try_new(config: TargetConfig, client: HttpClient) -> Result<Self, HarvestError> {
        let settings = config.strategy_settings()?;
        Ok(Self {
            source_id: config.id.clone(),
            base_url: config.base_url().to_string(),
            settings,
            client,
        })
    }

    /// Map a fetched payload to records. Non-object items are skipped.
    pub fn records_from_payload(&self, payload: &Value) -> Vec<Record> {
        let data = descend_path(payload, &self.settings.api.data_path);
        let items: Vec<&Value> = match data {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single) => vec![single],
            None => Vec::new(),
        };

        let mut records = Vec::new();
        for item in items {
            if !item.is_object() {
                continue;
            }
            let mut raw = BTreeMap::new();
            for (out_key, path) in &self.settings.field_mapping {
                let path = path.as_str().unwrap_or_default();
                let value = descend_path(item, path);
                let transform = self
                    .settings
                    .transforms
                    .get(out_key)
                    .map(String::as_str)
                    .unwrap_or("raw");
                raw.insert(out_key.clone(), apply_transform(value, transform));
            }

            let name_key = if self.settings.name_field.is_empty() {
                self.settings
                    .field_mapping
                    .keys()
                    .next()
                    .cloned()
                    .unwrap_or_default()
            } else {
                self.settings.name_field.clone()
            };
            let name = match raw.get(&name_key) {
                // List-valued names are space-joined, dropping empty parts
                Some(RawValue::List(parts)) => parts
                    .iter()
                    .filter(|part| !part.is_empty())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" "),
                Some(value) => value.to_cell(),
                None => String::new(),
            }
            .trim()
            .to_string();

            let url = if !self.settings.url_field.is_empty() {
                match raw.get(&self.settings.url_field) {
                    Some(value) if !value.is_empty() => {
                        resolve_url(&self.base_url, &value.to_cell())
                    }
                    _ => String::new(),
                }
            } else {
                String::new()
            };

            let email = raw
                .get("email")
                .map(|value| value.to_cell().trim().to_string())
                .unwrap_or_default();

            records.push(Record {
                source: self.source_id.clone(),
                name,
                url,
                email,
                raw,
            });
        }
        records
    }
}

#[async_trait]
impl Extractor for JsonApiExtractor {
    async fn extract(&self) -> Result<Vec<Record>, HarvestError> {
        let url = &self.settings.api.url;
        if url.is_empty() {
            log::debug!("Target '{}' has no api.url, skipping", self.source_id);
            return Ok(Vec::new());
        }
        let payload = self.client.get_json(url).await?;
        Ok(self.records_from_payload(&payload))
    }
}

/// Walk a dot-separated path of mapping keys. A missing segment or a
/// non-mapping intermediate yields nothing.
fn descend_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn apply_transform(value: Option<&Value>, transform: &str) -> RawValue {
    match transform {
        "list_join" => list_join(value),
        "andrew_email" => andrew_email(value),
        // "raw" and anything unrecognized pass the value through
        _ => raw_value(value),
    }
}

/// Join sequence elements with `"; "`, dropping empties; non-sequence values
/// are stringified as-is.
fn list_join(value: Option<&Value>) -> RawValue {
    match value {
        Some(Value::Array(items)) => RawValue::Text(
            items
                .iter()
                .map(|item| scalar_text(item).trim().to_string())
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join("; "),
        ),
        Some(other) => RawValue::Text(scalar_text(other)),
        None => RawValue::Text(String::new()),
    }
}

/// Format a bare Andrew identifier into a full address; empty in, empty out.
fn andrew_email(value: Option<&Value>) -> RawValue {
    let id = value.map(scalar_text).unwrap_or_default();
    if id.is_empty() {
        RawValue::Text(String::new())
    } else {
        RawValue::Text(format!("{id}@andrew.cmu.edu"))
    }
}

fn raw_value(value: Option<&Value>) -> RawValue {
    match value {
        None | Some(Value::Null) => RawValue::Text(String::new()),
        Some(Value::String(text)) => RawValue::Text(text.clone()),
        Some(Value::Array(items)) => RawValue::List(items.iter().map(scalar_text).collect()),
        Some(Value::Object(map)) => RawValue::Map(
            map.iter()
                .map(|(key, value)| (key.clone(), scalar_text(value)))
                .collect(),
        ),
        Some(other) => RawValue::Text(scalar_text(other)),
    }
}

/// Single-cell text for a JSON value; nested structures fall back to compact
/// JSON so nothing is lost.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extractor(settings_yaml: &str) -> JsonApiExtractor {
        let config: TargetConfig = serde_yaml::from_str(settings_yaml).unwrap();
        JsonApiExtractor::try_new(config, HttpClient::try_new().unwrap()).unwrap()
    }

    #[test]
    fn test_andrew_email_transform() {
        assert_eq!(
            andrew_email(Some(&json!("jdoe"))),
            RawValue::Text("jdoe@andrew.cmu.edu".to_string())
        );
        assert_eq!(
            andrew_email(Some(&json!(""))),
            RawValue::Text(String::new())
        );
        assert_eq!(andrew_email(None), RawValue::Text(String::new()));
    }

    #[test]
    fn test_list_join_transform() {
        assert_eq!(
            list_join(Some(&json!(["a", "", "b"]))),
            RawValue::Text("a; b".to_string())
        );
        assert_eq!(
            list_join(Some(&json!("solo"))),
            RawValue::Text("solo".to_string())
        );
    }

    #[test]
    fn test_descend_path() {
        let payload = json!({"a": {"b": {"c": 7}}});
        assert_eq!(descend_path(&payload, "a.b.c"), Some(&json!(7)));
        assert_eq!(descend_path(&payload, "a.x.c"), None);
        assert_eq!(descend_path(&payload, "a.b.c.d"), None);
    }

    #[test]
    fn test_records_from_payload_maps_fields() {
        let extractor = extractor(
            "id: cmu\n\
             source_type: json_api\n\
             base_url: https://www.cs.cmu.edu\n\
             api:\n  url: https://api.example/people\n  data_path: result.people\n\
             field_mapping:\n  name: full_name\n  email: andrew_id\n  page: profile.path\n\
             name_field: name\n\
             url_field: page\n\
             transforms:\n  email: andrew_email\n",
        );
        let payload = json!({
            "result": {"people": [
                {"full_name": "Jane Doe", "andrew_id": "jdoe",
                 "profile": {"path": "people/jdoe"}},
                "not-an-object"
            ]}
        });

        let records = extractor.records_from_payload(&payload);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.source, "cmu");
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.email, "jdoe@andrew.cmu.edu");
        assert_eq!(record.url, "https://www.cs.cmu.edu/people/jdoe");
        assert_eq!(
            record.raw.get("email"),
            Some(&RawValue::Text("jdoe@andrew.cmu.edu".to_string()))
        );
    }

    #[test]
    fn test_single_object_payload_is_one_item_sequence() {
        let extractor = extractor(
            "id: single\n\
             source_type: json_api\n\
             api:\n  url: https://api.example/person\n  data_path: person\n\
             field_mapping:\n  name: display\n",
        );
        let payload = json!({"person": {"display": "Solo"}});
        let records = extractor.records_from_payload(&payload);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Solo");
    }

    #[test]
    fn test_missing_data_path_yields_no_records() {
        let extractor = extractor(
            "id: empty\nsource_type: json_api\napi:\n  url: https://api.example\n",
        );
        let records = extractor.records_from_payload(&json!({"other": []}));
        assert!(records.is_empty());
    }
}
