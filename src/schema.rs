//! Normalized record model and column unification
//!
//! Every strategy emits [`Record`]s with the same four normalized fields plus
//! a per-source bag of raw values. The final column set is only known once
//! all targets have run, so flattening is a second pass over the accumulated
//! records.

use std::collections::{BTreeMap, BTreeSet};

/// The fixed leading columns every output row carries.
pub const CORE_COLUMNS: [&str; 4] = ["source", "name", "url", "email"];

/// A captured raw field value.
///
/// A closed union (text, list of text, flat mapping) so CSV serialization is
/// total: lists and mappings render as compact JSON, text passes through.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl RawValue {
    /// Render the value as a single CSV cell.
    pub fn to_cell(&self) -> String {
        match self {
            RawValue::Text(text) => text.clone(),
            RawValue::List(items) => serde_json::to_string(items).unwrap_or_default(),
            RawValue::Map(map) => serde_json::to_string(map).unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Text(text) => text.is_empty(),
            RawValue::List(items) => items.is_empty(),
            RawValue::Map(map) => map.is_empty(),
        }
    }
}

impl From<String> for RawValue {
    fn from(text: String) -> Self {
        RawValue::Text(text)
    }
}

impl From<&str> for RawValue {
    fn from(text: &str) -> Self {
        RawValue::Text(text.to_string())
    }
}

/// One normalized extracted entity.
///
/// Produced by an extractor, consumed only by the column unifier and the CSV
/// writer; immutable once emitted. Keys in `raw` are strategy-defined and
/// unprefixed; the `{source}_{key}` prefix is applied during column
/// unification, never before.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Identifier of the target configuration that produced this record
    pub source: String,
    /// Best-effort display name, may be empty
    pub name: String,
    /// Canonical profile/detail URL if known
    pub url: String,
    /// Best-effort contact address
    pub email: String,
    /// Every captured field beyond the four normalized ones
    pub raw: BTreeMap<String, RawValue>,
}

impl Record {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Flatten this record against a fixed column order.
    ///
    /// Core columns are copied directly; any other column is populated only
    /// when its `{source}_` prefix matches this record's source and the
    /// suffix key exists in `raw`. Everything else stays empty, so unknown
    /// columns are ignored rather than erroring.
    pub fn flatten(&self, columns: &[String]) -> Vec<String> {
        let prefix = format!("{}_", self.source);
        columns
            .iter()
            .map(|column| match column.as_str() {
                "source" => self.source.clone(),
                "name" => self.name.clone(),
                "url" => self.url.clone(),
                "email" => self.email.clone(),
                other => match other.strip_prefix(&prefix) {
                    Some(key) => self.raw.get(key).map(RawValue::to_cell).unwrap_or_default(),
                    None => String::new(),
                },
            })
            .collect()
    }
}

/// Compute the run-wide column set: the four core columns followed by the
/// alphabetically sorted union of `{source}_{key}` pairs across all records.
pub fn collect_all_columns(records: &[Record]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    for record in records {
        for key in record.raw.keys() {
            seen.insert(format!("{}_{}", record.source, key));
        }
    }
    CORE_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .chain(seen)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, keys: &[&str]) -> Record {
        let mut record = Record::new(source);
        for key in keys {
            record
                .raw
                .insert(key.to_string(), RawValue::Text(format!("v-{key}")));
        }
        record
    }

    #[test]
    fn test_columns_are_core_plus_sorted_union() {
        let records = vec![record("b", &["zeta", "alpha"]), record("a", &["beta"])];
        let columns = collect_all_columns(&records);
        assert_eq!(
            columns,
            vec!["source", "name", "url", "email", "a_beta", "b_alpha", "b_zeta"]
        );
    }

    #[test]
    fn test_column_union_is_order_independent() {
        let mut records = vec![record("x", &["one"]), record("y", &["two"])];
        let forward = collect_all_columns(&records);
        records.reverse();
        assert_eq!(forward, collect_all_columns(&records));
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let mut rec = record("test", &["dept"]);
        rec.name = "Alice".to_string();
        let columns = collect_all_columns(std::slice::from_ref(&rec));
        assert_eq!(rec.flatten(&columns), rec.flatten(&columns));
    }

    #[test]
    fn test_flatten_against_superset_only_adds_empty_cells() {
        let mut rec = record("test", &["dept"]);
        rec.email = "a@x.com".to_string();
        let columns = collect_all_columns(std::slice::from_ref(&rec));
        let row = rec.flatten(&columns);

        let mut superset = columns.clone();
        superset.push("other_title".to_string());
        let wide_row = rec.flatten(&superset);

        assert_eq!(&wide_row[..row.len()], &row[..]);
        assert_eq!(wide_row.last().map(String::as_str), Some(""));
    }

    #[test]
    fn test_flatten_ignores_foreign_prefixes() {
        let mut rec = record("mine", &["dept"]);
        rec.raw
            .insert("title".to_string(), RawValue::Text("Prof".to_string()));
        let columns = vec![
            "source".to_string(),
            "name".to_string(),
            "url".to_string(),
            "email".to_string(),
            "mine_dept".to_string(),
            "other_dept".to_string(),
        ];
        let row = rec.flatten(&columns);
        assert_eq!(row[4], "v-dept");
        assert_eq!(row[5], "");
    }

    #[test]
    fn test_list_and_map_values_render_as_compact_json() {
        let list = RawValue::List(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(list.to_cell(), r#"["a","b"]"#);

        let mut inner = BTreeMap::new();
        inner.insert("k".to_string(), "v".to_string());
        assert_eq!(RawValue::Map(inner).to_cell(), r#"{"k":"v"}"#);
    }
}
