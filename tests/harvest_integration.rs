//! Integration tests for the extraction pipeline
//!
//! These drive the parse stage of real strategies against fixture pages and
//! push the results through the actual CSV writer, checking the merged
//! output byte for byte.

use profile_harvester::client::HttpClient;
use profile_harvester::config::TargetConfig;
use profile_harvester::extract::CssSelectExtractor;
use profile_harvester::schema::RawValue;
use profile_harvester::storage::CsvWriter;
use profile_harvester::{Record, collect_all_columns};

const CARDS_PAGE: &str = r#"
    <html><body>
      <div class="card"><span class="n">Alice</span><span class="e">alice@x.com</span></div>
      <div class="card"><span class="n">Bob</span></div>
    </body></html>
"#;

fn cards_extractor() -> CssSelectExtractor {
    let config: TargetConfig = serde_yaml::from_str(
        "id: test\n\
         source_type: css_select\n\
         url: https://x.example/cards\n\
         item_selector: \".card\"\n\
         field_selectors:\n  name: \".n\"\n  email: \".e\"\n",
    )
    .unwrap();
    CssSelectExtractor::try_new(config, HttpClient::try_new().unwrap()).unwrap()
}

#[test]
fn test_css_select_cards_to_merged_csv() {
    let records = cards_extractor().records_from_html(CARDS_PAGE);
    assert_eq!(records.len(), 2);

    let alice = &records[0];
    assert_eq!(
        (
            alice.source.as_str(),
            alice.name.as_str(),
            alice.url.as_str(),
            alice.email.as_str()
        ),
        ("test", "Alice", "", "alice@x.com")
    );
    assert_eq!(
        alice.raw.get("email"),
        Some(&RawValue::Text("alice@x.com".to_string()))
    );

    let bob = &records[1];
    assert_eq!(bob.name, "Bob");
    assert_eq!(bob.email, "");
    assert_eq!(bob.raw.get("email"), Some(&RawValue::Text(String::new())));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cards.csv");
    let count = CsvWriter::new(&path).write(&records).unwrap();
    assert_eq!(count, 2);

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "source,name,url,email,test_email,test_name",
            "test,Alice,,alice@x.com,alice@x.com,Alice",
            "test,Bob,,,,Bob",
        ]
    );
}

#[test]
fn test_columns_merge_across_sources() {
    let mut records = cards_extractor().records_from_html(CARDS_PAGE);

    // A record from a second target contributes its own prefixed columns
    let mut other = Record::new("club");
    other.name = "Carol".to_string();
    other
        .raw
        .insert("dept".to_string(), RawValue::from("History"));
    records.push(other);

    let columns = collect_all_columns(&records);
    assert_eq!(
        columns,
        vec![
            "source",
            "name",
            "url",
            "email",
            "club_dept",
            "test_email",
            "test_name"
        ]
    );

    // Prefixed columns stay empty for records from other sources
    let row = records[0].flatten(&columns);
    assert_eq!(row[4], "");
    assert_eq!(row[5], "alice@x.com");
    let carol = records[2].flatten(&columns);
    assert_eq!(carol[4], "History");
    assert_eq!(carol[6], "");
}
