//! Generic CSS-selector strategy
//!
//! For pages with a repeating structure (tables, card lists): one item
//! selector picks the repeated element, and each output field is resolved by
//! a sub-selector scoped to that item. The single page fetch aborts the
//! target on failure.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;

use super::{Extractor, element_text, resolve_url};
use crate::client::HttpClient;
use crate::config::TargetConfig;
use crate::error::HarvestError;
use crate::schema::{RawValue, Record};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CssSelectSettings {
    url: String,
    /// One matched element per output record
    item_selector: String,
    /// output key → selector scoped to the item; empty = the item itself
    field_selectors: BTreeMap<String, String>,
    /// output key → attribute to read instead of text
    field_attributes: BTreeMap<String, String>,
    /// output keys whose values get absolutized against `base_url`
    link_fields: BTreeSet<String>,
}

pub struct CssSelectExtractor {
    source_id: String,
    base_url: String,
    settings: CssSelectSettings,
    client: HttpClient,
}

impl CssSelectExtractor {
    pub fn try_new(config: TargetConfig, client: HttpClient) -> Result<Self, HarvestError> {
        let settings: CssSelectSettings = config.strategy_settings()?;
        for selector in std::iter::once(&settings.item_selector)
            .chain(settings.field_selectors.values())
            .filter(|selector| !selector.is_empty())
        {
            Selector::parse(selector).map_err(|error| {
                HarvestError::Configuration(format!(
                    "target '{}': invalid selector '{selector}': {error}",
                    config.id
                ))
            })?;
        }
        Ok(Self {
            base_url: config.base_url().to_string(),
            source_id: config.id,
            settings,
            client,
        })
    }

    /// Map a fetched page to records, one per item match.
    pub fn records_from_html(&self, html: &str) -> Vec<Record> {
        let Ok(item_selector) = Selector::parse(&self.settings.item_selector) else {
            return Vec::new();
        };
        let document = Html::parse_document(html);

        let mut records = Vec::new();
        for item in document.select(&item_selector) {
            let mut raw = BTreeMap::new();
            for (out_key, sub_selector) in &self.settings.field_selectors {
                let target = if sub_selector.is_empty() {
                    Some(item)
                } else {
                    Selector::parse(sub_selector)
                        .ok()
                        .and_then(|selector| item.select(&selector).next())
                };
                let Some(element) = target else {
                    raw.insert(out_key.clone(), RawValue::Text(String::new()));
                    continue;
                };

                let value = match self.settings.field_attributes.get(out_key) {
                    Some(attr) => {
                        let value = element.attr(attr).unwrap_or_default().to_string();
                        if self.settings.link_fields.contains(out_key)
                            && !value.is_empty()
                            && !value.starts_with("http")
                            && !self.base_url.is_empty()
                        {
                            resolve_url(&self.base_url, &value)
                        } else {
                            value
                        }
                    }
                    None => element_text(&element),
                };
                raw.insert(out_key.clone(), RawValue::Text(value.trim().to_string()));
            }

            let text_field = |key: &str| {
                raw.get(key)
                    .map(|value| value.to_cell().trim().to_string())
                    .unwrap_or_default()
            };
            // Fallback chains are by key presence: a mapped-but-empty key
            // still shadows the keys behind it
            let name = ["name", "title"]
                .into_iter()
                .find_map(|key| raw.get(key).map(|_| text_field(key)))
                .unwrap_or_default();
            let email = text_field("email");
            let url = ["url", "profile_url", "link"]
                .into_iter()
                .find_map(|key| raw.get(key).map(|_| text_field(key)))
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
impl Extractor for CssSelectExtractor {
    async fn extract(&self) -> Result<Vec<Record>, HarvestError> {
        if self.settings.url.is_empty() || self.settings.item_selector.is_empty() {
            log::debug!(
                "Target '{}' missing url or item_selector, skipping",
                self.source_id
            );
            return Ok(Vec::new());
        }
        let body = self.client.get_text(&self.settings.url).await?;
        Ok(self.records_from_html(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(yaml: &str) -> CssSelectExtractor {
        let config: TargetConfig = serde_yaml::from_str(yaml).unwrap();
        CssSelectExtractor::try_new(config, HttpClient::try_new().unwrap()).unwrap()
    }

    #[test]
    fn test_scoped_fields_and_fallbacks() {
        let extractor = extractor(
            "id: staff\n\
             source_type: css_select\n\
             base_url: https://uni.example\n\
             url: https://uni.example/staff\n\
             item_selector: tr.staff\n\
             field_selectors:\n  title: td.who\n  link: td.who a\n  room: td.room\n\
             field_attributes:\n  link: href\n\
             link_fields: [link]\n",
        );
        let page = r#"
            <table>
              <tr class="staff">
                <td class="who"><a href="/s/jan">Jan Novak</a></td>
                <td class="room">B12</td>
              </tr>
              <tr class="staff">
                <td class="who">Eva Horak</td>
              </tr>
            </table>
        "#;

        let records = extractor.records_from_html(page);
        assert_eq!(records.len(), 2);

        // No name field mapped, so the title fallback applies
        assert_eq!(records[0].name, "Jan Novak");
        assert_eq!(records[0].url, "https://uni.example/s/jan");
        assert_eq!(
            records[0].raw.get("room"),
            Some(&RawValue::Text("B12".to_string()))
        );

        assert_eq!(records[1].name, "Eva Horak");
        assert_eq!(records[1].url, "");
        assert_eq!(
            records[1].raw.get("room"),
            Some(&RawValue::Text(String::new()))
        );
    }

    #[test]
    fn test_empty_sub_selector_means_item_itself() {
        let extractor = extractor(
            "id: list\n\
             source_type: css_select\n\
             url: https://uni.example/list\n\
             item_selector: li.entry\n\
             field_selectors:\n  name: \"\"\n",
        );
        let records = extractor.records_from_html("<ul><li class=\"entry\"> Zoe </li></ul>");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Zoe");
    }
}
