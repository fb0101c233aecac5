//! HTML attribute strategy
//!
//! For pages that carry their data in element attributes rather than text:
//! one container element per record, each mapped attribute read verbatim and
//! optionally run through a named transform. The single page fetch aborts
//! the target on failure.

use std::collections::BTreeMap;

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;

use super::{Extractor, resolve_url};
use crate::client::HttpClient;
use crate::config::TargetConfig;
use crate::error::HarvestError;
use crate::schema::{RawValue, Record};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct HtmlAttrsSettings {
    url: String,
    /// One matched element per output record
    container_selector: String,
    /// output key → HTML attribute name
    attribute_map: BTreeMap<String, String>,
    /// output key → `deobfuscate_email` | `absolute_url`
    transforms: BTreeMap<String, String>,
}

pub struct HtmlAttrsExtractor {
    source_id: String,
    base_url: String,
    settings: HtmlAttrsSettings,
    client: HttpClient,
}

impl HtmlAttrsExtractor {
    pub fn try_new(config: TargetConfig, client: HttpClient) -> Result<Self, HarvestError> {
        let settings: HtmlAttrsSettings = config.strategy_settings()?;
        if !settings.container_selector.is_empty() {
            Selector::parse(&settings.container_selector).map_err(|error| {
                HarvestError::Configuration(format!(
                    "target '{}': invalid container_selector '{}': {error}",
                    config.id, settings.container_selector
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

    /// Map a fetched page to records, one per container match.
    pub fn records_from_html(&self, html: &str) -> Vec<Record> {
        let Ok(container) = Selector::parse(&self.settings.container_selector) else {
            return Vec::new();
        };
        let document = Html::parse_document(html);

        let mut records = Vec::new();
        for element in document.select(&container) {
            let mut raw = BTreeMap::new();
            for (out_key, attr_name) in &self.settings.attribute_map {
                let mut value = element.attr(attr_name).unwrap_or_default().trim().to_string();
                match self
                    .settings
                    .transforms
                    .get(out_key)
                    .map(String::as_str)
                    .unwrap_or_default()
                {
                    "deobfuscate_email" => {
                        value = value.replace("[at]", "@").replace("[dot]", ".");
                    }
                    "absolute_url" if !value.is_empty() && !value.starts_with("http") => {
                        value = resolve_url(&self.base_url, &value);
                    }
                    _ => {}
                }
                raw.insert(out_key.clone(), RawValue::Text(value));
            }

            let text_field = |key: &str| {
                raw.get(key)
                    .map(|value| value.to_cell().trim().to_string())
                    .unwrap_or_default()
            };
            let name = text_field("name");
            let email = text_field("email");
            // profile_url takes precedence over a plain url key, by presence
            let url = if raw.contains_key("profile_url") {
                text_field("profile_url")
            } else {
                text_field("url")
            };

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
impl Extractor for HtmlAttrsExtractor {
    async fn extract(&self) -> Result<Vec<Record>, HarvestError> {
        if self.settings.url.is_empty() || self.settings.container_selector.is_empty() {
            log::debug!(
                "Target '{}' missing url or container_selector, skipping",
                self.source_id
            );
            return Ok(Vec::new());
        }
        let body = self.client.get_text(&self.settings.url).await?;
        Ok(self.records_from_html(&body))
    }
}
