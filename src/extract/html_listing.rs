//! Two-stage HTML listing strategy
//!
//! Stage one fetches a listing page and collects candidate links into
//! (identifier, absolute URL) pairs. Stage two fetches each detail page
//! independently and evaluates the configured extraction rules against it.
//!
//! Failure isolation differs from the other strategies on purpose: a detail
//! fetch that fails produces a placeholder record carrying only the
//! identifier and URL, so one broken page never loses the rest of the
//! target or aborts the run.

use std::collections::BTreeMap;

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use super::{Extractor, element_text, resolve_url};
use crate::client::HttpClient;
use crate::config::TargetConfig;
use crate::error::HarvestError;
use crate::schema::{RawValue, Record};

fn default_link_selector() -> String {
    "a[href]".to_string()
}

fn default_link_attr() -> String {
    "href".to_string()
}

fn default_id_from_path() -> i64 {
    -1
}

fn default_true() -> bool {
    true
}

fn default_max_chars() -> usize {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ListingSettings {
    url: String,
    link_selector: String,
    link_attr: String,
    link_filter: LinkFilter,
    /// Path segment index used as the item identifier; negative disables
    id_from_path: i64,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            link_selector: default_link_selector(),
            link_attr: default_link_attr(),
            link_filter: LinkFilter::default(),
            id_from_path: default_id_from_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LinkFilter {
    /// Keep only hrefs containing this substring
    href_contains: String,
    /// Keep only hrefs with exactly this many slash-separated segments
    path_segments: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct DetailSettings {
    extract: Vec<ExtractRule>,
    /// field name → transform name (`mailto_extract`)
    transforms: BTreeMap<String, String>,
}

/// One ordered extraction rule evaluated against a detail page.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ExtractRule {
    field: String,
    from_id: bool,
    from_url: bool,
    selector: String,
    attribute: String,
    text: bool,
    first: bool,
    tag: String,
    stop_at: Vec<String>,
    max_chars: usize,
}

impl Default for ExtractRule {
    fn default() -> Self {
        Self {
            field: String::new(),
            from_id: false,
            from_url: false,
            selector: String::new(),
            attribute: String::new(),
            text: false,
            first: default_true(),
            tag: String::new(),
            stop_at: Vec::new(),
            max_chars: default_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct HtmlListingSettings {
    listing: ListingSettings,
    detail: DetailSettings,
}

pub struct HtmlListingExtractor {
    source_id: String,
    settings: HtmlListingSettings,
    client: HttpClient,
}

impl HtmlListingExtractor {
    pub fn try_new(config: TargetConfig, client: HttpClient) -> Result<Self, HarvestError> {
        let settings: HtmlListingSettings = config.strategy_settings()?;
        validate_selector(&config.id, &settings.listing.link_selector)?;
        for rule in &settings.detail.extract {
            validate_selector(&config.id, &rule.selector)?;
        }
        Ok(Self {
            source_id: config.id,
            settings,
            client,
        })
    }
}

#[async_trait]
impl Extractor for HtmlListingExtractor {
    async fn extract(&self) -> Result<Vec<Record>, HarvestError> {
        let listing_url = &self.settings.listing.url;
        if listing_url.is_empty() {
            log::debug!("Target '{}' has no listing.url, skipping", self.source_id);
            return Ok(Vec::new());
        }

        // Relative detail links resolve against the listing page's own origin
        let base = Url::parse(listing_url)
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_default();

        let body = self.client.get_text(listing_url).await?;
        let links = collect_links(&body, &self.settings.listing, &base);
        log::info!(
            "Target '{}': {} detail page(s) discovered",
            self.source_id,
            links.len()
        );

        let mut records = Vec::with_capacity(links.len());
        for (item_id, item_url) in links {
            let body = match self.client.get_text(&item_url).await {
                Ok(body) => Some(body),
                Err(error) => {
                    log::warn!(
                        "Target '{}': detail fetch failed for '{item_id}': {error}",
                        self.source_id
                    );
                    None
                }
            };
            records.push(detail_record(
                &self.source_id,
                &item_id,
                &item_url,
                body.as_deref(),
                &self.settings.detail,
                &base,
            ));
        }
        Ok(records)
    }
}

fn validate_selector(target: &str, selector: &str) -> Result<(), HarvestError> {
    if selector.is_empty() {
        return Ok(());
    }
    Selector::parse(selector).map_err(|error| {
        HarvestError::Configuration(format!(
            "target '{target}': invalid selector '{selector}': {error}"
        ))
    })?;
    Ok(())
}

/// Collect (identifier, absolute URL) pairs from a listing page.
///
/// The identifier is a deduplication key: a repeated identifier keeps its
/// first position but the last URL wins.
fn collect_links(html: &str, listing: &ListingSettings, base: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let selector_str = if listing.link_selector.is_empty() {
        "a"
    } else {
        &listing.link_selector
    };
    let Ok(selector) = Selector::parse(selector_str) else {
        return Vec::new();
    };

    let mut items: Vec<(String, String)> = Vec::new();
    for anchor in document.select(&selector) {
        let href = anchor.attr(&listing.link_attr).unwrap_or_default().trim();
        if href.is_empty() {
            continue;
        }
        let filter = &listing.link_filter;
        if !filter.href_contains.is_empty() && !href.contains(&filter.href_contains) {
            continue;
        }
        if let Some(expected) = filter.path_segments {
            let segments = href.replace('\\', "/").split('/').count() as i64;
            if segments != expected {
                continue;
            }
        }

        let full_url = resolve_url(base, href.trim_start_matches(['.', '/']));
        let item_id = if listing.id_from_path >= 0 {
            let parts: Vec<&str> = full_url.trim_end_matches('/').split('/').collect();
            parts
                .get(listing.id_from_path as usize)
                .map(|part| part.to_string())
                .unwrap_or_else(|| full_url.clone())
        } else {
            full_url.clone()
        };

        match items.iter_mut().find(|(id, _)| *id == item_id) {
            Some((_, url)) => *url = full_url,
            None => items.push((item_id, full_url)),
        }
    }
    items
}

/// Build the record for one detail page.
///
/// `body` is `None` when the detail fetch failed; the result is then a
/// placeholder with the identifier as name, the URL, and an empty raw bag.
fn detail_record(
    source_id: &str,
    item_id: &str,
    url: &str,
    body: Option<&str>,
    detail: &DetailSettings,
    base: &str,
) -> Record {
    let mut name = item_id.to_string();
    let mut email = String::new();
    let mut raw: BTreeMap<String, RawValue> = BTreeMap::new();

    let Some(body) = body else {
        return Record {
            source: source_id.to_string(),
            name,
            url: url.to_string(),
            email,
            raw,
        };
    };

    let document = Html::parse_document(body);
    raw.insert("member_id".to_string(), RawValue::from(item_id));
    raw.insert("url".to_string(), RawValue::from(url));

    for rule in &detail.extract {
        if rule.field.is_empty() {
            continue;
        }
        if rule.from_id {
            raw.insert(rule.field.clone(), RawValue::from(item_id));
            if rule.field == "name" {
                name = item_id.to_string();
            }
            continue;
        }
        if rule.from_url {
            raw.insert(rule.field.clone(), RawValue::from(url));
            continue;
        }
        let value = if !rule.selector.is_empty() {
            extract_by_rule(&document, rule, base)
        } else if !rule.tag.is_empty() {
            extract_builtin(&document, rule)
        } else {
            continue;
        };
        // Last rule wins, but an empty match never clobbers an earlier value
        if rule.field == "name" && !value.is_empty() {
            name = value.clone();
        } else if rule.field == "email" && !value.is_empty() {
            email = value.clone();
        }
        raw.insert(rule.field.clone(), RawValue::Text(value));
    }

    for (field, transform) in &detail.transforms {
        if transform != "mailto_extract" {
            continue;
        }
        if let Some(RawValue::Text(value)) = raw.get(field) {
            let stripped = mailto_extract(value);
            if (field == "email" || field == "mailto_raw") && !stripped.is_empty() {
                email = stripped.clone();
            }
            raw.insert(field.clone(), RawValue::Text(stripped));
        }
    }

    Record {
        source: source_id.to_string(),
        name,
        url: url.to_string(),
        email,
        raw,
    }
}

/// Evaluate a selector rule: text or attribute of the first match, or of all
/// matches joined with `"; "` when `first` is disabled. `href` attribute
/// values get absolutized against the listing origin.
fn extract_by_rule(document: &Html, rule: &ExtractRule, base: &str) -> String {
    let Ok(selector) = Selector::parse(&rule.selector) else {
        return String::new();
    };
    let mut elements: Vec<_> = document.select(&selector).collect();
    if elements.is_empty() {
        return String::new();
    }
    if rule.first {
        elements.truncate(1);
    }

    let mut values = Vec::new();
    for element in elements {
        let value = if rule.text || rule.attribute.is_empty() {
            element_text(&element)
        } else {
            let attr = element.attr(&rule.attribute).unwrap_or_default().to_string();
            if rule.attribute == "href"
                && !attr.is_empty()
                && !attr.starts_with("http")
                && !base.is_empty()
            {
                resolve_url(base, &attr)
            } else {
                attr
            }
        };
        values.push(value);
    }
    values
        .into_iter()
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The two generic built-ins: `mailto` scans every anchor for the first
/// mailto: link, `page_text` returns visible text cut at the first stop
/// marker and at `max_chars`.
fn extract_builtin(document: &Html, rule: &ExtractRule) -> String {
    match rule.tag.as_str() {
        "mailto" => {
            let Ok(anchors) = Selector::parse("a[href]") else {
                return String::new();
            };
            for anchor in document.select(&anchors) {
                let href = anchor.attr("href").unwrap_or_default();
                if href.contains("mailto:") {
                    return href.replace("mailto:", "").trim().to_string();
                }
            }
            String::new()
        }
        "page_text" => {
            let mut text = document
                .root_element()
                .text()
                .map(str::trim)
                .filter(|chunk| !chunk.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            for marker in &rule.stop_at {
                if let Some(index) = text.find(marker.as_str()) {
                    text.truncate(index);
                }
            }
            text.chars().take(rule.max_chars).collect()
        }
        _ => String::new(),
    }
}

/// Strip a leading `mailto:` scheme from a stored value.
fn mailto_extract(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    if value.contains("mailto:") {
        return value.replace("mailto:", "").trim().to_string();
    }
    value.to_string()
}
