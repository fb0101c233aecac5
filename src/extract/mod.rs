//! Extraction strategies
//!
//! Each strategy implements the one-method [`Extractor`] contract: given its
//! target configuration, fetch and parse the source and return a finite
//! in-memory batch of [`Record`]s. Strategies are selected by the
//! configuration's `source_type` tag through [`get_extractor`], the only
//! dynamic-dispatch point in the system.

mod css_select;
mod html_attrs;
mod html_listing;
mod json_api;

pub use css_select::CssSelectExtractor;
pub use html_attrs::HtmlAttrsExtractor;
pub use html_listing::HtmlListingExtractor;
pub use json_api::JsonApiExtractor;

use async_trait::async_trait;
use url::Url;

use crate::client::HttpClient;
use crate::config::TargetConfig;
use crate::error::HarvestError;
use crate::schema::Record;

/// Extractor contract implemented by every strategy.
///
/// Eager evaluation: the whole batch is produced before control returns.
/// Failure policy is deliberately strategy-specific: some strategies let a
/// fetch failure abort the target, the two-stage listing strategy degrades
/// per-item failures into placeholder records instead.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Fetch and parse the configured source, returning its records.
    async fn extract(&self) -> Result<Vec<Record>, HarvestError>;
}

/// The closed set of extraction strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    JsonApi,
    HtmlListing,
    HtmlAttrs,
    CssSelect,
}

impl SourceType {
    /// Every registered source-type tag, as accepted in configuration files.
    pub const KNOWN_TAGS: [&'static str; 4] =
        ["css_select", "html_attrs", "html_listing", "json_api"];

    /// Resolve a configuration tag, case- and whitespace-insensitively.
    pub fn parse(tag: &str) -> Result<Self, HarvestError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "json_api" => Ok(SourceType::JsonApi),
            "html_listing" => Ok(SourceType::HtmlListing),
            "html_attrs" => Ok(SourceType::HtmlAttrs),
            "css_select" => Ok(SourceType::CssSelect),
            _ => Err(HarvestError::Configuration(format!(
                "unknown source_type '{}', known types: {}",
                tag,
                Self::KNOWN_TAGS.join(", ")
            ))),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            SourceType::JsonApi => "json_api",
            SourceType::HtmlListing => "html_listing",
            SourceType::HtmlAttrs => "html_attrs",
            SourceType::CssSelect => "css_select",
        }
    }
}

/// Build the extractor for a target configuration.
///
/// Strategy settings (including CSS selectors) are validated here, at
/// configuration-load time, so a bad target fails before any fetch happens.
///
/// # Errors
/// Returns [`HarvestError::Configuration`] for an unregistered tag (naming
/// the tag and the known set) or for settings the strategy cannot accept.
pub fn get_extractor(
    config: TargetConfig,
    client: HttpClient,
) -> Result<Box<dyn Extractor>, HarvestError> {
    let source_type = SourceType::parse(&config.source_type)?;
    log::debug!(
        "Target '{}' resolved to strategy '{}'",
        config.id,
        source_type.tag()
    );
    Ok(match source_type {
        SourceType::JsonApi => Box::new(JsonApiExtractor::try_new(config, client)?),
        SourceType::HtmlListing => Box::new(HtmlListingExtractor::try_new(config, client)?),
        SourceType::HtmlAttrs => Box::new(HtmlAttrsExtractor::try_new(config, client)?),
        SourceType::CssSelect => Box::new(CssSelectExtractor::try_new(config, client)?),
    })
}

/// Resolve a possibly-relative href against a base URL.
///
/// Mirrors the lenient joining the strategies rely on: an empty href stays
/// empty, an absolute href passes through, and anything unresolvable is
/// returned unchanged rather than dropped.
pub(crate) fn resolve_url(base: &str, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    if base.is_empty() {
        return href.to_string();
    }
    match Url::parse(&format!("{}/", base.trim_end_matches('/'))) {
        Ok(base) => base
            .join(href)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| href.to_string()),
        Err(_) => href.to_string(),
    }
}

/// Concatenated, per-node-trimmed text of an element.
pub(crate) fn element_text(element: &scraper::ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("")
}
