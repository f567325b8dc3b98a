//! Asset reference extraction from HTML
//!
//! The extractor walks the elements of a page in document order and asks a
//! per-tag [`ReferenceSource`] whether the element carries a reference worth
//! fetching. Two strategies implement that capability:
//! - attribute lookup (`src`, then `href`) for images, scripts, embeds,
//!   inputs and stylesheet links
//! - a narrow `url(...)` pattern over the inline `style` of a `<div>`
//!
//! Only these structures are inspected; this is not a CSS parser.

use regex::Regex;
use scraper::node::Element;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static ASSET_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("img, script, embed, link, input, div").expect("asset selector is valid")
});

static STYLE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*['"]?\s*([^'")\s]+)\s*['"]?\s*\)"#).expect("style url pattern is valid")
});

/// The markup construct a reference was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceTag {
    Image,
    Script,
    Embed,
    StylesheetLink,
    InlineStyleUrl,
    Input,
}

impl SourceTag {
    /// Maps a tag name to the construct it is scanned as
    pub fn for_tag(name: &str) -> Option<Self> {
        match name {
            "img" => Some(Self::Image),
            "script" => Some(Self::Script),
            "embed" => Some(Self::Embed),
            "link" => Some(Self::StylesheetLink),
            "input" => Some(Self::Input),
            "div" => Some(Self::InlineStyleUrl),
            _ => None,
        }
    }

    fn source(self) -> &'static dyn ReferenceSource {
        match self {
            Self::Image | Self::Script | Self::Embed | Self::Input => &SourceAttribute,
            Self::StylesheetLink => &StylesheetLink,
            Self::InlineStyleUrl => &InlineStyleUrl,
        }
    }
}

/// A raw, unresolved reference found on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub raw_value: String,
    pub source_tag: SourceTag,
}

/// Something that can pull a reference candidate out of an element
pub trait ReferenceSource: Sync {
    fn reference(&self, element: &Element) -> Option<String>;
}

/// Reads `src`, falling back to `href`
///
/// `src` wins when both are present.
pub struct SourceAttribute;

impl ReferenceSource for SourceAttribute {
    fn reference(&self, element: &Element) -> Option<String> {
        element
            .attr("src")
            .or_else(|| element.attr("href"))
            .map(str::to_string)
    }
}

/// A `<link>` is only an asset when its `rel` names a stylesheet
pub struct StylesheetLink;

impl ReferenceSource for StylesheetLink {
    fn reference(&self, element: &Element) -> Option<String> {
        let is_stylesheet = element.attr("rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("stylesheet"))
        });

        if is_stylesheet {
            SourceAttribute.reference(element)
        } else {
            None
        }
    }
}

/// First `url(...)` inside an inline `style` attribute
pub struct InlineStyleUrl;

impl ReferenceSource for InlineStyleUrl {
    fn reference(&self, element: &Element) -> Option<String> {
        let style = element.attr("style")?;
        STYLE_URL
            .captures(style)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// A parsed page ready to yield its asset references
///
/// Parsing is lenient: malformed or truncated markup yields whatever
/// elements were recovered before the damage, never an error.
pub struct AssetExtractor {
    document: Html,
}

impl AssetExtractor {
    /// Parses a page body; invalid UTF-8 sequences are replaced
    pub fn parse(body: &[u8]) -> Self {
        let html = String::from_utf8_lossy(body);
        Self {
            document: Html::parse_document(&html),
        }
    }

    /// Lazily yields references in document order
    pub fn references(&self) -> impl Iterator<Item = AssetReference> + '_ {
        self.document.select(&ASSET_SELECTOR).filter_map(|element| {
            let element = element.value();
            let source_tag = SourceTag::for_tag(element.name())?;
            source_tag
                .source()
                .reference(element)
                .map(|raw_value| AssetReference {
                    raw_value,
                    source_tag,
                })
        })
    }
}

/// Convenience function collecting every reference in a page body
pub fn extract_references(body: &[u8]) -> Vec<AssetReference> {
    AssetExtractor::parse(body).references().collect()
}
