//! Search and translate URL construction for selected text.
//!
//! Custom engine URLs are opaque templates: the `%s` placeholder is replaced
//! with the encoded query when present, otherwise the query is appended.

use linkify::{LinkFinder, LinkKind};
use serde::{Deserialize, Serialize};

pub const PLACEHOLDER: &str = "%s";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchEngine {
    #[default]
    Google,
    Bing,
    Baidu,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslateEngine {
    #[default]
    Bing,
    Google,
    Deepl,
}

/// Settings consumed from the text-search collaborator. Defaults match a
/// fresh install.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSettings {
    pub search_engine: SearchEngine,
    pub custom_search_url: String,
    pub translate_engine: TranslateEngine,
}

pub fn search_url(settings: &SearchSettings, query: &str) -> String {
    let encoded = encode_query(query);
    match settings.search_engine {
        SearchEngine::Google => format!("https://www.google.com/search?q={encoded}"),
        SearchEngine::Bing => format!("https://www.bing.com/search?q={encoded}"),
        SearchEngine::Baidu => format!("https://www.baidu.com/s?wd={encoded}"),
        SearchEngine::Custom => expand_template(&settings.custom_search_url, &encoded),
    }
}

pub fn translate_url(settings: &SearchSettings, text: &str) -> String {
    let encoded = encode_query(text);
    match settings.translate_engine {
        TranslateEngine::Bing => format!("https://www.bing.com/translator?text={encoded}"),
        TranslateEngine::Google => {
            format!("https://translate.google.com/?sl=auto&text={encoded}")
        }
        TranslateEngine::Deepl => format!("https://www.deepl.com/translator#auto/auto/{encoded}"),
    }
}

/// Replace the placeholder in a custom template, or append the query when the
/// template has no recognizable placeholder. An empty template falls back to
/// the default engine.
fn expand_template(template: &str, encoded: &str) -> String {
    let template = template.trim();
    if template.is_empty() {
        return format!("https://www.google.com/search?q={encoded}");
    }
    if template.contains(PLACEHOLDER) {
        template.replace(PLACEHOLDER, encoded)
    } else {
        format!("{template}{encoded}")
    }
}

fn encode_query(query: &str) -> String {
    url::form_urlencoded::byte_serialize(query.trim().as_bytes()).collect()
}

/// When dragged/selected text is itself a URL, preview it directly instead of
/// searching for it. Requires the whole trimmed selection to be one link.
pub fn detect_url(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url]);
    let mut links = finder.links(trimmed);
    let link = links.next()?;
    if links.next().is_some() || link.start() != 0 || link.end() != trimmed.len() {
        return None;
    }
    Some(link.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_engine_encodes_query() {
        let url = search_url(&SearchSettings::default(), "rust borrow checker");
        assert_eq!(
            url,
            "https://www.google.com/search?q=rust+borrow+checker"
        );
    }

    #[test]
    fn custom_template_replaces_placeholder() {
        let settings = SearchSettings {
            search_engine: SearchEngine::Custom,
            custom_search_url: "https://search.example/q/%s?lang=en".into(),
            ..SearchSettings::default()
        };
        assert_eq!(
            search_url(&settings, "preview"),
            "https://search.example/q/preview?lang=en"
        );
    }

    #[test]
    fn template_without_placeholder_appends_query() {
        let settings = SearchSettings {
            search_engine: SearchEngine::Custom,
            custom_search_url: "https://search.example/?q=".into(),
            ..SearchSettings::default()
        };
        assert_eq!(
            search_url(&settings, "preview"),
            "https://search.example/?q=preview"
        );
    }

    #[test]
    fn detect_url_requires_full_match() {
        assert_eq!(
            detect_url("  https://example.org/a  "),
            Some("https://example.org/a".to_string())
        );
        assert_eq!(detect_url("see https://example.org please"), None);
        assert_eq!(detect_url("plain words"), None);
    }
}
