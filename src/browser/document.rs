//! Static HTML queries backing the non-scripted drivers.
//!
//! `scraper::Html` is not `Send`, so callers keep the raw markup and parse it
//! per query instead of holding a document across an await point.

use scraper::{ElementRef, Html, Selector};

use crate::browser::ElementQuery;
use crate::error::{AppError, Result};

/// Parse a CSS selector, mapping failures to [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn count(html: &str, selector: &str) -> Result<usize> {
    let sel = parse_selector(selector)?;
    Ok(Html::parse_document(html).select(&sel).count())
}

pub fn texts(html: &str, selector: &str) -> Result<Vec<String>> {
    let sel = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document.select(&sel).map(|e| element_text(&e)).collect())
}

pub fn attributes(html: &str, selector: &str, name: &str) -> Result<Vec<String>> {
    let sel = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&sel)
        .filter_map(|e| e.value().attr(name).map(str::to_string))
        .collect())
}

/// Whether any element matches the query's selector and contains its text.
///
/// Text comparison ignores whitespace differences. Static markup carries no
/// layout, so a hidden attribute is the only visibility signal checked.
pub fn matches(html: &str, query: &ElementQuery) -> Result<bool> {
    let sel = parse_selector(&query.selector)?;
    let document = Html::parse_document(html);
    let wanted = query.text.as_deref().map(normalize_whitespace);

    let found = document.select(&sel).any(|e| {
        if e.value().attr("hidden").is_some() {
            return false;
        }
        match &wanted {
            Some(text) => normalize_whitespace(&element_text(&e)).contains(text.as_str()),
            None => true,
        }
    });
    Ok(found)
}
