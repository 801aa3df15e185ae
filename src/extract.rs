// src/extract.rs

//! Shape-driven page extraction.
//!
//! Turns one gallery page into canonical resource candidates using the
//! CSS selectors of a [`ShapePattern`]. The page lists entries
//! newest-first; output is reversed so that inserting candidates in the
//! order produced matches chronological order.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Candidate, ShapePattern};
use crate::utils::{first_srcset_candidate, normalize_image_url, resource_id, strip_query};

/// Compiled selectors for one shape pattern.
struct ShapeSelectors {
    container: Selector,
    title: Selector,
    description: Option<Selector>,
    image: Selector,
    link: Selector,
}

impl ShapeSelectors {
    fn compile(pattern: &ShapePattern) -> Result<Self> {
        Ok(Self {
            container: parse_selector(&pattern.container_selector)?,
            title: parse_selector(&pattern.title_selector)?,
            description: pattern
                .description_selector
                .as_ref()
                .map(|s| parse_selector(s))
                .transpose()?,
            image: parse_selector(&pattern.image_selector)?,
            link: parse_selector(&pattern.link_selector)?,
        })
    }
}

/// Extract resource candidates from raw HTML, oldest first.
///
/// A block that cannot be parsed is logged and skipped; only a shape whose
/// selectors fail to compile aborts the whole call.
pub fn extract(html: &str, pattern: &ShapePattern, base_url: &str) -> Result<Vec<Candidate>> {
    let selectors = ShapeSelectors::compile(pattern)?;
    let document = Html::parse_document(html);

    let blocks: Vec<ElementRef> = document.select(&selectors.container).collect();
    let candidates = blocks
        .iter()
        .rev()
        .filter_map(|block| parse_block(block, &selectors, &pattern.name, base_url))
        .collect();

    Ok(candidates)
}

/// Parse one content block into a candidate.
///
/// Returns `None` when the block lacks a usable title, image, or link, so
/// one malformed block never blocks its siblings.
fn parse_block(
    block: &ElementRef,
    selectors: &ShapeSelectors,
    shape_name: &str,
    base_url: &str,
) -> Option<Candidate> {
    let title_elem = match block.select(&selectors.title).next() {
        Some(elem) => elem,
        None => {
            log::warn!("{shape_name}: skipping block without a title element");
            return None;
        }
    };
    let title = collect_text(&title_elem);
    if title.is_empty() {
        log::warn!("{shape_name}: skipping block with an empty title");
        return None;
    }

    let image_elem = match block.select(&selectors.image).next() {
        Some(elem) => elem,
        None => {
            log::warn!("{shape_name}: skipping block {title:?} without an image");
            return None;
        }
    };

    let description = match &selectors.description {
        Some(sel) => block.select(sel).next().map(|elem| collect_text(&elem)),
        None => image_elem
            .value()
            .attr("alt")
            .map(|alt| alt.trim().to_string()),
    }
    .filter(|text| !text.is_empty())
    .unwrap_or_else(|| title.clone());

    let raw_image = image_elem
        .value()
        .attr("srcset")
        .and_then(first_srcset_candidate)
        .or_else(|| image_elem.value().attr("src"));
    let raw_image = match raw_image {
        Some(url) => url,
        None => {
            log::warn!("{shape_name}: skipping block {title:?} without an image source");
            return None;
        }
    };
    let image_url = normalize_image_url(raw_image, base_url);

    let href = block
        .select(&selectors.link)
        .next()
        .and_then(|elem| elem.value().attr("href"));
    let href = match href {
        Some(href) => href,
        None => {
            log::warn!("{shape_name}: skipping block {title:?} without a link");
            return None;
        }
    };
    let link = strip_query(href).to_string();

    let identifier = match resource_id(&link) {
        Some(id) => id,
        None => {
            log::warn!("{shape_name}: skipping block {title:?} with an empty identifier");
            return None;
        }
    };

    Some(Candidate {
        identifier,
        title,
        description,
        image_url,
        link,
    })
}

fn collect_text(elem: &ElementRef) -> String {
    elem.text().collect::<String>().trim().to_string()
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
