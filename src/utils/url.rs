// src/utils/url.rs

//! URL manipulation utilities.

/// Take the first candidate URL out of a responsive `srcset` attribute.
///
/// A srcset lists `url descriptor` pairs separated by commas; only the URL
/// of the first pair is wanted.
pub fn first_srcset_candidate(srcset: &str) -> Option<&str> {
    let first = srcset.split(',').next()?.trim();
    let url = first.split_whitespace().next()?;
    if url.is_empty() { None } else { Some(url) }
}

/// Normalize an image URL to an explicit scheme.
///
/// Protocol-relative URLs (`//host/...`) become `https://host/...`; URLs
/// with no scheme at all are presumed host-relative and resolved against
/// the site base URL.
pub fn normalize_image_url(raw: &str, base_url: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return raw.to_string();
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return format!("https://{rest}");
    }
    if raw.starts_with('/') {
        return format!("{}{}", base_url.trim_end_matches('/'), raw);
    }
    format!("{}/{}", base_url.trim_end_matches('/'), raw)
}

/// Strip the query string (everything from the first `?` onward).
pub fn strip_query(link: &str) -> &str {
    match link.find('?') {
        Some(idx) => &link[..idx],
        None => link,
    }
}

/// Derive a stable resource identifier: the final `/`-delimited path
/// segment of a query-stripped link. Empty segments yield `None`.
pub fn resource_id(link: &str) -> Option<String> {
    let stripped = strip_query(link);
    let last = stripped.rsplit('/').next()?;
    if last.is_empty() {
        None
    } else {
        Some(last.to_string())
    }
}
