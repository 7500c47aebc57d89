//! Utility functions and helpers.

pub mod http;
pub mod log;

use url::Url;

/// Normalize a site given as a bare name, host or URL.
///
/// Bare names get the `.wikidot.com` suffix; the scheme is always `http`
/// and any path is dropped.
pub fn normalize_site(site: &str) -> String {
    let trimmed = site.trim().trim_end_matches('/');
    let host = Url::parse(trimmed)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| trimmed.split('/').next().unwrap_or_default().to_string());
    let host = if host.contains('.') {
        host
    } else {
        format!("{host}.wikidot.com")
    };
    format!("http://{}", host.to_lowercase())
}

/// Canonical page URL for a page name or URL on the given site.
///
/// Spaces and underscores become dashes and the result is lowercased, so
/// `SCP 173` and `https://site/scp_173` name the same page. A URL on the
/// site's host is rebuilt on `site` whatever its scheme; URLs on other
/// hosts are kept.
pub fn page_url(site: &str, name: &str) -> String {
    let site = site.trim_end_matches('/');
    let host = Url::parse(site)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_lowercase))
        .unwrap_or_default();

    let url = match Url::parse(name) {
        Ok(parsed) if parsed.has_host() => {
            if parsed.host_str().is_some_and(|h| h.eq_ignore_ascii_case(&host)) {
                // Path taken from the raw name so spaces are not percent-encoded.
                let path = name.splitn(4, '/').nth(3).unwrap_or_default();
                format!("{site}/{path}")
            } else {
                name.to_string()
            }
        }
        _ => {
            let path = name.trim_start_matches('/');
            let path = match path.split_once('/') {
                Some((head, rest)) if !host.is_empty() && head.eq_ignore_ascii_case(&host) => rest,
                _ => path,
            };
            format!("{site}/{path}")
        }
    };
    url.replace([' ', '_'], "-").to_lowercase()
}

/// Final path segment of a page URL.
pub fn page_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Extract the numeric id from a forum link such as `/forum/t-123/slug`.
pub fn parse_element_id(href: &str) -> Option<i64> {
    href.split('/')
        .nth(2)?
        .split('-')
        .nth(1)?
        .parse()
        .ok()
}

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
