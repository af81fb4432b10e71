//! Request handlers.

pub mod health;
pub mod login;
pub mod mfa;

use axum::{
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::gate::flash::{Flash, FlashLevel};

/// Extract a cookie by name from the `Cookie` request header.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for pair in header.split(';') {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name {
            return Some(value.to_string());
        }
    }
    None
}

/// Whether the request arrived over TLS according to the fronting proxy.
pub(crate) fn forwarded_https(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

pub(crate) fn append_set_cookie(headers: &mut HeaderMap, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(err) => error!("dropping malformed Set-Cookie value: {err}"),
    }
}

pub(crate) fn internal_error(err: &dyn std::fmt::Display) -> Response {
    error!("request failed: {err}");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn flash_html(flashes: &[Flash]) -> String {
    let mut out = String::new();
    for flash in flashes {
        let class = match flash.level {
            FlashLevel::Info => "notice",
            FlashLevel::Warning => "warning",
            FlashLevel::Error => "error",
        };
        out.push_str(&format!(
            "<p class=\"{class}\">{}</p>\n",
            escape_html(&flash.message)
        ));
    }
    out
}

/// Append query pairs to a path, form-encoded.
pub(crate) fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{path}?{encoded}")
}

/// Clamp a post-login target to a local path. Anything that is not a
/// same-site absolute path falls back to the site root.
pub(crate) fn sanitize_redirect(target: Option<&str>) -> String {
    match target {
        Some(t) if t.starts_with('/') && !t.starts_with("//") && !t.contains('\\') => t.to_string(),
        _ => "/".to_string(),
    }
}

pub(crate) fn see_other(location: &str, mut headers: HeaderMap) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            headers.insert(axum::http::header::LOCATION, value);
            (StatusCode::SEE_OTHER, headers).into_response()
        }
        Err(err) => {
            error!("redirect target is not a valid header value: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(crate) fn page_html(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\">\
         <title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_finds_the_named_pair() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("a=1; hydrogate_mfa=abc.def; b=2"),
        );
        assert_eq!(
            cookie_value(&headers, "hydrogate_mfa"),
            Some("abc.def".to_string())
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn forwarded_https_requires_the_header() {
        let mut headers = HeaderMap::new();
        assert!(!forwarded_https(&headers));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert!(forwarded_https(&headers));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
        assert!(!forwarded_https(&headers));
    }

    #[test]
    fn sanitize_redirect_rejects_foreign_targets() {
        assert_eq!(sanitize_redirect(Some("/account")), "/account");
        assert_eq!(sanitize_redirect(Some("//evil.example")), "/");
        assert_eq!(sanitize_redirect(Some("https://evil.example")), "/");
        assert_eq!(sanitize_redirect(Some("/\\evil.example")), "/");
        assert_eq!(sanitize_redirect(None), "/");
    }

    #[test]
    fn with_query_encodes_pairs() {
        assert_eq!(with_query("/mfa/verify", &[]), "/mfa/verify");
        assert_eq!(
            with_query("/mfa/verify", &[("redirect_to", "/a b")]),
            "/mfa/verify?redirect_to=%2Fa+b"
        );
    }

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html("<script>\"x\"&'y'</script>"),
            "&lt;script&gt;&quot;x&quot;&amp;&#39;y&#39;&lt;/script&gt;"
        );
    }
}
