// Origin allow-list matching and the CORS headers added to every relay response.
// Patterns and origins are compared without their http(s):// prefix and case-insensitively.

use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    HeaderMap, HeaderValue, ORIGIN, VARY,
};

const METHODS: &str = "POST,OPTIONS";
const METHODS_WITH_PIXEL: &str = "GET,POST,OPTIONS";

#[derive(Clone, Debug, PartialEq, Eq)]
enum OriginPattern {
    Exact(String),
    /// `*.example.com`: matches `example.com` and any subdomain of it.
    Suffix(String),
}

impl OriginPattern {
    fn parse(pattern: &str) -> Self {
        let host = strip_scheme(pattern.trim()).to_ascii_lowercase();
        match host.strip_prefix("*.") {
            Some(suffix) => OriginPattern::Suffix(suffix.to_string()),
            None => OriginPattern::Exact(host),
        }
    }

    fn matches(&self, origin_host: &str) -> bool {
        match self {
            OriginPattern::Exact(host) => origin_host == host,
            OriginPattern::Suffix(suffix) => {
                origin_host == suffix
                    || origin_host
                        .strip_suffix(suffix.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct CorsPolicy {
    patterns: Vec<OriginPattern>,
    allow_methods: HeaderValue,
}

impl CorsPolicy {
    pub fn new(origins: &[String], pixel: bool) -> Self {
        let patterns = origins
            .iter()
            .filter(|o| !o.trim().is_empty())
            .map(|o| OriginPattern::parse(o))
            .collect();

        let allow_methods = match pixel {
            true => HeaderValue::from_static(METHODS_WITH_PIXEL),
            false => HeaderValue::from_static(METHODS),
        };

        Self {
            patterns,
            allow_methods,
        }
    }

    /// With no patterns configured every origin is allowed, including a missing one.
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        let Some(origin) = origin.filter(|o| !o.is_empty()) else {
            return false;
        };

        let host = strip_scheme(origin).to_ascii_lowercase();
        self.patterns.iter().any(|p| p.matches(&host))
    }

    /// Writes the CORS response headers for a request carrying `request_headers`.
    ///
    /// Returns whether the origin was allowed.
    pub fn apply(&self, request_headers: &HeaderMap, response_headers: &mut HeaderMap) -> bool {
        let origin = request_headers.get(ORIGIN);
        let origin_str = origin.and_then(|o| o.to_str().ok());
        let allowed = self.is_allowed(origin_str);

        let allow_origin = match (allowed, origin) {
            (true, Some(value)) if !value.is_empty() => value.clone(),
            (true, _) => HeaderValue::from_static("*"),
            (false, _) => HeaderValue::from_static("null"),
        };

        response_headers.insert(VARY, HeaderValue::from_static("Origin"));
        response_headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
        response_headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        response_headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );

        allowed
    }
}

fn strip_scheme(value: &str) -> &str {
    let lower_prefix = |prefix: &str| {
        value
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };

    if lower_prefix("https://") {
        &value["https://".len()..]
    } else if lower_prefix("http://") {
        &value["http://".len()..]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(origins: &[&str]) -> CorsPolicy {
        let origins: Vec<String> = origins.iter().map(|o| o.to_string()).collect();
        CorsPolicy::new(&origins, false)
    }

    #[test]
    fn test_empty_list_allows_everything() {
        let cors = policy(&[]);
        assert!(cors.is_allowed(Some("https://evil.com")));
        assert!(cors.is_allowed(None));
    }

    #[test]
    fn test_wildcard_suffix() {
        let cors = policy(&["*.framer.app"]);
        assert!(cors.is_allowed(Some("https://sub.framer.app")));
        assert!(cors.is_allowed(Some("https://a.b.framer.app")));
        assert!(cors.is_allowed(Some("https://framer.app")));
        assert!(!cors.is_allowed(Some("https://evil.com")));
        // Suffix must align with a label boundary
        assert!(!cors.is_allowed(Some("https://notframer.app")));
        assert!(!cors.is_allowed(None));
    }

    #[test]
    fn test_exact_match_ignores_scheme_and_case() {
        let cors = policy(&["https://Example.com", " www.site.io "]);
        assert!(cors.is_allowed(Some("http://example.com")));
        assert!(cors.is_allowed(Some("HTTPS://EXAMPLE.COM")));
        assert!(cors.is_allowed(Some("https://www.site.io")));
        assert!(!cors.is_allowed(Some("https://sub.example.com")));
        // Ports are part of the host comparison
        assert!(!cors.is_allowed(Some("https://example.com:8443")));
    }

    #[test]
    fn test_headers_for_allowed_origin() {
        let cors = policy(&["*.framer.app"]);
        let mut request = HeaderMap::new();
        request.insert(ORIGIN, HeaderValue::from_static("https://sub.framer.app"));

        let mut response = HeaderMap::new();
        assert!(cors.apply(&request, &mut response));

        assert_eq!(response.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "https://sub.framer.app");
        assert_eq!(response.get(VARY).unwrap(), "Origin");
        assert_eq!(response.get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "POST,OPTIONS");
        assert_eq!(response.get(ACCESS_CONTROL_ALLOW_HEADERS).unwrap(), "Content-Type");
    }

    #[test]
    fn test_headers_for_rejected_origin() {
        let cors = policy(&["*.framer.app"]);
        let mut request = HeaderMap::new();
        request.insert(ORIGIN, HeaderValue::from_static("https://evil.com"));

        let mut response = HeaderMap::new();
        assert!(!cors.apply(&request, &mut response));
        assert_eq!(response.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "null");
    }

    #[test]
    fn test_wildcard_origin_without_header() {
        let cors = CorsPolicy::new(&[], true);
        let mut response = HeaderMap::new();
        assert!(cors.apply(&HeaderMap::new(), &mut response));

        assert_eq!(response.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert_eq!(
            response.get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "GET,POST,OPTIONS"
        );
    }
}
