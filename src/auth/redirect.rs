//! Helpers for sending the user back to the page they asked for after logging in.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Return the path and query of `raw_url` if it is safe to redirect to.
///
/// Only relative URLs on this site are accepted, and never the log-in page itself.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    let path_and_query = uri.path_and_query()?.as_str();
    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return None;
    }

    let path = path_and_query
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(path_and_query);

    (path != endpoints::LOG_IN_VIEW).then(|| path_and_query.to_owned())
}

/// Build the log-in page URL with a `redirect_url` query pointing back to
/// the page that `request` came from.
///
/// HTMX requests to `/api` use the page in the `HX-Current-URL` header rather
/// than the API route. Falls back to the plain log-in page.
pub fn build_log_in_redirect_url(request: &Request) -> String {
    let target = if request.uri().path().starts_with("/api") {
        request
            .headers()
            .get("hx-current-url")
            .and_then(|header| header.to_str().ok())
            .and_then(|current_url| current_url.parse::<Uri>().ok())
            .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_owned()))
            .and_then(|path_and_query| normalize_redirect_url(&path_and_query))
    } else {
        request
            .uri()
            .path_and_query()
            .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
    };

    let Some(target) = target else {
        return endpoints::LOG_IN_VIEW.to_owned();
    };

    match serde_urlencoded::to_string([("redirect_url", &target)]) {
        Ok(query) => format!("{}?{}", endpoints::LOG_IN_VIEW, query),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, extract::Request};

    use crate::endpoints;

    use super::{build_log_in_redirect_url, normalize_redirect_url};

    #[test]
    fn accepts_relative_path_with_query() {
        assert_eq!(
            normalize_redirect_url("/chart?foo=bar"),
            Some("/chart?foo=bar".to_owned())
        );
    }

    #[test]
    fn rejects_other_sites_and_log_in_page() {
        assert_eq!(normalize_redirect_url("https://evil.example/chart"), None);
        assert_eq!(normalize_redirect_url("//evil.example/chart"), None);
        assert_eq!(normalize_redirect_url(endpoints::LOG_IN_VIEW), None);
    }

    #[test]
    fn page_request_redirects_back_to_page() {
        let request = Request::builder()
            .uri(endpoints::CHART_VIEW)
            .body(Body::empty())
            .unwrap();

        let url = build_log_in_redirect_url(&request);

        assert_eq!(url, "/log_in?redirect_url=%2Fchart");
    }

    #[test]
    fn api_request_redirects_back_to_current_page() {
        let request = Request::builder()
            .uri(endpoints::CHART_API)
            .header("hx-current-url", "https://localhost:3000/wallets")
            .body(Body::empty())
            .unwrap();

        let url = build_log_in_redirect_url(&request);

        assert_eq!(url, "/log_in?redirect_url=%2Fwallets");
    }

    #[test]
    fn api_request_without_current_url_goes_to_log_in() {
        let request = Request::builder()
            .uri(endpoints::CHART_API)
            .body(Body::empty())
            .unwrap();

        assert_eq!(build_log_in_redirect_url(&request), endpoints::LOG_IN_VIEW);
    }
}
