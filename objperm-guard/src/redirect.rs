//! Login redirects for denied requests.

use axum::http::{header, HeaderMap, Uri};
use url::Url;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Build `<login_url>?next=<next>`, keeping any other query parameters of
/// `login_url` and replacing an existing `next`.
///
/// `next` is percent-encoded with `/` left readable.
pub fn redirect_to_login(next: &str, login_url: &str) -> String {
    let (base, fragment) = match login_url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (login_url, None),
    };
    let (path, query) = base.split_once('?').unwrap_or((base, ""));

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(
        form_urlencoded::parse(query.as_bytes()).filter(|(key, _)| key != "next"),
    );
    serializer.append_pair("next", next);
    // `/` stays readable in every parameter
    let query = serializer.finish().replace("%2F", "/");

    let mut location = format!("{}?{}", path, query);
    if let Some(fragment) = fragment {
        location.push('#');
        location.push_str(fragment);
    }
    location
}

/// The `next` target for a login redirect from the request at `uri`.
///
/// A login page on the same origin (relative, or same scheme and host) gets the
/// request's path and query; a login page elsewhere gets the absolute request
/// URL so it can send the user back.
///
/// The request scheme comes from the URI or `X-Forwarded-Proto`. When neither
/// names one, only the hosts are compared.
pub fn next_target(uri: &Uri, headers: &HeaderMap, login_url: &str) -> String {
    let full_path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let Some(host) = request_host(uri, headers) else {
        return full_path;
    };
    let scheme = request_scheme(uri, headers);

    if same_origin(login_url, scheme.as_deref(), &host) {
        full_path
    } else {
        format!("{}://{}{}", scheme.as_deref().unwrap_or("http"), host, full_path)
    }
}

fn request_scheme(uri: &Uri, headers: &HeaderMap) -> Option<String> {
    if let Some(scheme) = uri.scheme_str() {
        return Some(scheme.to_ascii_lowercase());
    }
    headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

fn request_host(uri: &Uri, headers: &HeaderMap) -> Option<String> {
    if let Some(authority) = uri.authority() {
        return Some(authority.as_str().to_string());
    }
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

fn same_origin(login_url: &str, scheme: Option<&str>, host: &str) -> bool {
    // Relative login URLs never leave the current origin.
    let Ok(parsed) = Url::parse(login_url) else {
        return true;
    };
    if scheme.is_some_and(|scheme| parsed.scheme() != scheme) {
        return false;
    }
    match parsed.host_str() {
        None => true,
        Some(login_host) => {
            let login_netloc = match parsed.port() {
                Some(port) => format!("{}:{}", login_host, port),
                None => login_host.to_string(),
            };
            login_netloc.eq_ignore_ascii_case(host)
        }
    }
}
