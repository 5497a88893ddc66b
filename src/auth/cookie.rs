//! Cookie parsing and session cookie construction.

use axum::http::header;

/// Cookie name holding the access token for browser sessions.
pub const ACCESS_COOKIE_NAME: &str = "access_token_cookie";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// `Set-Cookie` value storing the access token. Lax so the cookie survives the
/// redirect that follows a form login.
pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        ACCESS_COOKIE_NAME, token, max_age_secs, secure
    )
}

/// `Set-Cookie` value that removes the access token cookie from the client.
pub fn clear_session_cookie(secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{}",
        ACCESS_COOKIE_NAME, secure
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_get_cookie_simple() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("access_token_cookie=abc123"),
        );

        assert_eq!(get_cookie(&headers, ACCESS_COOKIE_NAME), Some("abc123"));
    }

    #[test]
    fn test_get_cookie_multiple() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; access_token_cookie=abc123; theme=dark"),
        );

        assert_eq!(get_cookie(&headers, ACCESS_COOKIE_NAME), Some("abc123"));
        assert_eq!(get_cookie(&headers, "theme"), Some("dark"));
        assert_eq!(get_cookie(&headers, "foo"), Some("bar"));
    }

    #[test]
    fn test_get_cookie_not_found() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("foo=bar"));

        assert_eq!(get_cookie(&headers, ACCESS_COOKIE_NAME), None);
    }

    #[test]
    fn test_get_cookie_no_header() {
        let headers = axum::http::HeaderMap::new();
        assert_eq!(get_cookie(&headers, ACCESS_COOKIE_NAME), None);
    }

    #[test]
    fn test_get_cookie_with_spaces() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("  access_token_cookie = abc123  ; foo=bar"),
        );

        assert_eq!(get_cookie(&headers, ACCESS_COOKIE_NAME), Some("abc123"));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", 86400, false);
        assert_eq!(
            cookie,
            "access_token_cookie=tok; HttpOnly; SameSite=Lax; Path=/; Max-Age=86400"
        );

        assert!(session_cookie("tok", 60, true).ends_with("; Secure"));
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }
}
