//! Locating the candidate token in an inbound request.
//!
//! Precedence: an `Authorization` header with the `bearer` scheme (any case)
//! wins; otherwise the session cookie is used. API clients send the header,
//! browsers carry the cookie, and both go through the same resolver.

use axum::http::{HeaderMap, header};

use super::cookie::{ACCESS_COOKIE_NAME, get_cookie};

/// Where a candidate token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Header,
    Cookie,
}

/// An unverified token taken from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateToken<'a> {
    pub token: &'a str,
    pub source: TokenSource,
}

/// Extract the parameter of an `Authorization: Bearer <token>` header.
///
/// Returns `None` when the header is missing, not valid ASCII, uses another
/// scheme, or carries an empty parameter.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, param) = value.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let param = param.trim();
    (!param.is_empty()).then_some(param)
}

/// Pick the token to verify, header first, then cookie.
pub fn candidate_token(headers: &HeaderMap) -> Option<CandidateToken<'_>> {
    if let Some(token) = bearer_token(headers) {
        return Some(CandidateToken {
            token,
            source: TokenSource::Header,
        });
    }

    get_cookie(headers, ACCESS_COOKIE_NAME)
        .filter(|token| !token.is_empty())
        .map(|token| CandidateToken {
            token,
            source: TokenSource::Cookie,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(name.clone(), HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_bearer_header() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(
            candidate_token(&h),
            Some(CandidateToken {
                token: "abc.def.ghi",
                source: TokenSource::Header
            })
        );
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        for value in ["bearer tok", "BEARER tok", "bEaReR tok"] {
            let h = headers(&[(header::AUTHORIZATION, value)]);
            assert_eq!(bearer_token(&h), Some("tok"), "{}", value);
        }
    }

    #[test]
    fn test_cookie_fallback() {
        let h = headers(&[(header::COOKIE, "access_token_cookie=from-cookie")]);
        assert_eq!(
            candidate_token(&h),
            Some(CandidateToken {
                token: "from-cookie",
                source: TokenSource::Cookie
            })
        );
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let h = headers(&[
            (header::COOKIE, "access_token_cookie=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        let candidate = candidate_token(&h).unwrap();
        assert_eq!(candidate.token, "from-header");
        assert_eq!(candidate.source, TokenSource::Header);
    }

    #[test]
    fn test_other_scheme_falls_back_to_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Basic dXNlcjpwYXNz"),
            (header::COOKIE, "access_token_cookie=from-cookie"),
        ]);
        assert_eq!(candidate_token(&h).unwrap().source, TokenSource::Cookie);
    }

    #[test]
    fn test_empty_bearer_falls_back_to_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer "),
            (header::COOKIE, "access_token_cookie=from-cookie"),
        ]);
        assert_eq!(candidate_token(&h).unwrap().token, "from-cookie");
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(candidate_token(&HeaderMap::new()), None);

        let h = headers(&[
            (header::AUTHORIZATION, "Bearer"),
            (header::COOKIE, "access_token_cookie="),
        ]);
        assert_eq!(candidate_token(&h), None);
    }
}
