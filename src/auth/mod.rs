//! Bearer-token authentication.
//!
//! Access tokens are HS256 JWTs carrying the user id. API clients send them in
//! an `Authorization: Bearer` header; browser sessions carry the same token in
//! an HttpOnly cookie. Both paths share one resolver and one service.

mod cookie;
mod credentials;
mod errors;
mod extractors;
mod ip;
mod resolver;
mod service;
mod state;

pub use cookie::{ACCESS_COOKIE_NAME, clear_session_cookie, get_cookie, session_cookie};
pub use credentials::{CandidateToken, TokenSource, bearer_token, candidate_token};
pub use errors::{ApiAuthError, AuthErrorKind};
pub use extractors::CurrentUser;
pub use ip::extract_client_ip;
pub use resolver::resolve_principal;
pub use service::{AuthService, AuthServiceError, MAX_USERNAME_LEN};
pub use state::HasAuthBackend;
