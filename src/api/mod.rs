mod auth;
mod categories;
mod dashboard;
mod error;
mod expenses;
mod extract;

use axum::Router;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::rate_limit::RateLimitConfig;

pub use error::{ApiError, ResultExt};
pub use extract::{ApiForm, ApiJson, ApiPath};

/// Create the API router.
pub fn create_api_router(
    auth: AuthService,
    rate_limit: Option<Arc<RateLimitConfig>>,
) -> Router {
    let auth_state = auth::AuthState {
        auth: auth.clone(),
        rate_limit,
    };

    let categories_state = categories::CategoriesState { auth: auth.clone() };
    let expenses_state = expenses::ExpensesState { auth: auth.clone() };
    let dashboard_state = dashboard::DashboardState { auth };

    Router::new()
        .merge(auth::router(auth_state))
        .merge(categories::router(categories_state))
        .merge(expenses::router(expenses_state))
        .merge(dashboard::router(dashboard_state))
}
