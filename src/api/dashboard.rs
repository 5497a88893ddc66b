//! Per-user spending overview.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::error::{ApiError, ResultExt};
use crate::auth::{AuthService, CurrentUser};
use crate::impl_has_auth_backend;

#[derive(Clone)]
pub struct DashboardState {
    pub auth: AuthService,
}

impl_has_auth_backend!(DashboardState);

pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .with_state(state)
}

#[derive(Serialize)]
struct DashboardUser {
    user_id: i64,
    username: String,
}

#[derive(Serialize)]
struct CategorySummary {
    category_id: i64,
    category_name: String,
    total_expenses: f64,
}

#[derive(Serialize)]
struct DashboardResponse {
    user: DashboardUser,
    categories: Vec<CategorySummary>,
    total_expenses_all: f64,
}

async fn dashboard(
    State(state): State<DashboardState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    let totals = state
        .auth
        .db()
        .categories()
        .totals_by_user(user.id)
        .await
        .db_err("Failed to load category totals")?;

    let total_expenses_all: f64 = totals.iter().map(|c| c.total).sum();

    Ok(Json(DashboardResponse {
        user: DashboardUser {
            user_id: user.id,
            username: user.username,
        },
        categories: totals
            .into_iter()
            .map(|c| CategorySummary {
                category_id: c.id,
                category_name: c.name,
                total_expenses: c.total,
            })
            .collect(),
        total_expenses_all,
    }))
}
