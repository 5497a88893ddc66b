//! Expense endpoints.
//!
//! Foreign categories and expenses are reported exactly like missing ones.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{ApiError, ResultExt, validate_amount};
use super::extract::{ApiJson, ApiPath};
use crate::auth::{AuthService, CurrentUser};
use crate::db::{Category, Expense, User};
use crate::impl_has_auth_backend;

const CATEGORY_NOT_FOUND: &str = "Category not found or unauthorized.";
const EXPENSE_NOT_FOUND: &str = "Expense not found or unauthorized.";

#[derive(Clone)]
pub struct ExpensesState {
    pub auth: AuthService,
}

impl_has_auth_backend!(ExpensesState);

pub fn router(state: ExpensesState) -> Router {
    Router::new()
        .route("/expenses/", post(create_expense))
        .route("/expenses", post(create_expense))
        .route("/expenses/sum_all", get(sum_all))
        .route("/expenses/sum/category/{id}", get(sum_category))
        // GET takes a category id; PUT and DELETE take an expense id
        .route(
            "/expenses/{id}",
            get(list_expenses).put(update_expense).delete(delete_expense),
        )
        .with_state(state)
}

#[derive(Deserialize)]
struct CreateExpenseRequest {
    category_id: i64,
    added_expense_amount: f64,
    expense_description: Option<String>,
}

#[derive(Deserialize)]
struct UpdateExpenseRequest {
    added_expense_amount: f64,
    expense_description: Option<String>,
}

#[derive(Serialize)]
struct ExpenseResponse {
    expense_id: i64,
    category_id: i64,
    added_expense_amount: f64,
    expense_description: Option<String>,
    timestamp: String,
}

impl From<Expense> for ExpenseResponse {
    fn from(e: Expense) -> Self {
        Self {
            expense_id: e.id,
            category_id: e.category_id,
            added_expense_amount: e.amount,
            expense_description: e.description,
            timestamp: e.created_at,
        }
    }
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct SumAllResponse {
    total_expenses_all: f64,
}

#[derive(Serialize)]
struct SumCategoryResponse {
    total_expenses: f64,
}

/// Load a category owned by the user, or 404.
async fn owned_category(
    state: &ExpensesState,
    user: &User,
    category_id: i64,
) -> Result<Category, ApiError> {
    state
        .auth
        .db()
        .categories()
        .get_owned(category_id, user.id)
        .await
        .db_err("Failed to get category")?
        .ok_or_else(|| {
            warn!(user_id = user.id, category_id, "Category not found or not owned");
            ApiError::not_found(CATEGORY_NOT_FOUND)
        })
}

async fn create_expense(
    State(state): State<ExpensesState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<CreateExpenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let amount = validate_amount(payload.added_expense_amount)?;
    let category = owned_category(&state, &user, payload.category_id).await?;

    let expense = state
        .auth
        .db()
        .expenses()
        .create(category.id, amount, payload.expense_description.as_deref())
        .await
        .db_err("Failed to create expense")?;

    info!(
        user_id = user.id,
        category_id = category.id,
        expense_id = expense.id,
        "Expense created"
    );

    Ok((StatusCode::CREATED, Json(ExpenseResponse::from(expense))))
}

async fn update_expense(
    State(state): State<ExpensesState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateExpenseRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let amount = validate_amount(payload.added_expense_amount)?;

    let updated = state
        .auth
        .db()
        .expenses()
        .update_owned(id, user.id, amount, payload.expense_description.as_deref())
        .await
        .db_err("Failed to update expense")?;

    if !updated {
        warn!(user_id = user.id, expense_id = id, "Update of unknown expense");
        return Err(ApiError::not_found(EXPENSE_NOT_FOUND));
    }

    Ok(Json(MessageResponse {
        message: "Expense updated successfully.",
    }))
}

async fn list_expenses(
    State(state): State<ExpensesState>,
    CurrentUser(user): CurrentUser,
    ApiPath(category_id): ApiPath<i64>,
) -> Result<Json<Vec<ExpenseResponse>>, ApiError> {
    let category = owned_category(&state, &user, category_id).await?;

    let expenses = state
        .auth
        .db()
        .expenses()
        .list_by_category(category.id)
        .await
        .db_err("Failed to list expenses")?;

    Ok(Json(expenses.into_iter().map(ExpenseResponse::from).collect()))
}

async fn delete_expense(
    State(state): State<ExpensesState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .auth
        .db()
        .expenses()
        .delete_owned(id, user.id)
        .await
        .db_err("Failed to delete expense")?;

    if !deleted {
        warn!(user_id = user.id, expense_id = id, "Delete of unknown expense");
        return Err(ApiError::not_found(EXPENSE_NOT_FOUND));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn sum_all(
    State(state): State<ExpensesState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SumAllResponse>, ApiError> {
    let total = state
        .auth
        .db()
        .expenses()
        .sum_by_user(user.id)
        .await
        .db_err("Failed to sum expenses")?;

    Ok(Json(SumAllResponse {
        total_expenses_all: total,
    }))
}

async fn sum_category(
    State(state): State<ExpensesState>,
    CurrentUser(user): CurrentUser,
    ApiPath(category_id): ApiPath<i64>,
) -> Result<Json<SumCategoryResponse>, ApiError> {
    let category = owned_category(&state, &user, category_id).await?;

    let total = state
        .auth
        .db()
        .expenses()
        .sum_by_category(category.id)
        .await
        .db_err("Failed to sum expenses")?;

    Ok(Json(SumCategoryResponse {
        total_expenses: total,
    }))
}
