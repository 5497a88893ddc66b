use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{ApiError, ResultExt, validate_category_name};
use super::extract::{ApiJson, ApiPath};
use crate::auth::{AuthService, CurrentUser};
use crate::impl_has_auth_backend;

const CATEGORY_NOT_FOUND: &str = "Category not found or not authorized.";
const CATEGORY_EXISTS: &str = "Category with this name already exists.";

#[derive(Clone)]
pub struct CategoriesState {
    pub auth: AuthService,
}

impl_has_auth_backend!(CategoriesState);

pub fn router(state: CategoriesState) -> Router {
    Router::new()
        .route(
            "/categories/",
            get(list_categories).post(create_category),
        )
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            put(rename_category).delete(delete_category),
        )
        .with_state(state)
}

#[derive(Deserialize)]
struct CategoryRequest {
    category_name: String,
}

#[derive(Serialize)]
struct CreateCategoryResponse {
    message: String,
    id: i64,
}

#[derive(Serialize)]
struct CategoryResponse {
    category_id: i64,
    category_name: String,
}

async fn create_category(
    State(state): State<CategoriesState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_category_name(&payload.category_name)?;

    let id = state
        .auth
        .db()
        .categories()
        .create(user.id, name)
        .await
        .db_err("Failed to create category")?
        .ok_or_else(|| ApiError::bad_request(CATEGORY_EXISTS))?;

    info!(user_id = user.id, category_id = id, "Category created");

    Ok((
        StatusCode::CREATED,
        Json(CreateCategoryResponse {
            message: format!("Category '{}' created successfully", name),
            id,
        }),
    ))
}

async fn list_categories(
    State(state): State<CategoriesState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state
        .auth
        .db()
        .categories()
        .list_by_user(user.id)
        .await
        .db_err("Failed to list categories")?;

    if categories.is_empty() {
        return Err(ApiError::not_found("No categories found."));
    }

    Ok(Json(
        categories
            .into_iter()
            .map(|c| CategoryResponse {
                category_id: c.id,
                category_name: c.name,
            })
            .collect(),
    ))
}

async fn rename_category(
    State(state): State<CategoriesState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<CategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let name = validate_category_name(&payload.category_name)?;
    let categories = state.auth.db().categories();

    if categories
        .get_owned(id, user.id)
        .await
        .db_err("Failed to get category")?
        .is_none()
    {
        warn!(user_id = user.id, category_id = id, "Rename of unknown category");
        return Err(ApiError::not_found(CATEGORY_NOT_FOUND));
    }

    if categories
        .name_exists(user.id, name)
        .await
        .db_err("Failed to check category name")?
    {
        return Err(ApiError::bad_request(CATEGORY_EXISTS));
    }

    // A concurrent create may have claimed the name since the check
    if !categories
        .rename(id, user.id, name)
        .await
        .db_err("Failed to rename category")?
    {
        return Err(ApiError::bad_request(CATEGORY_EXISTS));
    }

    Ok(Json(CategoryResponse {
        category_id: id,
        category_name: name.to_string(),
    }))
}

async fn delete_category(
    State(state): State<CategoriesState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .auth
        .db()
        .categories()
        .delete(id, user.id)
        .await
        .db_err("Failed to delete category")?;

    if !deleted {
        warn!(user_id = user.id, category_id = id, "Delete of unknown category");
        return Err(ApiError::not_found(CATEGORY_NOT_FOUND));
    }

    info!(user_id = user.id, category_id = id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
