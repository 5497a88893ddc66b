//! Spending categories. Every query is scoped to the owning user.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct CategoryStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

/// A category together with the sum of its expenses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryTotal {
    pub id: i64,
    pub name: String,
    pub total: f64,
}

impl CategoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a category for a user. Returns `None` if the user already has one
    /// with this name.
    pub async fn create(&self, user_id: i64, name: &str) -> Result<Option<i64>, sqlx::Error> {
        let result = sqlx::query("INSERT INTO categories (user_id, name) VALUES (?, ?)")
            .bind(user_id)
            .bind(name)
            .execute(&self.pool)
            .await;

        match result {
            Ok(result) => Ok(Some(result.last_insert_rowid())),
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// List a user's categories in creation order.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as("SELECT id, user_id, name FROM categories WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    /// Get a category if it exists and belongs to the user.
    pub async fn get_owned(&self, id: i64, user_id: i64) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as("SELECT id, user_id, name FROM categories WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Check whether the user already has a category with this name.
    pub async fn name_exists(&self, user_id: i64, name: &str) -> Result<bool, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM categories WHERE user_id = ? AND name = ?")
                .bind(user_id)
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0 > 0)
    }

    /// Rename an owned category. Returns `false` if the name is already taken.
    pub async fn rename(&self, id: i64, user_id: i64, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE categories SET name = ? WHERE id = ? AND user_id = ?")
            .bind(name)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(result) => Ok(result.rows_affected() > 0),
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete an owned category and its expenses.
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Per-category expense totals for a user (categories without expenses total 0).
    pub async fn totals_by_user(&self, user_id: i64) -> Result<Vec<CategoryTotal>, sqlx::Error> {
        sqlx::query_as(
            "SELECT c.id AS id, c.name AS name, CAST(COALESCE(SUM(e.amount), 0) AS REAL) AS total
             FROM categories c
             LEFT JOIN expenses e ON e.category_id = c.id
             WHERE c.user_id = ?
             GROUP BY c.id, c.name
             ORDER BY c.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}
