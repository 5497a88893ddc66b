//! Expenses recorded against categories.
//!
//! Ownership is derived through the category, so every user-facing lookup joins
//! `categories` on `user_id`.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ExpenseStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Expense {
    pub id: i64,
    pub category_id: i64,
    pub amount: f64,
    pub description: Option<String>,
    pub created_at: String,
}

impl ExpenseStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record an expense. The caller must have checked category ownership.
    pub async fn create(
        &self,
        category_id: i64,
        amount: f64,
        description: Option<&str>,
    ) -> Result<Expense, sqlx::Error> {
        sqlx::query_as(
            "INSERT INTO expenses (category_id, amount, description) VALUES (?, ?, ?)
             RETURNING id, category_id, amount, description, created_at",
        )
        .bind(category_id)
        .bind(amount)
        .bind(description)
        .fetch_one(&self.pool)
        .await
    }

    /// List the expenses in a category, oldest first.
    pub async fn list_by_category(&self, category_id: i64) -> Result<Vec<Expense>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, category_id, amount, description, created_at
             FROM expenses WHERE category_id = ? ORDER BY id",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Update an expense if it belongs to the user.
    pub async fn update_owned(
        &self,
        id: i64,
        user_id: i64,
        amount: f64,
        description: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE expenses SET amount = ?, description = ?
             WHERE id = ? AND category_id IN (SELECT id FROM categories WHERE user_id = ?)",
        )
        .bind(amount)
        .bind(description)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an expense if it belongs to the user.
    pub async fn delete_owned(&self, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM expenses
             WHERE id = ? AND category_id IN (SELECT id FROM categories WHERE user_id = ?)",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Sum of all expenses in a category.
    pub async fn sum_by_category(&self, category_id: i64) -> Result<f64, sqlx::Error> {
        let total: (f64,) = sqlx::query_as(
            "SELECT CAST(COALESCE(SUM(amount), 0) AS REAL) FROM expenses WHERE category_id = ?",
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total.0)
    }

    /// Sum of all expenses across all of a user's categories.
    pub async fn sum_by_user(&self, user_id: i64) -> Result<f64, sqlx::Error> {
        let total: (f64,) = sqlx::query_as(
            "SELECT CAST(COALESCE(SUM(e.amount), 0) AS REAL)
             FROM expenses e JOIN categories c ON e.category_id = c.id
             WHERE c.user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total.0)
    }
}
