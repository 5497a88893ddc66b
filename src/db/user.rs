use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

#[derive(Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

// The password hash is left out of debug output so it never reaches the logs.
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("is_active", &self.is_active)
            .field("is_superuser", &self.is_superuser)
            .finish_non_exhaustive()
    }
}

/// Fields needed to insert a user. Flags not listed here take their defaults.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub is_superuser: bool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    is_active: i32,
    is_superuser: i32,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            is_active: row.is_active != 0,
            is_superuser: row.is_superuser != 0,
        }
    }
}

/// Error returned by [`UserStore::create`].
#[derive(Debug)]
pub enum CreateUserError {
    /// The username collides with an existing user.
    UsernameTaken,
    Database(sqlx::Error),
}

impl std::fmt::Display for CreateUserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateUserError::UsernameTaken => write!(f, "Username is already taken"),
            CreateUserError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for CreateUserError {}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new active user. Returns the user ID.
    ///
    /// The unique index on `username` is the authoritative duplicate check: a
    /// concurrent insert of the same name loses with `UsernameTaken`.
    pub async fn create(&self, user: &NewUser<'_>) -> Result<i64, CreateUserError> {
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, is_active, is_superuser) VALUES (?, ?, 1, ?)",
        )
        .bind(user.username)
        .bind(user.password_hash)
        .bind(user.is_superuser)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                CreateUserError::UsernameTaken
            }
            e => CreateUserError::Database(e),
        })?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by username (exact, case-sensitive match).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, is_active, is_superuser FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, is_active, is_superuser FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Delete a user by ID. Their categories and expenses go with them.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
