//! User repository for database operations.
//!
//! Queries are built at runtime with `sqlx::query_as` and mapped through
//! row types, then converted into validated domain types.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use fashion_advisor_core::{BodyProfile, Email, UserId};

use super::RepositoryError;
use crate::models::user::User;

const USER_COLUMNS: &str =
    "id, name, email, height, weight, skin_color, body_shape, gender, age, created_at";

/// Raw `users` row.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    height: i64,
    weight: i64,
    skin_color: String,
    body_shape: String,
    gender: String,
    age: i64,
    created_at: DateTime<Utc>,
}

/// `users` row joined with its password hash.
#[derive(Debug, sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: r.id,
            email,
            profile: BodyProfile {
                name: r.name,
                gender: r.gender,
                age: narrow("age", r.age)?,
                height_cm: narrow("height", r.height)?,
                weight_kg: narrow("weight", r.weight)?,
                skin_tone: r.skin_color,
                body_shape: r.body_shape,
            },
            created_at: r.created_at,
        })
    }
}

fn narrow(column: &str, value: i64) -> Result<u16, RepositoryError> {
    u16::try_from(value).map_err(|_| {
        RepositoryError::DataCorruption(format!("{column} out of range in database: {value}"))
    })
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Create a new user with a profile and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        profile: &BodyProfile,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO users
                (name, email, password_hash, height, weight, skin_color, body_shape, gender, age, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&profile.name)
        .bind(email.as_str())
        .bind(password_hash)
        .bind(i64::from(profile.height_cm))
        .bind(i64::from(profile.weight_kg))
        .bind(&profile.skin_tone)
        .bind(&profile.body_shape)
        .bind(&profile.gender)
        .bind(i64::from(profile.age))
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        User::try_from(row)
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let user = User::try_from(r.user)?;
        Ok(Some((user, r.password_hash)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, run_migrations};

    async fn pool() -> SqlitePool {
        let pool = create_memory_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn profile(name: &str) -> BodyProfile {
        BodyProfile {
            name: name.to_string(),
            gender: "male".to_string(),
            age: 31,
            height_cm: 178,
            weight_kg: 74,
            skin_tone: "dusky".to_string(),
            body_shape: "rectangle".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let pool = pool().await;
        let repo = UserRepository::new(&pool);
        let email = Email::parse("rahul@example.com").unwrap();

        let created = repo.create(&email, "hash", &profile("Rahul")).await.unwrap();
        assert_eq!(created.email, email);
        assert_eq!(created.profile, profile("Rahul"));

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, email);
        assert_eq!(by_id.profile.height_cm, 178);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let pool = pool().await;
        let repo = UserRepository::new(&pool);
        let email = Email::parse("dup@example.com").unwrap();

        repo.create(&email, "hash", &profile("First")).await.unwrap();
        let err = repo
            .create(&email, "hash", &profile("Second"))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_get_password_hash() {
        let pool = pool().await;
        let repo = UserRepository::new(&pool);
        let email = Email::parse("hash@example.com").unwrap();
        repo.create(&email, "$argon2id$stub", &profile("Hash"))
            .await
            .unwrap();

        let (user, hash) = repo.get_password_hash(&email).await.unwrap().unwrap();
        assert_eq!(user.profile.name, "Hash");
        assert_eq!(hash, "$argon2id$stub");

        let missing = Email::parse("missing@example.com").unwrap();
        assert!(repo.get_password_hash(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let pool = pool().await;
        sqlx::query(
            "INSERT INTO users (name, email, password_hash, height, weight, skin_color, body_shape, gender, age, created_at)
             VALUES ('Bad', 'bad@example.com', 'h', -5, 60, 'fair', 'pear', 'female', 30, ?)",
        )
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap();

        let repo = UserRepository::new(&pool);
        let email = Email::parse("bad@example.com").unwrap();
        let err = repo.get_password_hash(&email).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
