//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! fa-cli user create --name "Asha" --email asha@example.com --password 'long-secret' \
//!     --height 165 --weight 58 --skin-color wheatish --body-shape hourglass \
//!     --gender female --age 27
//! ```

use fashion_advisor_core::{BodyProfile, UserId};
use fashion_advisor_server::services::auth::AuthService;
use fashion_advisor_server::{config, db};

use super::CommandError;

/// Create a user through the same validation path as web registration.
///
/// Migrations are applied first so this works against a fresh database.
///
/// # Errors
///
/// Returns `CommandError::Auth` for an invalid email, short password, or
/// duplicate account, and `CommandError::Database` for connection failures.
pub async fn create(
    email: &str,
    password: &str,
    profile: &BodyProfile,
) -> Result<UserId, CommandError> {
    let database_url = config::database_url_from_env();
    let pool = db::create_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    tracing::info!("Creating user: {}", email);
    let user = AuthService::new(&pool)
        .register(email, password, profile)
        .await?;

    tracing::info!(user_id = %user.id, "User created");
    Ok(user.id)
}
