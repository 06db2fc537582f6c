//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;

use crate::middleware::RequireAuth;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub name: String,
}

/// Display the advisor page for the logged-in user.
pub async fn home(RequireAuth(user): RequireAuth) -> IndexTemplate {
    IndexTemplate { name: user.name }
}
