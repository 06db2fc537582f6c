//! Fashion advisor endpoint.

use axum::{
    Json,
    extract::{Multipart, State},
};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::advisor::{AdviceResponse, AdvisorService};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Image file part of the advice form.
struct ImageUpload {
    filename: String,
    content_type: Option<String>,
    bytes: axum::body::Bytes,
}

/// Handle an advice request.
///
/// Multipart fields: `query` (text) and `image` (file). Both are optional.
/// The route is mounted without a body size limit.
/// Model failures still produce a 200 with the fallback reply.
pub async fn fashion_advisor(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    mut multipart: Multipart,
) -> Result<Json<AdviceResponse>> {
    let mut query = String::new();
    let mut image: Option<ImageUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "query" => {
                query = field.text().await?;
            }
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if !filename.is_empty() && !bytes.is_empty() {
                    image = Some(ImageUpload {
                        filename,
                        content_type,
                        bytes,
                    });
                }
            }
            _ => {}
        }
    }

    let user = AuthService::new(state.pool()).get_user(current.id).await?;

    let stored = match image {
        Some(upload) => Some(
            state
                .uploads()
                .save(
                    &upload.filename,
                    upload.content_type.as_deref(),
                    &upload.bytes,
                )
                .await?,
        ),
        None => None,
    };

    add_breadcrumb(
        "advisor",
        "Requested advice",
        Some(&[("has_image", if stored.is_some() { "true" } else { "false" })]),
    );

    let advice = AdvisorService::new(state.generator())
        .advise(&user.profile, &query, stored.as_ref())
        .await;

    Ok(Json(advice))
}
