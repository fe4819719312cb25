//! OpenAPI document definition, served at /api/openapi.json.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Notatex API",
        description = "Note image upload and LaTeX transcription service"
    ),
    paths(
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,
        crate::handlers::auth::update_email,
        crate::handlers::auth::delete_account,
        crate::handlers::upload::upload_image,
        crate::handlers::upload::upload_batch,
        crate::handlers::images::list_images,
        crate::handlers::tex::images_to_latex,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::handlers::auth::RegisterRequest,
        crate::handlers::auth::RegisterResponse,
        crate::handlers::auth::LoginRequest,
        crate::handlers::auth::LoginResponse,
        crate::handlers::auth::MessageResponse,
        crate::handlers::auth::UpdateEmailRequest,
        crate::handlers::auth::UpdateEmailResponse,
        crate::handlers::upload::ImageUploadResponse,
        crate::handlers::upload::BatchUploadResponse,
        crate::handlers::images::ListImagesResponse,
        crate::handlers::tex::ImagesToLatexRequest,
        notatex_core::models::AccountInfo,
        notatex_core::models::ImageResponse,
    )),
    tags(
        (name = "auth", description = "Account registration and session management"),
        (name = "images", description = "Image upload and listing"),
        (name = "tex", description = "LaTeX document assembly")
    )
)]
pub struct ApiDoc;
