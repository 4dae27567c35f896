//! OpenAPI documentation, served at `/api/openapi.json` and rendered at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sticker Toolkit API",
        version = "0.1.0",
        description = "Turns an uploaded image, short video, or audio clip into a WhatsApp-ready sticker: a 512x512 WebP (static or animated) or a trimmed MP3 preview."
    ),
    paths(
        handlers::sticker::create_whatsapp_sticker,
        handlers::health::health_check,
    ),
    components(schemas(error::ErrorResponse, handlers::health::HealthResponse)),
    tags(
        (name = "stickers", description = "Sticker conversion"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
