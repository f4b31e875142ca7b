use axum::{
    Json,
    http::header,
    response::{IntoResponse, Redirect},
};
use serde_json::json;

/// GET /dashboard/manifest.json
pub async fn manifest_handler() -> impl IntoResponse {
    let manifest = json!({
        "name": "Piscinas App",
        "short_name": "Piscinas",
        "start_url": "/dashboard/",
        "scope": "/dashboard/",
        "display": "standalone",
        "background_color": "#ffffff",
        "theme_color": "#0d6efd",
        "icons": [
            { "src": "/static/icons/icon-192.png", "sizes": "192x192", "type": "image/png" },
            { "src": "/static/icons/icon-512.png", "sizes": "512x512", "type": "image/png" }
        ]
    });
    ([(header::CACHE_CONTROL, "no-store")], Json(manifest))
}

/// GET /healthz
pub async fn healthz_handler() -> &'static str {
    "ok"
}

/// GET /
pub async fn root_handler() -> Redirect {
    Redirect::to("/dashboard/")
}
