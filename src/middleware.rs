use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{AppState, errors::AppError};

pub async fn auth_middleware(
    State(state): State<AppState>,
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(auth_header) = auth_header
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
    let claims = state.sessions.verify_access_token(auth_header.token())?;
    request.extensions_mut().insert(Arc::new(claims));

    let response = next.run(request).await;

    Ok(response)
}
