//! Bearer-token authentication extractor backed by `AppState::token_verifier`.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use lexi_domain::error::Error;
use lexi_domain::value_objects::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller, extracted from the `Authorization: Bearer`
/// header. Route handlers that need ownership checks take this as a
/// parameter.
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::authentication("missing Authorization header"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| Error::authentication("Authorization header is not a bearer token"))?;
        let user_id = app_state.token_verifier.verify(token).await?;
        Ok(Self(user_id))
    }
}
