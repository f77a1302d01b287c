//! Request extractors: bearer authentication and validated JSON bodies.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use nairex_services::AuthedAccount;
use nairex_types::Error;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated principal, resolved from the `Bearer` token against
/// the metadata store. Handlers requiring authentication take this
/// extractor; everything else is public.
pub struct CurrentUser(pub AuthedAccount);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let token = header.strip_prefix("Bearer ").unwrap_or_default();
        if token.is_empty() {
            return Err(ApiError::from(Error::invalid_token()));
        }
        let account = state.accounts.resolve_token(token).await?;
        Ok(CurrentUser(account))
    }
}

/// JSON body extractor whose rejection speaks the error envelope.
pub struct ApiJson<T>(pub T);

impl<T> FromRequest<AppState> for ApiJson<T>
where
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(JsonRejection::MissingJsonContentType(_)) => {
                Err(ApiError::from(Error::validation("No request body")))
            }
            Err(rejection) => Err(ApiError::from(Error::validation(rejection.body_text()))),
        }
    }
}
