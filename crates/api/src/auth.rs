//! Actor identity asserted by the upstream gateway.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::{RestaurantId, UserId};
use domain::{Actor, Role};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const ASSIGNED_RESTAURANT_HEADER: &str = "x-assigned-restaurant";

/// The authenticated actor of a request.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Reads the actor from identity headers.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
    let user_id = header(headers, USER_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthenticated(format!("missing {USER_ID_HEADER} header")))?;
    let role: Role = header(headers, USER_ROLE_HEADER)
        .ok_or_else(|| ApiError::Unauthenticated(format!("missing {USER_ROLE_HEADER} header")))?
        .parse()
        .map_err(ApiError::Unauthenticated)?;

    Ok(Actor {
        user_id: UserId::new(user_id),
        role,
        assigned_restaurant: header(headers, ASSIGNED_RESTAURANT_HEADER).map(RestaurantId::new),
    })
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers).map(CurrentActor)
    }
}
