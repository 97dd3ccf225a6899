//! Caller identity
//!
//! Authentication happens in the fronting gateway, which forwards the
//! authenticated user in request headers. Requests without them are
//! rejected with 401.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;
use crate::playback::User;

pub const USER_ID_HEADER: &str = "x-cfm-user-id";
pub const USER_NAME_HEADER: &str = "x-cfm-user-name";
pub const ROLES_HEADER: &str = "x-cfm-roles";

/// Role allowing cross-user listings
pub const ADMIN_ROLE: &str = "admin";

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Authenticated caller holding the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

fn header<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, ApiError> {
    parts
        .headers
        .get(name)
        .map(|v| {
            v.to_str()
                .map_err(|_| ApiError::Unauthorized(format!("{} is not valid text", name)))
        })
        .transpose()
}

pub(crate) fn user_from_parts(parts: &Parts) -> Result<User, ApiError> {
    let id = header(parts, USER_ID_HEADER)?
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))?;
    let id = Uuid::parse_str(id.trim())
        .map_err(|_| ApiError::Unauthorized(format!("{} is not a UUID", USER_ID_HEADER)))?;

    let name = header(parts, USER_NAME_HEADER)?.unwrap_or_default().trim();
    let admin = header(parts, ROLES_HEADER)?
        .map(|roles| roles.split(',').any(|r| r.trim().eq_ignore_ascii_case(ADMIN_ROLE)))
        .unwrap_or(false);

    Ok(User::new(id, name).with_admin(admin))
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_parts(parts).map(CurrentUser)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = user_from_parts(parts)?;
        if !user.admin {
            return Err(ApiError::Forbidden(format!(
                "{} role required",
                ADMIN_ROLE
            )));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_user_from_headers() {
        let id = Uuid::new_v4();
        let p = parts(&[
            (USER_ID_HEADER, &id.to_string()),
            (USER_NAME_HEADER, "alice"),
            (ROLES_HEADER, "user, Admin"),
        ]);
        let user = user_from_parts(&p).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.name, "alice");
        assert!(user.admin);
    }

    #[test]
    fn test_missing_or_bad_id_rejected() {
        assert!(matches!(
            user_from_parts(&parts(&[])),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            user_from_parts(&parts(&[(USER_ID_HEADER, "not-a-uuid")])),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_no_roles_means_not_admin() {
        let id = Uuid::new_v4().to_string();
        let user = user_from_parts(&parts(&[(USER_ID_HEADER, &id)])).unwrap();
        assert!(!user.admin);
        assert_eq!(user.name, "");
    }
}
