use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use diesel::prelude::*;

use crate::error::AppError;
use crate::models::User;
use crate::schema::users;

pub const USER_HEADER: &str = "X-User-Id";

/// The caller as reported by the authentication layer in front of the
/// service. A missing or unparsable header is an anonymous caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Identity(pub Option<i64>);

impl Identity {
    pub fn user_id(&self) -> Option<i64> {
        self.0
    }

    pub fn require(&self) -> Result<i64, AppError> {
        self.0.ok_or(AppError::Unauthorized)
    }
}

impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let id = req
            .headers()
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok());
        ready(Ok(Identity(id)))
    }
}

pub fn require_admin(conn: &mut PgConnection, identity: Identity) -> Result<User, AppError> {
    let user_id = identity.require()?;
    let user = users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or(AppError::Unauthorized)?;

    if !user.is_admin {
        log::warn!("user {} attempted an administrative action", user.id);
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    async fn identity_of(req: TestRequest) -> Identity {
        let (req, mut payload) = req.to_http_parts();
        Identity::from_request(&req, &mut payload).await.unwrap()
    }

    #[actix_web::test]
    async fn reads_numeric_header() {
        let id = identity_of(TestRequest::default().insert_header((USER_HEADER, "42"))).await;
        assert_eq!(id.user_id(), Some(42));
        assert_eq!(id.require().unwrap(), 42);
    }

    #[actix_web::test]
    async fn garbage_or_missing_header_is_anonymous() {
        let id = identity_of(TestRequest::default().insert_header((USER_HEADER, "admin"))).await;
        assert_eq!(id, Identity(None));
        assert!(matches!(id.require(), Err(AppError::Unauthorized)));
        assert_eq!(identity_of(TestRequest::default()).await, Identity(None));
    }
}
