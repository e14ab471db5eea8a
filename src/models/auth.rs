//! Authenticated user claims carried by the session identity or a bearer token.

use actix_identity::IdentityExt;
use actix_web::{
    FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, http::header, web,
};
use chrono::{Duration, Utc};
use futures_util::future::{Ready, ready};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::types::{TypeConstraintError, UserId};
use crate::domain::user::User;
use crate::models::config::ServerConfig;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
/// JWT claims describing the signed-in user.
pub struct AuthenticatedUser {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    pub exp: usize,
}

impl AuthenticatedUser {
    pub fn new(user: &User, roles: Vec<String>, ttl: Duration) -> Self {
        let exp = (Utc::now() + ttl).timestamp().max(0) as usize;
        Self {
            sub: user.id.to_string(),
            email: user.email.as_str().to_string(),
            name: user.name.as_str().to_string(),
            roles,
            exp,
        }
    }

    /// Identifier of the user behind the claims.
    pub fn user_id(&self) -> Result<UserId, TypeConstraintError> {
        let id = self
            .sub
            .parse::<i32>()
            .map_err(|_| TypeConstraintError::InvalidValue(self.sub.clone()))?;
        UserId::new(id)
    }

    pub fn to_jwt(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    pub fn from_jwt(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

/// Bearer token from the `Authorization` header, if any.
fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(config) = req.app_data::<web::Data<ServerConfig>>() else {
            log::error!("ServerConfig is not registered as app data");
            return ready(Err(ErrorUnauthorized("Unauthenticated.")));
        };

        let token = match bearer_token(req) {
            Some(token) => token.to_string(),
            None => match req.get_identity().and_then(|identity| identity.id()) {
                Ok(token) => token,
                Err(_) => return ready(Err(ErrorUnauthorized("Unauthenticated."))),
            },
        };

        let result = AuthenticatedUser::from_jwt(&token, &config.secret).map_err(|err| {
            log::debug!("Rejected authentication token: {err}");
            ErrorUnauthorized("Unauthenticated.")
        });
        ready(result)
    }
}
