//! Response DTOs
//!
//! Data structures for API response bodies. Field casing follows the
//! wire contract exactly, including the camelCase `accessToken` on the
//! refresh-for-access exchange and the session list's `isCurrent`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::services::{AccessToken, RefreshToken};
use crate::domain::{Session, UserBio};

/// Bare `{success:true}` body
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Login response; `require_tfa` is always false (TFA is not offered)
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub require_tfa: bool,
    pub access_token: AccessToken,
}

/// Response for trading an access token for a refresh token
#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub success: bool,
    pub refresh_token: RefreshToken,
}

/// Response for trading a refresh token for an access token
#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub success: bool,
    #[serde(rename = "accessToken")]
    pub access_token: AccessToken,
}

/// Profile detail response
#[derive(Debug, Serialize)]
pub struct InfoDetailResponse {
    pub success: bool,
    pub id: String,
    pub fullname: String,
    pub location: String,
    pub bio: String,
    pub web: String,
    pub picture: String,
    pub created_at: DateTime<Utc>,
}

impl InfoDetailResponse {
    pub fn from_bio(user_id: String, bio: UserBio) -> Self {
        Self {
            success: true,
            id: user_id,
            fullname: bio.fullname,
            location: bio.location,
            bio: bio.bio,
            web: bio.web,
            picture: bio.picture,
            created_at: bio.created_at,
        }
    }
}

/// Current email response
#[derive(Debug, Serialize)]
pub struct CurrentEmailResponse {
    pub success: bool,
    pub email: String,
}

/// Session list response
#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    pub success: bool,
    pub sessions: Vec<UserSessionResponse>,
}

/// One entry in the session list
#[derive(Debug, Serialize)]
pub struct UserSessionResponse {
    #[serde(rename = "isCurrent")]
    pub is_current: bool,
    pub ip: String,
    pub client: ClientResponse,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Client descriptor inside a session entry
#[derive(Debug, Serialize)]
pub struct ClientResponse {
    pub id: String,
    pub name: String,
}

impl UserSessionResponse {
    pub fn from_session(session: Session, current_session_id: &str) -> Self {
        Self {
            is_current: session.id == current_session_id,
            ip: session.ip_address,
            client: ClientResponse {
                id: session.id,
                name: session.client_id,
            },
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}
