//! Authentication endpoint paths and their wire formats.

use serde::Deserialize;

use crate::error::{Error, InvalidInputError};
use crate::tokens::{AccessToken, RefreshToken};
use crate::types::{ApiResponse, UserIdentity};

// ============================================================================
// Endpoint Paths
// ============================================================================

/// Administrator login. Unauthenticated.
pub const LOGIN: &str = "/auth/admin/login";

/// Server-side logout. Authenticated with the access token.
pub const LOGOUT: &str = "/auth/logout";

/// Access-token refresh. Authenticated with the refresh token.
pub const REFRESH_TOKEN: &str = "/auth/refresh-token";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Payload of a successful login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub user: Option<UserIdentity>,
    pub access_token: String,
    pub refresh_token: String,
}

/// Payload of a successful refresh. The refresh token is not rotated.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Tokens and identity extracted from a login response.
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub user: Option<UserIdentity>,
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

impl LoginResponse {
    /// Decode `{"data": {"user", "accessToken", "refreshToken"}}`.
    pub fn parse(response: &ApiResponse) -> Result<LoginOutput, Error> {
        let envelope: Envelope<LoginResponse> = decode(response, "login")?;
        let data = envelope.data;
        if data.access_token.is_empty() || data.refresh_token.is_empty() {
            return Err(InvalidInputError::Payload {
                message: "login response carried an empty token".to_string(),
            }
            .into());
        }
        Ok(LoginOutput {
            user: data.user,
            access_token: AccessToken::new(data.access_token),
            refresh_token: RefreshToken::new(data.refresh_token),
        })
    }
}

impl RefreshResponse {
    /// Decode `{"data": {"access_token"}}`.
    pub fn parse(response: &ApiResponse) -> Result<AccessToken, Error> {
        let envelope: Envelope<RefreshResponse> = decode(response, "refresh")?;
        if envelope.data.access_token.is_empty() {
            return Err(InvalidInputError::Payload {
                message: "refresh response carried an empty token".to_string(),
            }
            .into());
        }
        Ok(AccessToken::new(envelope.data.access_token))
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    response: &ApiResponse,
    what: &str,
) -> Result<T, Error> {
    serde_json::from_value(response.body.clone()).map_err(|e| {
        InvalidInputError::Payload {
            message: format!("{} response: {}", what, e),
        }
        .into()
    })
}
