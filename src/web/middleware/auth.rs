use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use tracing::warn;

use crate::api::auth as auth_api;

/// Caller identity established once per request and handed to every view.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
    pub role: String,
    pub full_name: String,
    pub email: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// Organizers are role "user"; admins can do everything organizers can.
    pub fn is_organizer(&self) -> bool {
        self.role == "admin" || self.role == "user"
    }
}

/// Bearer token as read from the session cookie, for passing through to the
/// remote entity store.
#[derive(Clone, Debug)]
pub struct AccessToken(pub String);

#[derive(Deserialize)]
struct JwtClaims {
    sub: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    email: String,
}

pub async fn require_auth(mut request: Request, next: Next) -> Response {
    let Some(token) = extract_access_token(&request) else {
        return Redirect::to("/login").into_response();
    };

    if let Some(claims) = decode_claims(&token) {
        request.extensions_mut().insert(AuthenticatedUser {
            id: claims.sub,
            role: claims.role,
            full_name: claims.full_name,
            email: claims.email,
        });
        request.extensions_mut().insert(AccessToken(token));
        return next.run(request).await;
    }

    // Opaque token: ask the auth service who this is.
    match auth_api::me(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(AuthenticatedUser {
                id: user.id,
                role: user.role,
                full_name: user.full_name,
                email: user.email,
            });
            request.extensions_mut().insert(AccessToken(token));
            next.run(request).await
        }
        Err(e) => {
            warn!("auth check failed: {}", e);
            Redirect::to("/login").into_response()
        }
    }
}

fn extract_access_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split("; ")
                .find(|c| c.starts_with("access_token="))
                .and_then(|c| c.strip_prefix("access_token="))
        })
        .map(str::to_string)
}

// Parse the JWT payload (middle part) without remote round trips.
fn decode_claims(token: &str) -> Option<JwtClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
    serde_json::from_slice::<JwtClaims>(&payload_bytes)
        .ok()
        .filter(|c| !c.sub.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_for(payload: &str) -> String {
        format!(
            "h.{}.s",
            general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes())
        )
    }

    #[test]
    fn decodes_role_and_subject_from_payload() {
        let token = token_for(r#"{"sub":"U1","role":"admin","full_name":"Ana"}"#);
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, "U1");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.full_name, "Ana");
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(decode_claims("not-a-jwt").is_none());
        assert!(decode_claims(&token_for(r#"{"role":"admin"}"#)).is_none());
    }

    #[test]
    fn organizer_roles() {
        let admin = AuthenticatedUser {
            id: "1".into(),
            role: "admin".into(),
            full_name: String::new(),
            email: String::new(),
        };
        let organizer = AuthenticatedUser {
            id: "2".into(),
            role: "user".into(),
            full_name: String::new(),
            email: String::new(),
        };
        let participant = AuthenticatedUser {
            id: "3".into(),
            role: "guest".into(),
            full_name: String::new(),
            email: String::new(),
        };
        assert!(admin.is_admin() && admin.is_organizer());
        assert!(!organizer.is_admin() && organizer.is_organizer());
        assert!(!participant.is_organizer());
    }
}
