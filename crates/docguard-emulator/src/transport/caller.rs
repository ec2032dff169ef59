//! Auth context resolution from request headers.
//!
//! - `authorization: Bearer <owner_token>` selects the bypass context, and only
//!   when an owner token is configured
//! - `x-caller-id` (+ optional `x-caller-email`) selects a signed-in caller
//! - nothing selects the unauthenticated caller

use axum::http::HeaderMap;

use docguard_core::error::{DocGuardError, Result};
use docguard_core::{AuthContext, BypassContext, Caller};

pub const CALLER_ID_HEADER: &str = "x-caller-id";
pub const CALLER_EMAIL_HEADER: &str = "x-caller-email";

pub fn resolve_context(owner_token: Option<&str>, headers: &HeaderMap) -> Result<AuthContext> {
    if let Some(token) = bearer(headers)? {
        return match owner_token {
            Some(owner) if owner == token => {
                Ok(AuthContext::Bypass(BypassContext::fixture_setup()))
            }
            _ => Err(DocGuardError::MalformedRequest("unrecognized bearer token".into())),
        };
    }

    let Some(id) = header_str(headers, CALLER_ID_HEADER)? else {
        return Ok(AuthContext::Request(Caller::Unauthenticated));
    };
    if id.is_empty() {
        return Err(DocGuardError::MalformedRequest(format!(
            "{CALLER_ID_HEADER} must not be empty"
        )));
    }
    let email = header_str(headers, CALLER_EMAIL_HEADER)?.unwrap_or_default();
    Ok(AuthContext::Request(Caller::user(id, email)))
}

fn bearer(headers: &HeaderMap) -> Result<Option<&str>> {
    let Some(v) = header_str(headers, axum::http::header::AUTHORIZATION.as_str())? else {
        return Ok(None);
    };
    v.strip_prefix("Bearer ")
        .map(|t| Some(t.trim()))
        .ok_or_else(|| {
            DocGuardError::MalformedRequest("authorization must be a bearer token".into())
        })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>> {
    headers
        .get(name)
        .map(|v| {
            v.to_str()
                .map_err(|_| DocGuardError::MalformedRequest(format!("{name} is not valid ascii")))
        })
        .transpose()
}
