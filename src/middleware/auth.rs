use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

fn unauthorized(reason: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": reason }))).into_response()
}

fn decode_bearer(req: &Request) -> Result<Claims, Response> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("missing_authorization"))?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| unauthorized("bad_authorization"))?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("unsupported_scheme"))?;

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| unauthorized("invalid_token"))
}

pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    match decode_bearer(&req) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(response) => response,
    }
}

/// Staff-only routes: admin and staff roles are accepted.
pub async fn require_staff(mut req: Request, next: Next) -> Response {
    match decode_bearer(&req) {
        Ok(claims) => {
            let role = claims.role.clone().unwrap_or_default();
            let allowed = ["admin", "staff"];
            if !allowed.iter().any(|r| r.eq_ignore_ascii_case(&role)) {
                return (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"}))).into_response();
            }
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(response) => response,
    }
}
