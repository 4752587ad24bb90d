use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, StatusCode},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const USER_TOKEN_HEADER: &str = "X-User-Token";

/// 签发并校验宿主商城下发的 `{user_id}.{hex hmac}` Token
#[derive(Clone)]
pub struct UserTokens {
    secret: Vec<u8>,
}

impl UserTokens {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self, user_id: &str) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(user_id.as_bytes());
        Some(mac)
    }

    pub fn sign(&self, user_id: i64) -> String {
        let id = user_id.to_string();
        let sig = self
            .mac(&id)
            .map(|m| hex::encode(m.finalize().into_bytes()))
            .unwrap_or_default();
        format!("{}.{}", id, sig)
    }

    pub fn verify(&self, token: &str) -> Option<i64> {
        let (id, sig) = token.split_once('.')?;
        let user_id: i64 = id.parse().ok().filter(|v: &i64| *v > 0)?;
        let sig = hex::decode(sig).ok()?;
        self.mac(id)?.verify_slice(&sig).ok()?;
        Some(user_id)
    }
}

/// 当前调用者的 user id，匿名请求为 `None`
pub struct CurrentUser(pub Option<i64>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(USER_TOKEN_HEADER) else {
            return Ok(CurrentUser(None));
        };
        let app = AppState::from_ref(state);
        raw.to_str()
            .ok()
            .and_then(|t| app.tokens.verify(t.trim()))
            .map(|id| CurrentUser(Some(id)))
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid user token".to_string()))
    }
}

pub fn require_admin(headers: &HeaderMap, admin_token: &str) -> Result<(), (StatusCode, String)> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header".into(),
        ))?;
    if auth_header != format!("Bearer {}", admin_token) {
        return Err((StatusCode::FORBIDDEN, "Invalid Admin Token".into()));
    }
    Ok(())
}
