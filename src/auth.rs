use std::sync::Arc;

use chrono::{Duration, Utc};
use rocket::http::{Cookie, CookieJar, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use sha2::{Digest, Sha256};

use crate::store::Store;

const SESSION_COOKIE: &str = "valor_session";

/// Guard that ensures the request is from a logged-in admin
pub struct AdminUser;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let store = match request.guard::<&State<Arc<dyn Store>>>().await {
            Outcome::Success(s) => s,
            _ => return Outcome::Forward(Status::Unauthorized),
        };

        let cookies = request.cookies();
        let session_id = match cookies.get_private(SESSION_COOKIE) {
            Some(c) => c.value().to_string(),
            None => return Outcome::Forward(Status::Unauthorized),
        };

        if validate_session(&***store, &session_id) {
            Outcome::Success(AdminUser)
        } else {
            cookies.remove_private(Cookie::from(SESSION_COOKIE));
            Outcome::Forward(Status::Unauthorized)
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| e.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Single configured admin credential.
pub fn check_credentials(store: &dyn Store, username: &str, password: &str) -> bool {
    let expected_user = store.setting_get_or("admin_username", "admin");
    let hash = store.setting_get("admin_password_hash").unwrap_or_default();
    if hash.is_empty() || username != expected_user {
        return false;
    }
    verify_password(password, &hash)
}

pub fn create_session(store: &dyn Store, user_agent: Option<&str>) -> Result<String, String> {
    let expiry_hours = store.setting_get_i64("session_expiry_hours").max(1);
    let session_id = uuid::Uuid::new_v4().to_string();
    let expires = Utc::now().naive_utc() + Duration::hours(expiry_hours);
    store.session_create(&session_id, expires, user_agent)?;
    Ok(session_id)
}

pub fn validate_session(store: &dyn Store, session_id: &str) -> bool {
    store.session_is_valid(session_id, Utc::now().naive_utc())
}

pub fn destroy_session(store: &dyn Store, session_id: &str) -> Result<(), String> {
    store.session_delete(session_id)
}

/// Session id from the private cookie, if any.
pub fn current_session(cookies: &CookieJar<'_>) -> Option<String> {
    cookies
        .get_private(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

pub fn set_session_cookie(cookies: &CookieJar<'_>, session_id: &str) {
    let mut cookie = Cookie::new(SESSION_COOKIE, session_id.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(rocket::http::SameSite::Strict);
    cookie.set_path("/");
    cookies.add_private(cookie);
}

pub fn clear_session_cookie(cookies: &CookieJar<'_>) {
    cookies.remove_private(Cookie::from(SESSION_COOKIE));
}

/// Rate-limit bucket key; the raw value never lands in memory maps.
pub fn hash_key(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn cleanup_expired_sessions(store: &dyn Store) -> Result<usize, String> {
    store.session_cleanup_expired(Utc::now().naive_utc())
}
