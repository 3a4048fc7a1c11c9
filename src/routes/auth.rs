use std::sync::Arc;
use std::time::Duration;

use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::request::{self, FromRequest, Request};
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::{self, AdminUser};
use crate::rate_limit::RateLimiter;
use crate::store::Store;
use crate::AdminSlug;

const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, FromForm)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Browser user agent, stored alongside the session row.
pub struct UserAgent(Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for UserAgent {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        request::Outcome::Success(UserAgent(
            req.headers().get_one("User-Agent").map(str::to_string),
        ))
    }
}

fn login_template(store: &dyn Store, slug: &AdminSlug, username: &str, error: Option<&str>) -> Template {
    let context = json!({
        "page_title": "Login",
        "admin_slug": slug.0,
        "site_name": store.setting_get_or("site_name", "Imobiliária Valor"),
        "username": username,
        "error": error,
    });
    Template::render("admin/login", &context)
}

#[get("/login")]
pub fn login_page(
    admin: Option<AdminUser>,
    store: &State<Arc<dyn Store>>,
    slug: &State<AdminSlug>,
) -> Result<Template, Redirect> {
    if admin.is_some() {
        return Err(Redirect::to(format!("/{}", slug.0)));
    }
    Ok(login_template(&***store, slug, "", None))
}

#[post("/login", data = "<form>")]
pub fn login_submit(
    form: Form<LoginForm>,
    store: &State<Arc<dyn Store>>,
    slug: &State<AdminSlug>,
    limiter: &State<Arc<RateLimiter>>,
    cookies: &CookieJar<'_>,
    user_agent: UserAgent,
) -> Result<Redirect, Template> {
    let store: &dyn Store = &***store;
    let rate_key = format!("login:{}", auth::hash_key(&form.username));
    let max_attempts = store.setting_get_i64("login_rate_limit").max(1) as u64;

    if !limiter.check_and_record(&rate_key, max_attempts, LOGIN_WINDOW) {
        log::warn!("Login rate limit reached");
        return Err(login_template(
            store,
            slug,
            &form.username,
            Some("Muitas tentativas de login. Tente novamente em 15 minutos."),
        ));
    }

    if !auth::check_credentials(store, &form.username, &form.password) {
        log::warn!("Failed login attempt");
        return Err(login_template(
            store,
            slug,
            &form.username,
            Some("Usuário ou senha inválidos."),
        ));
    }

    match auth::create_session(store, user_agent.0.as_deref()) {
        Ok(session_id) => {
            limiter.reset(&rate_key);
            auth::set_session_cookie(cookies, &session_id);
            log::info!("login: admin session started");
            Ok(Redirect::to(format!("/{}", slug.0)))
        }
        Err(e) => {
            log::error!("Session creation failed: {}", e);
            Err(login_template(
                store,
                slug,
                &form.username,
                Some("Não foi possível iniciar a sessão."),
            ))
        }
    }
}

#[get("/logout")]
pub fn logout(
    store: &State<Arc<dyn Store>>,
    slug: &State<AdminSlug>,
    cookies: &CookieJar<'_>,
) -> Redirect {
    if let Some(session_id) = auth::current_session(cookies) {
        if let Err(e) = auth::destroy_session(&***store, &session_id) {
            log::error!("Failed to delete session: {}", e);
        }
    }
    auth::clear_session_cookie(cookies);
    Redirect::to(format!("/{}/login", slug.0))
}

/// Catch-all for any /<admin_slug>/* route that failed the AdminUser guard.
#[get("/<_path..>", rank = 99)]
pub fn redirect_to_login(_path: std::path::PathBuf, slug: &State<AdminSlug>) -> Redirect {
    Redirect::to(format!("/{}/login", slug.0))
}

#[post("/<_path..>", rank = 99)]
pub fn redirect_post_to_login(_path: std::path::PathBuf, slug: &State<AdminSlug>) -> Redirect {
    Redirect::to(format!("/{}/login", slug.0))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        login_page,
        login_submit,
        logout,
        redirect_to_login,
        redirect_post_to_login
    ]
}
