#[macro_use]
extern crate rocket;

use std::process;
use std::sync::Arc;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::response::content::RawHtml;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;

mod auth;
mod boot;
mod db;
mod filter;
mod models;
mod rate_limit;
mod render;
mod repository;
mod routes;
mod sanitize;
mod storage;
mod store;
mod tasks;


use rate_limit::RateLimiter;
use store::{SqliteStore, Store};

/// Holds the admin URL slug, read from the settings table at startup.
/// Shared via Rocket managed state so routes and fairings can access it.
pub struct AdminSlug(pub String);

pub struct NoCacheAdmin;

#[rocket::async_trait]
impl Fairing for NoCacheAdmin {
    fn info(&self) -> Info {
        Info { name: "No-Cache Admin Pages", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        let slug = req.rocket().state::<AdminSlug>()
            .map(|s| s.0.as_str())
            .unwrap_or("admin");
        let prefix = format!("/{}", slug);
        if req.uri().path().starts_with(&*prefix) {
            res.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
            res.set_header(Header::new("Pragma", "no-cache"));
        }
    }
}

#[catch(404)]
fn not_found() -> RawHtml<String> {
    RawHtml("<html lang='pt-BR'><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>404</h1><p>Página não encontrada.</p><a href='/'>← Início</a></body></html>".to_string())
}

#[catch(500)]
fn server_error() -> RawHtml<String> {
    RawHtml("<html lang='pt-BR'><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>500</h1><p>Erro interno do servidor.</p><a href='/'>← Início</a></body></html>".to_string())
}

/// Assemble the application around an already-migrated store.
pub fn build(store: Arc<dyn Store>) -> Rocket<Build> {
    let admin_slug = store.setting_get_or("admin_slug", "admin");
    let admin_mount = format!("/{}", admin_slug);
    let admin_api_mount = format!("/{}/api", admin_slug);

    log::info!("Admin panel mounted at: {}", admin_mount);

    rocket::build()
        .manage(store)
        .manage(AdminSlug(admin_slug))
        .manage(Arc::new(RateLimiter::new()))
        .attach(Template::fairing())
        .attach(NoCacheAdmin)
        .attach(tasks::BackgroundTasks)
        .mount("/static", FileServer::from("website/static"))
        .mount("/images", FileServer::from("website/static/images"))
        .mount("/", routes::public::routes())
        .mount(&admin_mount, routes::admin::routes())
        .mount(&admin_api_mount, routes::admin_api::routes())
        .mount(&admin_mount, routes::auth::routes())
        .register("/", catchers![not_found, server_error])
}

fn open_store() -> Result<Arc<dyn Store>, String> {
    let store = SqliteStore::new(db::init_pool()?);
    store.run_migrations()?;
    store.seed_defaults()?;
    Ok(Arc::new(store))
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    // Boot check: verify/create directories, validate critical files
    boot::run();

    let store = match open_store() {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            process::exit(1);
        }
    };

    build(store)
}
