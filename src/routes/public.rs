use std::sync::Arc;

use rocket::form::Form;
use rocket::response::content::RawHtml;
use rocket::response::status::NotFound;
use rocket::State;

use crate::filter::{ListingFilter, ViewMode};
use crate::render::pages;
use crate::repository::ListingRepository;
use crate::store::Store;

/// How many listings the home page highlights.
const FEATURED_COUNT: usize = 3;

/// Public pages install the sample listings on first visit.
fn seeded_listings(store: &Arc<dyn Store>) -> ListingRepository {
    let mut repo = super::load_listings(store);
    repo.seed_if_empty();
    repo
}

// ── Home ───────────────────────────────────────────────

#[get("/")]
pub fn home(store: &State<Arc<dyn Store>>) -> RawHtml<String> {
    let repo = seeded_listings(store);
    let settings = store.setting_all();
    RawHtml(pages::home_page(&settings, &repo.featured(FEATURED_COUNT)))
}

// ── Listing ────────────────────────────────────────────

#[get("/imoveis?<view>&<filter..>")]
pub fn listings(
    store: &State<Arc<dyn Store>>,
    view: Option<String>,
    filter: ListingFilter,
) -> RawHtml<String> {
    let repo = seeded_listings(store);
    let settings = store.setting_all();
    let results = filter.apply(repo.get_all());
    let view = ViewMode::parse(view.as_deref());
    RawHtml(pages::listings_page(&settings, &filter, view, &results))
}

// ── Detail ─────────────────────────────────────────────

#[get("/imovel?<id>")]
pub fn detail(
    store: &State<Arc<dyn Store>>,
    id: Option<String>,
) -> Result<RawHtml<String>, NotFound<RawHtml<String>>> {
    let repo = seeded_listings(store);
    let settings = store.setting_all();

    let listing = id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .and_then(|id| repo.get_by_id(id));

    match listing {
        Some(listing) => Ok(RawHtml(pages::detail_page(&settings, listing))),
        None => Err(NotFound(RawHtml(pages::not_found_page(&settings)))),
    }
}

// ── Anuncie ────────────────────────────────────────────

#[derive(Debug, FromForm)]
pub struct AnuncioForm {
    pub nome: String,
    pub email: String,
    pub telefone: Option<String>,
    pub tipo: Option<String>,
    pub mensagem: Option<String>,
}

#[get("/anuncie")]
pub fn advertise(store: &State<Arc<dyn Store>>) -> RawHtml<String> {
    let settings = store.setting_all();
    RawHtml(pages::advertise_page(&settings, false))
}

/// Acknowledged only; submissions are not stored.
#[post("/anuncie", data = "<form>")]
pub fn advertise_submit(store: &State<Arc<dyn Store>>, form: Form<AnuncioForm>) -> RawHtml<String> {
    log::info!(
        "Advertise request received (tipo: {})",
        form.tipo.as_deref().unwrap_or("-")
    );
    let settings = store.setting_all();
    RawHtml(pages::advertise_page(&settings, true))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![home, listings, detail, advertise, advertise_submit]
}
