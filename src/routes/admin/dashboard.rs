use std::sync::Arc;

use rocket::State;
use rocket_dyn_templates::Template;
use serde::Serialize;
use serde_json::json;

use crate::auth::AdminUser;
use crate::models::listing::Listing;
use crate::render::format_currency;
use crate::sanitize::Sanitize;
use crate::store::Store;
use crate::AdminSlug;

/// One card on the dashboard grid.
#[derive(Debug, Serialize)]
pub struct DashboardCard {
    pub id: i64,
    pub titulo: String,
    pub imagem: String,
    /// `localizacao - R$ ...`; the amount ignores any rent suffix.
    pub resumo: String,
}

impl DashboardCard {
    pub fn from_listing(listing: &Listing) -> Self {
        let safe = listing.sanitized();
        DashboardCard {
            id: safe.id,
            resumo: format!("{} - {}", listing.localizacao, format_currency(safe.preco.amount())),
            imagem: safe.image_or_placeholder().to_string(),
            titulo: listing.titulo.clone(),
        }
    }
}

// ── Dashboard ──────────────────────────────────────────

#[get("/")]
pub fn dashboard(_admin: AdminUser, store: &State<Arc<dyn Store>>, slug: &State<AdminSlug>) -> Template {
    let repo = crate::routes::load_listings(store);
    let cards: Vec<DashboardCard> = repo.get_all().iter().map(DashboardCard::from_listing).collect();

    let context = json!({
        "page_title": "Painel",
        "admin_slug": slug.0,
        "cards": cards,
        "total": cards.len(),
        "settings": store.setting_all(),
    });

    Template::render("admin/dashboard", &context)
}
