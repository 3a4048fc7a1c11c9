use std::sync::Arc;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::{json, Value};

use super::{admin_base, read_photos};
use crate::auth::AdminUser;
use crate::models::listing::{parse_count, Coords, Listing, ListingDraft};
use crate::sanitize::sanitize_image_ref;
use crate::store::Store;
use crate::AdminSlug;

const TIPOS: &[&str] = &["Apartamento", "Casa", "Comercial", "Terreno"];

// ── Form ───────────────────────────────────────────────

#[derive(FromForm)]
pub struct ListingFormData<'f> {
    /// Empty in create mode, the record id in edit mode.
    pub id: Option<String>,
    pub titulo: String,
    pub preco: String,
    pub localizacao: String,
    pub tipo: String,
    pub quartos: Option<String>,
    pub banheiros: Option<String>,
    pub vagas: Option<String>,
    pub area: Option<String>,
    pub descricao: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    /// Images already on the record, carried through the form as hidden fields.
    #[field(default = Vec::new())]
    pub imagens_existentes: Vec<String>,
    #[field(default = Vec::new())]
    pub fotos: Vec<TempFile<'f>>,
}

impl ListingFormData<'_> {
    /// Record id when editing; a blank or non-numeric id means create.
    pub fn edit_id(&self) -> Option<i64> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse().ok())
    }

    /// Newly selected photos replace the current set; otherwise the
    /// existing images are kept.
    pub fn to_draft(&self, uploaded: Vec<String>) -> ListingDraft {
        let imagens = if uploaded.is_empty() {
            self.imagens_existentes
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        } else {
            uploaded
        };

        let count = |v: &Option<String>| v.as_deref().map(parse_count).unwrap_or(0);

        ListingDraft {
            titulo: self.titulo.trim().to_string(),
            preco: self.preco.parse().unwrap_or_default(),
            localizacao: self.localizacao.trim().to_string(),
            tipo: self.tipo.trim().to_string(),
            quartos: count(&self.quartos),
            banheiros: count(&self.banheiros),
            vagas: count(&self.vagas),
            area: count(&self.area),
            imagens,
            descricao: self.descricao.clone().unwrap_or_default(),
            coords: parse_coords(self.lat.as_deref(), self.lon.as_deref()),
        }
    }
}

/// Both axes must parse; anything else leaves the stored position alone.
fn parse_coords(lat: Option<&str>, lon: Option<&str>) -> Option<Coords> {
    let parse = |v: Option<&str>| v.and_then(|s| s.trim().replace(',', ".").parse::<f64>().ok());
    match (parse(lat), parse(lon)) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some(Coords { lat, lon }),
        _ => None,
    }
}

/// Template context for the form. `listing` is `None` in create mode.
fn form_context(slug: &AdminSlug, listing: Option<&Listing>, error: Option<&str>) -> Value {
    let (page_title, imagens) = match listing {
        Some(l) => (
            "Editar Imóvel",
            l.images()
                .into_iter()
                .map(sanitize_image_ref)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>(),
        ),
        None => ("Adicionar Novo Imóvel", Vec::new()),
    };

    let mut tipos: Vec<String> = TIPOS.iter().map(|t| t.to_string()).collect();
    if let Some(l) = listing {
        if !l.tipo.is_empty() && !tipos.iter().any(|t| t.eq_ignore_ascii_case(&l.tipo)) {
            tipos.push(l.tipo.clone());
        }
    }

    json!({
        "page_title": page_title,
        "admin_slug": slug.0,
        "editing": listing.is_some(),
        "listing": listing,
        "preco": listing.map(|l| l.preco.to_string()).unwrap_or_default(),
        "coords": listing.and_then(|l| l.coords.filter(Coords::is_set)),
        "imagens": imagens,
        "tipos": tipos,
        "error": error,
    })
}

#[get("/imoveis/novo")]
pub fn listing_new(_admin: AdminUser, slug: &State<AdminSlug>) -> Template {
    Template::render("admin/form", form_context(slug, None, None))
}

#[get("/imoveis/<id>/editar")]
pub fn listing_edit(
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    slug: &State<AdminSlug>,
    id: i64,
) -> Option<Template> {
    let repo = crate::routes::load_listings(store);
    let listing = repo.get_by_id(id)?;
    Some(Template::render("admin/form", form_context(slug, Some(listing), None)))
}

// ── POST: Create/Update ────────────────────────────────

#[post("/imoveis", data = "<form>")]
pub async fn listing_submit(
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    slug: &State<AdminSlug>,
    form: Form<ListingFormData<'_>>,
) -> Result<Redirect, Template> {
    let uploaded = read_photos(&form.fotos).await;
    let draft = form.to_draft(uploaded);
    let mut repo = crate::routes::load_listings(store);

    if draft.titulo.is_empty() {
        let current = form.edit_id().and_then(|id| repo.get_by_id(id));
        return Err(Template::render(
            "admin/form",
            form_context(slug, current, Some("Informe o título do imóvel.")),
        ));
    }

    match form.edit_id() {
        Some(id) => {
            if let Err(e) = repo.update(id, draft) {
                log::warn!("update: {}", e);
                return Err(Template::render(
                    "admin/form",
                    form_context(slug, None, Some("Imóvel não encontrado.")),
                ));
            }
            log::info!("update: listing {}", id);
        }
        None => {
            let id = repo.create(draft);
            log::info!("create: listing {}", id);
        }
    }

    Ok(Redirect::to(admin_base(slug)))
}

// ── Delete ─────────────────────────────────────────────

#[get("/imoveis/<id>/excluir")]
pub fn listing_delete_confirm(
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    slug: &State<AdminSlug>,
    id: i64,
) -> Option<Template> {
    let repo = crate::routes::load_listings(store);
    let listing = repo.get_by_id(id)?;
    let context = json!({
        "page_title": "Excluir Imóvel",
        "admin_slug": slug.0,
        "listing": listing,
    });
    Some(Template::render("admin/confirm_delete", &context))
}

#[post("/imoveis/<id>/excluir")]
pub fn listing_delete(
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    slug: &State<AdminSlug>,
    id: i64,
) -> Redirect {
    let mut repo = crate::routes::load_listings(store);
    if repo.delete(id) {
        log::info!("delete: listing {}", id);
    } else {
        log::warn!("delete: listing {} not found", id);
    }
    Redirect::to(admin_base(slug))
}
