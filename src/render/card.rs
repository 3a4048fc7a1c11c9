use crate::models::listing::{Listing, Preco};
use crate::sanitize::Sanitize;

use super::attr_escape;

/// One feature chip on a listing card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub icon: &'static str,
    pub value: u32,
    pub label: &'static str,
}

impl Feature {
    pub fn text(&self) -> String {
        format!("{} {}", self.value, self.label)
    }
}

/// Brazilian-real formatting with two decimals: `R$ 1.250.000,00`.
pub fn format_currency(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("R$\u{a0}{},00", grouped)
}

/// Sale prices render as currency; rent keeps its stored `/mês` form.
pub fn display_price(preco: &Preco) -> String {
    match preco {
        Preco::Sale(amount) => format_currency(*amount),
        Preco::Rent(_) => preco.to_string(),
    }
}

/// Area, bedrooms, bathrooms and parking, skipping anything that is zero.
pub fn features(listing: &Listing) -> Vec<Feature> {
    [
        Feature { icon: "ruler-combined", value: listing.area, label: "m²" },
        Feature { icon: "bed", value: listing.quartos, label: "Quartos" },
        Feature { icon: "bath", value: listing.banheiros, label: "Banh." },
        Feature { icon: "car", value: listing.vagas, label: "Vagas" },
    ]
    .into_iter()
    .filter(|f| f.value > 0)
    .collect()
}

fn render_features(listing: &Listing) -> String {
    features(listing)
        .iter()
        .map(|f| {
            format!(
                r#"<div class="card-feature-item"><i class="fa-solid fa-{}" aria-hidden="true"></i><span>{}</span></div>"#,
                f.icon,
                f.text()
            )
        })
        .collect()
}

fn detail_href(listing: &Listing) -> String {
    format!("/imovel?id={}", listing.id)
}

/// Grid card for one listing.
pub fn render_card(listing: &Listing) -> String {
    let safe = listing.sanitized();
    format!(
        r#"<div class="imovel-card">
    <img src="{img}" alt="{alt}" loading="lazy" width="600" height="400">
    <div class="imovel-card-content">
        <h3>{titulo}</h3>
        <p class="preco">{preco}</p>
        <p class="localizacao">{localizacao}</p>
        <div class="imovel-card-features">{features}</div>
        <a href="{href}" class="btn-detalhes" aria-label="Ver detalhes de {alt}">Ver Detalhes</a>
    </div>
</div>"#,
        img = attr_escape(safe.image_or_placeholder()),
        alt = attr_escape(&safe.titulo),
        titulo = safe.titulo,
        preco = display_price(&safe.preco),
        localizacao = safe.localizacao,
        features = render_features(&safe),
        href = detail_href(&safe),
    )
}

/// Row for the list view; same data as the card, laid out horizontally.
pub fn render_list_row(listing: &Listing) -> String {
    let safe = listing.sanitized();
    format!(
        r#"<div class="imovel-list-item">
    <img src="{img}" alt="{alt}">
    <div class="imovel-list-content">
        <h3>{titulo}</h3>
        <p class="preco">{preco}</p>
        <p class="localizacao">{localizacao}</p>
        <div class="imovel-card-features">{features}</div>
        <a href="{href}" class="btn-detalhes">Ver Detalhes</a>
    </div>
</div>"#,
        img = attr_escape(safe.image_or_placeholder()),
        alt = attr_escape(&safe.titulo),
        titulo = safe.titulo,
        preco = display_price(&safe.preco),
        localizacao = safe.localizacao,
        features = render_features(&safe),
        href = detail_href(&safe),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::seed_listings;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(1_250_000), "R$\u{a0}1.250.000,00");
        assert_eq!(format_currency(980_000), "R$\u{a0}980.000,00");
        assert_eq!(format_currency(999), "R$\u{a0}999,00");
        assert_eq!(format_currency(0), "R$\u{a0}0,00");
    }

    #[test]
    fn rent_price_passes_through() {
        assert_eq!(display_price(&Preco::Rent(5500)), "5500/mês");
        assert_eq!(display_price(&Preco::Sale(5500)), "R$\u{a0}5.500,00");
    }

    #[test]
    fn zero_bedrooms_has_no_chip() {
        let office = seed_listings().remove(2);
        assert_eq!(office.quartos, 0);
        let chips: Vec<String> = features(&office).iter().map(Feature::text).collect();
        assert!(!chips.iter().any(|c| c.contains("Quartos")));
        assert_eq!(chips, vec!["200 m²", "2 Banh.", "5 Vagas"]);

        let html = render_card(&office);
        assert!(!html.contains("Quartos"));
    }

    #[test]
    fn three_bedrooms_renders_chip() {
        let apt = seed_listings().remove(0);
        let html = render_card(&apt);
        assert!(html.contains("<span>3 Quartos</span>"));
        assert!(html.contains("R$\u{a0}1.250.000,00"));
        assert!(html.contains(r#"href="/imovel?id=1""#));
    }

    #[test]
    fn card_scrubs_markup_and_uses_placeholder() {
        let mut listing = seed_listings().remove(1);
        listing.titulo = "Casa<script>alert(1)</script>".into();
        listing.imagem = String::new();
        let html = render_card(&listing);
        assert!(!html.contains("<script"));
        assert!(html.contains("<h3>Casa</h3>"));
        assert!(html.contains(r#"src="/images/placeholder.jpg""#));
    }

    #[test]
    fn list_row_carries_same_fields() {
        let office = seed_listings().remove(2);
        let html = render_list_row(&office);
        assert!(html.contains("imovel-list-item"));
        assert!(html.contains("<p class=\"preco\">5500/mês</p>"));
        assert!(html.contains("Distrito Financeiro"));
    }
}
