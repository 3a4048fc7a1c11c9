use crate::models::listing::Listing;

use super::html_escape;

pub const DEFAULT_LAT: f64 = -23.55052;
pub const DEFAULT_LON: f64 = -46.633308;
pub const DEFAULT_ZOOM: u8 = 12;
pub const LISTING_ZOOM: u8 = 16;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

const MAP_INIT_JS: &str = r#"
(function() {
    const el = document.getElementById('mapa-detalhe');
    if (!el || typeof L === 'undefined') return;
    const lat = parseFloat(el.dataset.lat);
    const lon = parseFloat(el.dataset.lon);
    const map = L.map(el).setView([lat, lon], parseInt(el.dataset.zoom, 10));
    L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
        attribution: '&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors'
    }).addTo(map);
    L.marker([lat, lon]).addTo(map).bindPopup(el.dataset.popup).openPopup();
})();
"#;

/// Centre, zoom and marker popup handed to the client-side map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
    pub popup: String,
}

impl MapView {
    /// Centred on the listing when it has coordinates, otherwise on the default city.
    /// Expects a sanitized listing; the popup is markup.
    pub fn for_listing(listing: &Listing) -> Self {
        match listing.coords {
            Some(c) if c.is_set() => MapView {
                lat: c.lat,
                lon: c.lon,
                zoom: LISTING_ZOOM,
                popup: format!("<b>{}</b><br>{}", listing.titulo, listing.localizacao),
            },
            _ => MapView {
                lat: DEFAULT_LAT,
                lon: DEFAULT_LON,
                zoom: DEFAULT_ZOOM,
                popup: "<b>Localização de Exemplo</b><br>Centro, São Paulo".to_string(),
            },
        }
    }

    pub fn head_assets() -> String {
        format!(r#"<link rel="stylesheet" href="{}">"#, LEAFLET_CSS)
    }

    /// The popup is fully escaped so `dataset.popup` decodes back to exactly
    /// the sanitized markup.
    pub fn render(&self) -> String {
        format!(
            r#"<section class="localizacao-mapa">
    <h2>Localização</h2>
    <div id="mapa-detalhe" data-lat="{}" data-lon="{}" data-zoom="{}" data-popup="{}"></div>
</section>
<script src="{}"></script>
<script>{}</script>"#,
            self.lat,
            self.lon,
            self.zoom,
            html_escape(&self.popup),
            LEAFLET_JS,
            MAP_INIT_JS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::{seed_listings, Coords};
    use crate::sanitize::Sanitize;

    #[test]
    fn falls_back_to_default_city() {
        let listing = seed_listings().remove(0);
        let view = MapView::for_listing(&listing);
        assert_eq!(view.lat, DEFAULT_LAT);
        assert_eq!(view.lon, DEFAULT_LON);
        assert_eq!(view.zoom, 12);
        assert!(view.popup.contains("Localização de Exemplo"));
    }

    #[test]
    fn centres_on_listing_coords() {
        let mut listing = seed_listings().remove(1);
        listing.coords = Some(Coords { lat: -22.9, lon: -43.2 });
        let view = MapView::for_listing(&listing);
        assert_eq!((view.lat, view.lon, view.zoom), (-22.9, -43.2, 16));
        assert_eq!(
            view.popup,
            "<b>Casa de Família com Quintal Amplo</b><br>Bairro Residencial, Cidade Exemplo"
        );
    }

    #[test]
    fn zero_coords_count_as_missing() {
        let mut listing = seed_listings().remove(1);
        listing.coords = Some(Coords { lat: 0.0, lon: -43.2 });
        assert_eq!(MapView::for_listing(&listing).zoom, DEFAULT_ZOOM);
    }

    #[test]
    fn render_emits_data_attributes() {
        let view = MapView::for_listing(&seed_listings().remove(0));
        let html = view.render();
        assert!(html.contains(r#"data-lat="-23.55052""#));
        assert!(html.contains(r#"data-zoom="12""#));
        assert!(html.contains("leaflet.js"));
    }

    #[test]
    fn escaped_title_stays_escaped_in_popup() {
        let mut listing = seed_listings().remove(1);
        listing.titulo = "<img src=x onerror=alert(1)>".into();
        listing.coords = Some(Coords { lat: -22.9, lon: -43.2 });
        let html = MapView::for_listing(&listing.sanitized()).render();
        assert!(html.contains(
            r#"data-popup="&lt;b&gt;&amp;lt;img src=x onerror=alert(1)&amp;gt;&lt;/b&gt;"#
        ));
        assert!(!html.contains("<img"));
    }
}
