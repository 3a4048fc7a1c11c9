use std::collections::HashMap;

use crate::filter::{Finalidade, ListingFilter, ViewMode};
use crate::models::listing::Listing;
use crate::sanitize::Sanitize;

use super::card::{display_price, render_card, render_list_row};
use super::map::MapView;
use super::{attr_escape, html_escape, render_shell, urlencoding_simple, Section};

const TIPO_OPTIONS: &[&str] = &["Apartamento", "Casa", "Comercial", "Terreno"];

// ── Home ───────────────────────────────────────────────

pub fn home_page(settings: &HashMap<String, String>, featured: &[Listing]) -> String {
    let grid = if featured.is_empty() {
        "<p>Nenhum imóvel em destaque no momento.</p>".to_string()
    } else {
        featured.iter().map(render_card).collect::<Vec<_>>().join("\n")
    };

    let body = format!(
        r#"<section class="hero">
    <h1>Encontre o imóvel dos seus sonhos</h1>
    <form class="hero-busca" action="/imoveis" method="get">
        <select name="tipo">{tipo_options}</select>
        <input type="text" name="cidade" placeholder="Cidade ou bairro">
        <button type="submit">Buscar</button>
    </form>
</section>
<section id="recentes">
    <h2>Imóveis em Destaque</h2>
    <div class="imoveis-grid">
{grid}
    </div>
</section>"#,
        tipo_options = tipo_options(None),
        grid = grid,
    );

    let title = site_title(settings);
    render_shell(settings, Section::Home, &title, &body, "")
}

// ── Listing ────────────────────────────────────────────

pub fn listings_page(
    settings: &HashMap<String, String>,
    filter: &ListingFilter,
    view: ViewMode,
    results: &[Listing],
) -> String {
    let (grid, list) = if results.is_empty() {
        let empty = "<p>Nenhum imóvel encontrado para os critérios selecionados.</p>";
        (empty.to_string(), empty.to_string())
    } else {
        (
            results.iter().map(render_card).collect::<Vec<_>>().join("\n"),
            results.iter().map(render_list_row).collect::<Vec<_>>().join("\n"),
        )
    };

    let (grid_style, list_style) = match view {
        ViewMode::Grade => ("grid", "none"),
        ViewMode::Lista => ("none", "block"),
    };

    let body = format!(
        r#"<div class="listagem-container">
<aside class="filtros">
{form}
</aside>
<section class="listagem">
    <div class="listagem-header">
        <h3>Exibindo {count} resultados</h3>
        <div class="view-toggle">
            <a id="view-grid" href="{grid_href}" class="{grid_active}" aria-label="Ver em grade"><i class="fa-solid fa-grip"></i></a>
            <a id="view-list" href="{list_href}" class="{list_active}" aria-label="Ver em lista"><i class="fa-solid fa-list"></i></a>
        </div>
    </div>
    <div id="grid-container" class="imoveis-grid" style="display: {grid_style}">
{grid}
    </div>
    <div id="list-container" class="imoveis-list" style="display: {list_style}">
{list}
    </div>
</section>
</div>"#,
        form = filter_form(filter, view),
        count = results.len(),
        grid_href = attr_escape(&view_href(filter, ViewMode::Grade)),
        list_href = attr_escape(&view_href(filter, ViewMode::Lista)),
        grid_active = if view == ViewMode::Grade { "active" } else { "" },
        list_active = if view == ViewMode::Lista { "active" } else { "" },
        grid_style = grid_style,
        list_style = list_style,
        grid = grid,
        list = list,
    );

    let title = format!("{} - Imóveis", site_title(settings));
    render_shell(settings, Section::Listings, &title, &body, "")
}

fn filter_form(filter: &ListingFilter, view: ViewMode) -> String {
    let finalidade = filter.finalidade();
    let finalidade_options = [("", "Todas"), ("comprar", "Comprar"), ("alugar", "Alugar")]
        .iter()
        .map(|(value, label)| {
            let selected = match Finalidade::parse(value) {
                Some(f) => finalidade == Some(f),
                None => finalidade.is_none(),
            };
            option(value, label, selected)
        })
        .collect::<String>();

    let quartos = filter.quartos.unwrap_or(0);
    let quartos_options = (0..=4u32)
        .map(|n| {
            if n == 0 {
                option("", "Todos", quartos == 0)
            } else {
                option(&n.to_string(), &format!("{}+", n), quartos == n)
            }
        })
        .collect::<String>();

    let number = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();

    format!(
        r#"<form class="form-filtros" action="/imoveis" method="get">
    <input type="hidden" name="view" value="{view}">
    <label for="finalidade">Finalidade</label>
    <select id="finalidade" name="finalidade">{finalidade_options}</select>
    <label for="tipo">Tipo de imóvel</label>
    <select id="tipo" name="tipo">{tipo_options}</select>
    <label for="cidade">Cidade</label>
    <input type="text" id="cidade" name="cidade" value="{cidade}">
    <label for="quartos">Quartos</label>
    <select id="quartos" name="quartos">{quartos_options}</select>
    <label for="preco-min">Preço mínimo</label>
    <input type="number" id="preco-min" name="preco_min" min="0" value="{preco_min}">
    <label for="preco-max">Preço máximo</label>
    <input type="number" id="preco-max" name="preco_max" min="0" value="{preco_max}">
    <button type="submit">Filtrar</button>
    {clear}
</form>"#,
        view = view.as_str(),
        finalidade_options = finalidade_options,
        tipo_options = tipo_options(filter.tipo.as_deref()),
        cidade = html_escape(filter.cidade.as_deref().unwrap_or("")),
        quartos_options = quartos_options,
        preco_min = number(filter.preco_min),
        preco_max = number(filter.preco_max),
        clear = if filter.is_empty() {
            String::new()
        } else {
            format!(
                r#"<a class="limpar-filtros" href="/imoveis?view={}">Limpar filtros</a>"#,
                view.as_str()
            )
        },
    )
}

fn tipo_options(selected: Option<&str>) -> String {
    let selected = selected.map(str::trim).filter(|s| !s.is_empty());
    let mut html = option("", "Todos", selected.is_none());
    let mut matched = false;
    for tipo in TIPO_OPTIONS {
        let is_selected = selected.is_some_and(|s| s.eq_ignore_ascii_case(tipo));
        matched |= is_selected;
        html.push_str(&option(tipo, tipo, is_selected));
    }
    // A type from the query string that is not in the fixed list still shows up selected
    if let Some(s) = selected.filter(|_| !matched) {
        html.push_str(&option(s, s, true));
    }
    html
}

fn option(value: &str, label: &str, selected: bool) -> String {
    format!(
        r#"<option value="{}"{}>{}</option>"#,
        html_escape(value),
        if selected { " selected" } else { "" },
        html_escape(label)
    )
}

/// Same search, other presentation.
fn view_href(filter: &ListingFilter, view: ViewMode) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(f) = filter.finalidade() {
        params.push(("finalidade", f.as_str().to_string()));
    }
    for (key, value) in [("tipo", &filter.tipo), ("cidade", &filter.cidade)] {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            params.push((key, v.to_string()));
        }
    }
    if let Some(q) = filter.quartos.filter(|q| *q > 0) {
        params.push(("quartos", q.to_string()));
    }
    if let Some(v) = filter.preco_min {
        params.push(("preco_min", v.to_string()));
    }
    if let Some(v) = filter.preco_max {
        params.push(("preco_max", v.to_string()));
    }
    params.push(("view", view.as_str().to_string()));

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding_simple(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("/imoveis?{}", query)
}

// ── Detail ─────────────────────────────────────────────

pub fn detail_page(settings: &HashMap<String, String>, listing: &Listing) -> String {
    let safe = listing.sanitized();
    let images = safe.images();
    let main_image = images
        .first()
        .copied()
        .unwrap_or_else(|| safe.image_or_placeholder());

    let thumbnails = if images.len() > 1 {
        let thumbs = images
            .iter()
            .enumerate()
            .map(|(i, src)| {
                format!(
                    r#"<img class="thumbnail-item{}" src="{}" alt="{} - foto {}">"#,
                    if i == 0 { " active" } else { "" },
                    attr_escape(src),
                    attr_escape(&safe.titulo),
                    i + 1
                )
            })
            .collect::<String>();
        format!(
            r#"<div class="thumbnails">{}</div>
<script>{}</script>"#,
            thumbs, GALLERY_JS
        )
    } else {
        String::new()
    };

    let whatsapp_number = settings
        .get("whatsapp_number")
        .map(String::as_str)
        .unwrap_or("5599999999999");

    let map = MapView::for_listing(&safe);

    let body = format!(
        r#"<div class="detalhe-imovel-grid">
    <div class="imovel-header">
        <h1>{titulo}</h1>
        <p class="localizacao"><i class="fa-solid fa-map-marker-alt"></i> {localizacao}</p>
        <p class="preco">{preco}</p>
    </div>
    <div class="galeria">
        <img id="imagem-destaque" src="{main_image}" alt="{alt}">
        {thumbnails}
    </div>
    <div class="features-grid">
        <div class="feature-item"><div><i class="fa-solid fa-ruler-combined"></i></div><span>{area} m²</span><p>Área útil</p></div>
        <div class="feature-item"><div><i class="fa-solid fa-bed"></i></div><span>{quartos}</span><p>Quartos</p></div>
        <div class="feature-item"><div><i class="fa-solid fa-bath"></i></div><span>{banheiros}</span><p>Banheiros</p></div>
        <div class="feature-item"><div><i class="fa-solid fa-car"></i></div><span>{vagas}</span><p>Vagas</p></div>
    </div>
    <div class="descricao-imovel">
        <h2>Descrição</h2>
        <p>{descricao}</p>
    </div>
    <a class="btn-whatsapp" href="{whatsapp}" target="_blank" rel="noopener"><i class="fa-brands fa-whatsapp"></i> Falar no WhatsApp</a>
    {map}
</div>"#,
        titulo = safe.titulo,
        localizacao = safe.localizacao,
        preco = display_price(&safe.preco),
        main_image = attr_escape(main_image),
        alt = attr_escape(&safe.titulo),
        thumbnails = thumbnails,
        area = safe.area,
        quartos = safe.quartos,
        banheiros = safe.banheiros,
        vagas = safe.vagas,
        descricao = safe.descricao,
        whatsapp = attr_escape(&whatsapp_link(whatsapp_number, &listing.titulo)),
        map = map.render(),
    );

    let title = format!("{} - {}", site_title(settings), listing.titulo);
    render_shell(settings, Section::Detail, &title, &body, &MapView::head_assets())
}

/// Outbound message-app link pre-filled with the listing title.
pub fn whatsapp_link(number: &str, titulo: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    let text = format!("Olá! Tenho interesse no imóvel: {}", titulo);
    format!("https://wa.me/{}?text={}", digits, urlencoding_simple(&text))
}

pub fn not_found_page(settings: &HashMap<String, String>) -> String {
    let body = r#"<div class="detalhe-imovel-grid">
    <h1>Imóvel não encontrado</h1>
    <p>O imóvel que você está procurando não existe ou foi removido.</p>
    <a href="/imoveis" class="btn-detalhes">Ver todos os imóveis</a>
</div>"#;
    let title = format!("{} - Imóvel não encontrado", site_title(settings));
    render_shell(settings, Section::Detail, &title, body, "")
}

// ── Anuncie ────────────────────────────────────────────

pub const ANUNCIO_SUCCESS: &str =
    "Seu anúncio foi enviado com sucesso! Nossa equipe entrará em contato em breve.";

pub fn advertise_page(settings: &HashMap<String, String>, submitted: bool) -> String {
    let feedback = if submitted {
        format!(r#"<div id="form-feedback" class="success">{}</div>"#, ANUNCIO_SUCCESS)
    } else {
        r#"<div id="form-feedback" class="hidden"></div>"#.to_string()
    };

    let body = format!(
        r#"<section class="anuncie">
    <h1>Anuncie seu imóvel</h1>
    {feedback}
    <form id="form-anuncio" action="/anuncie" method="post">
        <label for="nome">Nome</label>
        <input type="text" id="nome" name="nome" required>
        <label for="email">E-mail</label>
        <input type="email" id="email" name="email" required>
        <label for="telefone">Telefone</label>
        <input type="tel" id="telefone" name="telefone">
        <label for="tipo">Tipo de imóvel</label>
        <select id="tipo" name="tipo">{tipo_options}</select>
        <label for="mensagem">Mensagem</label>
        <textarea id="mensagem" name="mensagem" rows="5"></textarea>
        <button type="submit">Enviar anúncio</button>
    </form>
</section>"#,
        feedback = feedback,
        tipo_options = tipo_options(None),
    );

    let title = format!("{} - Anuncie", site_title(settings));
    render_shell(settings, Section::Advertise, &title, &body, "")
}

fn site_title(settings: &HashMap<String, String>) -> String {
    settings
        .get("site_name")
        .cloned()
        .unwrap_or_else(|| "Imobiliária Valor".to_string())
}

const GALLERY_JS: &str = r#"
(function() {
    const main = document.getElementById('imagem-destaque');
    const thumbs = document.querySelectorAll('.thumbnail-item');
    thumbs.forEach(function(thumb) {
        thumb.addEventListener('click', function() {
            thumbs.forEach(function(t) { t.classList.remove('active'); });
            thumb.classList.add('active');
            main.src = thumb.src;
        });
    });
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::{seed_listings, Coords};

    fn settings() -> HashMap<String, String> {
        let mut s = HashMap::new();
        s.insert("site_name".to_string(), "Imobiliária Valor".to_string());
        s.insert("whatsapp_number".to_string(), "5599999999999".to_string());
        s
    }

    #[test]
    fn home_shows_featured_or_empty_message() {
        let html = home_page(&settings(), &[]);
        assert!(html.contains("Nenhum imóvel em destaque no momento."));

        let featured: Vec<Listing> = seed_listings().into_iter().rev().collect();
        let html = home_page(&settings(), &featured);
        let office = html.find("Escritório Comercial").unwrap();
        let apt = html.find("Apartamento Moderno").unwrap();
        assert!(office < apt);
    }

    #[test]
    fn listing_page_counts_results_and_keeps_tipo_selected() {
        let filter = ListingFilter {
            tipo: Some("Casa".into()),
            ..Default::default()
        };
        let results = filter.apply(&seed_listings());
        let html = listings_page(&settings(), &filter, ViewMode::Grade, &results);
        assert!(html.contains("Exibindo 1 resultados"));
        assert!(html.contains(r#"<option value="Casa" selected>Casa</option>"#));
        assert!(html.contains(r#"id="grid-container" class="imoveis-grid" style="display: grid""#));
        assert!(html.contains(r#"id="list-container" class="imoveis-list" style="display: none""#));
    }

    #[test]
    fn clear_link_only_with_active_filter() {
        let html = listings_page(&settings(), &ListingFilter::default(), ViewMode::Grade, &[]);
        assert!(!html.contains("Limpar filtros"));

        let filter = ListingFilter {
            quartos: Some(2),
            ..Default::default()
        };
        let html = listings_page(&settings(), &filter, ViewMode::Lista, &[]);
        assert!(html.contains(r#"href="/imoveis?view=lista">Limpar filtros"#));
    }

    #[test]
    fn listing_page_empty_result_message() {
        let html = listings_page(&settings(), &ListingFilter::default(), ViewMode::Lista, &[]);
        assert!(html.contains("Exibindo 0 resultados"));
        assert!(html.contains("Nenhum imóvel encontrado para os critérios selecionados."));
        assert!(html.contains(r#"style="display: block""#));
    }

    #[test]
    fn view_toggle_keeps_search() {
        let filter = ListingFilter {
            tipo: Some("Casa".into()),
            cidade: Some("Bairro Residencial".into()),
            ..Default::default()
        };
        assert_eq!(
            view_href(&filter, ViewMode::Lista),
            "/imoveis?tipo=Casa&cidade=Bairro%20Residencial&view=lista"
        );
    }

    #[test]
    fn cidade_input_is_escaped() {
        let filter = ListingFilter {
            cidade: Some(r#""><script>alert(1)</script>"#.into()),
            ..Default::default()
        };
        let html = listings_page(&settings(), &filter, ViewMode::Grade, &[]);
        assert!(!html.contains("<script>alert(1)"));
    }

    #[test]
    fn whatsapp_link_encodes_title() {
        let link = whatsapp_link("55 (99) 99999-9999", "Casa & Quintal");
        assert_eq!(
            link,
            "https://wa.me/5599999999999?text=Ol%C3%A1!%20Tenho%20interesse%20no%20im%C3%B3vel%3A%20Casa%20%26%20Quintal"
        );
    }

    #[test]
    fn detail_page_fills_fixed_feature_block() {
        let office = seed_listings().remove(2);
        let html = detail_page(&settings(), &office);
        assert!(html.contains("<title>Imobiliária Valor - Escritório Comercial em Localização Estratégica</title>"));
        assert!(html.contains("<span>0</span><p>Quartos</p>"));
        assert!(html.contains("<span>200 m²</span><p>Área útil</p>"));
        assert!(html.contains("https://wa.me/5599999999999?text="));
        assert!(html.contains(r#"data-zoom="12""#));
    }

    #[test]
    fn detail_page_centres_map_on_coords_and_lists_thumbnails() {
        let mut casa = seed_listings().remove(1);
        casa.coords = Some(Coords { lat: -22.9, lon: -43.2 });
        casa.imagens = vec!["a.jpg".into(), "b.jpg".into()];
        casa.imagem = "a.jpg".into();
        let html = detail_page(&settings(), &casa);
        assert!(html.contains(r#"data-lat="-22.9""#));
        assert!(html.contains(r#"data-zoom="16""#));
        assert!(html.contains(r#"class="thumbnail-item active" src="a.jpg""#));
        assert!(html.contains(r#"class="thumbnail-item" src="b.jpg""#));
    }

    #[test]
    fn not_found_page_message() {
        let html = not_found_page(&settings());
        assert!(html.contains("Imóvel não encontrado"));
        assert!(html.contains("não existe ou foi removido"));
    }

    #[test]
    fn advertise_page_feedback() {
        assert!(!advertise_page(&settings(), false).contains(ANUNCIO_SUCCESS));
        assert!(advertise_page(&settings(), true).contains(ANUNCIO_SUCCESS));
    }
}
