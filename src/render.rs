use std::collections::HashMap;

pub mod card;
pub mod map;
pub mod pages;

pub use card::format_currency;

/// Which public page a shell wraps; drives the active nav link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    Listings,
    Detail,
    Advertise,
}

/// Wrap page content in the public site layout.
pub fn render_shell(
    settings: &HashMap<String, String>,
    section: Section,
    title: &str,
    body: &str,
    extra_head: &str,
) -> String {
    let site_name = settings
        .get("site_name")
        .map(String::as_str)
        .unwrap_or("Imobiliária Valor");

    let nav_link = |href: &str, label: &str, active: bool| -> String {
        format!(
            r#"<li><a href="{}"{}>{}</a></li>"#,
            href,
            if active { r#" class="active""# } else { "" },
            label
        )
    };

    let nav = [
        nav_link("/", "Início", section == Section::Home),
        nav_link(
            "/imoveis",
            "Imóveis",
            section == Section::Listings || section == Section::Detail,
        ),
        nav_link("/anuncie", "Anuncie", section == Section::Advertise),
    ]
    .join("");

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/static/css/style.css">
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css">
{extra_head}
</head>
<body>
<header>
    <a class="logo" href="/">{site_name}</a>
    <button class="menu-hamburger" aria-label="Abrir menu"><span></span><span></span><span></span></button>
    <nav><ul>{nav}</ul></nav>
</header>
<main>
{body}
</main>
<footer>
    <p>&copy; {year} {site_name}. Todos os direitos reservados.</p>
</footer>
</body>
</html>"#,
        title = html_escape(title),
        extra_head = extra_head,
        site_name = html_escape(site_name),
        nav = nav,
        body = body,
        year = chrono::Utc::now().format("%Y"),
    )
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Quote-safe attribute value for already-sanitized markup.
/// Entities the sanitizer left in place stay as they are.
pub(crate) fn attr_escape(s: &str) -> String {
    s.replace('"', "&quot;")
}

/// Percent-encode a query component the way browsers' `encodeURIComponent` does.
pub(crate) fn urlencoding_simple(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 2);
    for b in s.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'~'
            | b'!'
            | b'*'
            | b'\''
            | b'('
            | b')' => {
                result.push(b as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", b));
            }
        }
    }
    result
}
