use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Cursor;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use serde_json::Value;

use crate::models::listing::{Listing, PLACEHOLDER_IMAGE};

/// Elements dropped together with everything inside them
const DANGEROUS_ELEMENTS: &[&str] = &[
    "script",
    "style",
    "iframe",
    "frame",
    "frameset",
    "object",
    "embed",
    "applet",
    "form",
    "input",
    "button",
    "textarea",
    "select",
    "link",
    "meta",
    "base",
    "svg",
    "math",
    "template",
    "noscript",
    "foreignobject",
];

/// Dangerous URI schemes in href/src attributes
const DANGEROUS_SCHEMES: &[&str] = &[
    "javascript:",
    "vbscript:",
    "data:text/html",
    "data:application",
];

/// Attributes that can contain URIs and need scheme checking
const URI_ATTRIBUTES: &[&str] = &[
    "href",
    "xlink:href",
    "src",
    "srcset",
    "action",
    "formaction",
    "background",
    "poster",
];

const WRAPPER_OPEN: &str = "<valor-fragment>";
const WRAPPER_CLOSE: &str = "</valor-fragment>";

/// Values that can be scrubbed before being interpolated into markup.
pub trait Sanitize {
    fn sanitized(&self) -> Self;
}

impl Sanitize for String {
    fn sanitized(&self) -> Self {
        sanitize_html(self)
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitized(&self) -> Self {
        self.iter().map(Sanitize::sanitized).collect()
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitized(&self) -> Self {
        self.as_ref().map(Sanitize::sanitized)
    }
}

impl<T: Sanitize> Sanitize for BTreeMap<String, T> {
    fn sanitized(&self) -> Self {
        self.iter()
            .map(|(k, v)| (k.clone(), v.sanitized()))
            .collect()
    }
}

impl Sanitize for Value {
    fn sanitized(&self) -> Self {
        match self {
            Value::String(s) => Value::String(sanitize_html(s)),
            Value::Array(items) => Value::Array(items.iter().map(Sanitize::sanitized).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.sanitized()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl Sanitize for Listing {
    fn sanitized(&self) -> Self {
        let imagem = sanitize_image_ref(&self.imagem);
        Listing {
            id: self.id,
            titulo: self.titulo.sanitized(),
            preco: self.preco,
            localizacao: self.localizacao.sanitized(),
            tipo: self.tipo.sanitized(),
            quartos: self.quartos,
            banheiros: self.banheiros,
            vagas: self.vagas,
            area: self.area,
            imagem: if imagem.is_empty() && !self.imagem.is_empty() {
                PLACEHOLDER_IMAGE.to_string()
            } else {
                imagem
            },
            imagens: self
                .imagens
                .iter()
                .map(|src| sanitize_image_ref(src))
                .filter(|src| !src.is_empty())
                .collect(),
            descricao: self.descricao.sanitized(),
            coords: self.coords,
            extra: self
                .extra
                .iter()
                .map(|(k, v)| (k.clone(), v.sanitized()))
                .collect(),
        }
    }
}

/// Remove executable markup from an HTML fragment.
/// Input that cannot be tokenized is escaped whole.
pub fn sanitize_html(input: &str) -> String {
    if !input.contains('<') {
        return input.to_string();
    }
    scrub_markup(input).unwrap_or_else(|| escape_all(input))
}

/// Image references end up in `src` attributes; reject script-bearing schemes,
/// whether written plainly or as character references.
pub fn sanitize_image_ref(src: &str) -> String {
    let decoded = unescape(src).unwrap_or(Cow::Borrowed(src));
    if has_dangerous_uri(src) || has_dangerous_uri(&decoded) || has_encoded_scheme(src) {
        return String::new();
    }
    sanitize_html(src)
}

fn scrub_markup(input: &str) -> Option<String> {
    let wrapped = format!("{}{}{}", WRAPPER_OPEN, input, WRAPPER_CLOSE);
    let mut reader = Reader::from_str(&wrapped);
    reader.config_mut().trim_text(false);

    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut skip_depth: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) => {
                if skip_depth > 0 {
                    skip_depth += 1;
                    continue;
                }

                if is_dangerous_element(&tag_name(e)) {
                    skip_depth = 1;
                    continue;
                }

                writer.write_event(Event::Start(clean_attributes(e))).ok()?;
            }
            Ok(Event::End(ref e)) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    continue;
                }
                writer.write_event(Event::End(e.to_owned())).ok()?;
            }
            Ok(Event::Empty(ref e)) => {
                if skip_depth > 0 || is_dangerous_element(&tag_name(e)) {
                    continue;
                }
                writer.write_event(Event::Empty(clean_attributes(e))).ok()?;
            }
            Ok(Event::Text(ref e)) => {
                if skip_depth > 0 {
                    continue;
                }
                writer.write_event(Event::Text(e.to_owned())).ok()?;
            }
            Ok(Event::CData(ref e)) => {
                if skip_depth > 0 {
                    continue;
                }
                let text = String::from_utf8_lossy(&e.clone().into_inner()).to_string();
                let escaped = escape_all(&text);
                writer
                    .write_event(Event::Text(quick_xml::events::BytesText::from_escaped(
                        escaped,
                    )))
                    .ok()?;
            }
            // Comments can carry conditional-comment tricks
            Ok(Event::Comment(_)) => continue,
            Ok(Event::Decl(_)) | Ok(Event::PI(_)) | Ok(Event::DocType(_)) => continue,
            Err(_) => return None,
        }
    }

    let out = String::from_utf8(writer.into_inner().into_inner()).ok()?;
    let inner = out
        .strip_prefix(WRAPPER_OPEN)?
        .strip_suffix(WRAPPER_CLOSE)?;
    Some(inner.to_string())
}

fn tag_name(e: &BytesStart) -> String {
    std::str::from_utf8(e.name().as_ref())
        .unwrap_or("")
        .to_lowercase()
}

fn is_dangerous_element(tag: &str) -> bool {
    DANGEROUS_ELEMENTS.contains(&tag)
}

fn is_event_handler(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.starts_with("on") && lower.len() > 2
}

fn has_dangerous_uri(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_lowercase();
    DANGEROUS_SCHEMES
        .iter()
        .any(|scheme| compact.starts_with(scheme))
}

/// A reference before the first path separator can spell out a scheme the
/// browser decodes, even without a trailing `;`.
fn has_encoded_scheme(value: &str) -> bool {
    value
        .trim_start()
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .map_or(false, |head| head.contains('&'))
}

fn clean_attributes(e: &BytesStart) -> BytesStart<'static> {
    let mut cleaned = BytesStart::new(
        std::str::from_utf8(e.name().as_ref())
            .unwrap_or("span")
            .to_string(),
    );

    for attr in e.attributes().flatten() {
        let name = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
        // Checks run on the decoded value; undecodable values are dropped
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        let value = value.as_ref();

        if name.is_empty() || is_event_handler(name) {
            continue;
        }

        let lower_name = name.to_lowercase();
        if URI_ATTRIBUTES.contains(&lower_name.as_str()) && has_dangerous_uri(value) {
            continue;
        }

        if lower_name == "style" {
            let lower_val = value.to_lowercase();
            if lower_val.contains("javascript:")
                || lower_val.contains("expression(")
                || lower_val.contains("url(")
            {
                continue;
            }
        }

        // Re-escaped on the way out, always double-quoted
        cleaned.push_attribute((name, value));
    }

    cleaned
}

fn escape_all(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(sanitize_html("Centro, Cidade Exemplo"), "Centro, Cidade Exemplo");
        assert_eq!(sanitize_html(""), "");
    }

    #[test]
    fn benign_markup_is_kept() {
        let out = sanitize_html("<b>Vista</b> para o <em>mar</em>");
        assert_eq!(out, "<b>Vista</b> para o <em>mar</em>");
    }

    #[test]
    fn strips_script_element_and_content() {
        let out = sanitize_html("Casa<script>alert('xss')</script> ampla");
        assert!(!out.contains("<script"));
        assert!(!out.contains("alert"));
        assert!(out.contains("Casa"));
        assert!(out.contains("ampla"));
    }

    #[test]
    fn strips_event_handlers() {
        let out = sanitize_html(r#"<img src="x.jpg" onerror="alert(1)"/>"#);
        assert!(!out.contains("onerror"));
        assert!(out.contains("x.jpg"));
    }

    #[test]
    fn strips_javascript_href() {
        let out = sanitize_html(r#"<a href="javascript:alert(1)">clique</a>"#);
        assert!(!out.contains("javascript:"));
        assert!(out.contains("clique"));
    }

    #[test]
    fn single_quoted_value_cannot_open_new_attribute() {
        let out = sanitize_html(r#"<a title='x" onclick="alert(1)'>y</a>"#);
        assert_eq!(out, r#"<a title="x&quot; onclick=&quot;alert(1)">y</a>"#);
    }

    #[test]
    fn entity_encoded_scheme_is_stripped() {
        let out = sanitize_html(r#"<a href="jav&#x61;script:alert(1)">y</a>"#);
        assert_eq!(out, "<a>y</a>");

        let out = sanitize_html(r#"<a href="/imoveis?a=1&amp;b=2">ok</a>"#);
        assert_eq!(out, r#"<a href="/imoveis?a=1&amp;b=2">ok</a>"#);
    }

    #[test]
    fn strips_comments() {
        let out = sanitize_html("<!-- <script>alert(1)</script> -->texto");
        assert!(!out.contains("<!--"));
        assert!(!out.contains("alert"));
        assert_eq!(out, "texto");
    }

    #[test]
    fn malformed_markup_is_escaped() {
        let out = sanitize_html("<img src=x onerror=alert(1)>");
        assert!(!out.contains('<'));
        assert!(out.contains("&lt;img"));
    }

    #[test]
    fn image_refs_reject_script_schemes() {
        assert_eq!(sanitize_image_ref("javascript:alert(1)"), "");
        assert_eq!(sanitize_image_ref(" JaVaScRiPt:alert(1)"), "");
        assert_eq!(sanitize_image_ref("jav&#x61;script:alert(1)"), "");
        assert_eq!(sanitize_image_ref("jav&#x61script:alert(1)"), "");
        assert_eq!(
            sanitize_image_ref("https://img.test/a.jpg?w=1&h=2"),
            "https://img.test/a.jpg?w=1&h=2"
        );
        assert_eq!(
            sanitize_image_ref("data:image/png;base64,AAAA"),
            "data:image/png;base64,AAAA"
        );
    }

    #[test]
    fn values_recurse_and_keep_other_types() {
        let input = json!({
            "titulo": "<script>x</script>Casa",
            "fotos": ["<b>a</b>", "<iframe src=\"e\"></iframe>b"],
            "quartos": 3,
            "ativo": true,
            "nada": null
        });
        let out = input.sanitized();
        assert_eq!(out["titulo"], "Casa");
        assert_eq!(out["fotos"][0], "<b>a</b>");
        assert_eq!(out["fotos"][1], "b");
        assert_eq!(out["quartos"], 3);
        assert_eq!(out["ativo"], true);
        assert!(out["nada"].is_null());
    }

    #[test]
    fn listing_fields_are_scrubbed() {
        let mut listing = crate::models::listing::seed_listings().remove(0);
        listing.titulo = "<script>alert(1)</script>Apartamento".into();
        listing.imagem = "javascript:alert(1)".into();
        listing.imagens = vec!["javascript:alert(1)".into(), "b.jpg".into()];

        let clean = listing.sanitized();
        assert_eq!(clean.titulo, "Apartamento");
        assert_eq!(clean.imagem, PLACEHOLDER_IMAGE);
        assert_eq!(clean.imagens, vec!["b.jpg".to_string()]);
        assert_eq!(clean.preco, listing.preco);
    }

    #[test]
    fn unknown_listing_keys_are_scrubbed_too() {
        let mut listing = crate::models::listing::seed_listings().remove(0);
        listing
            .extra
            .insert("nota".into(), json!("<script>x</script>ok"));
        assert_eq!(listing.sanitized().extra["nota"], "ok");
    }
}
