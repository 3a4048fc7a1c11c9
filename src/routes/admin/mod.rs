use base64::{engine::general_purpose::STANDARD, Engine};
use rocket::fs::TempFile;
use rocket::tokio::io::AsyncReadExt;

use crate::AdminSlug;

pub mod dashboard;
pub mod listings;

/// Helper: get the admin base path from managed state
pub(crate) fn admin_base(slug: &AdminSlug) -> String {
    format!("/{}", slug.0)
}

/// Read an uploaded photo into a `data:<mime>;base64,...` URI.
///
/// Empty parts (a file input left blank) and non-image uploads yield `None`.
pub(crate) async fn read_photo(file: &TempFile<'_>) -> Option<String> {
    if file.len() == 0 {
        return None;
    }

    let mime = match file.content_type() {
        Some(ct) if ct.top().as_str().eq_ignore_ascii_case("image") => {
            format!("{}/{}", ct.top(), ct.sub()).to_lowercase()
        }
        other => {
            log::warn!(
                "Rejected upload with content type {}",
                other.map(|ct| ct.to_string()).unwrap_or_else(|| "none".into())
            );
            return None;
        }
    };

    let mut bytes = Vec::with_capacity(file.len() as usize);
    let read = match file.open().await {
        Ok(reader) => Box::pin(reader).read_to_end(&mut bytes).await,
        Err(e) => Err(e),
    };
    if let Err(e) = read {
        log::error!("Failed to read uploaded photo: {}", e);
        return None;
    }

    Some(data_uri(&mime, &bytes))
}

/// Read every non-empty photo in submission order.
pub(crate) async fn read_photos(files: &[TempFile<'_>]) -> Vec<String> {
    let mut uris = Vec::with_capacity(files.len());
    for file in files {
        if let Some(uri) = read_photo(file).await {
            uris.push(uri);
        }
    }
    uris
}

pub(crate) fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        dashboard::dashboard,
        listings::listing_new,
        listings::listing_edit,
        listings::listing_submit,
        listings::listing_delete_confirm,
        listings::listing_delete,
    ]
}
