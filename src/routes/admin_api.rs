use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use serde_json::{json, Value};

use super::admin::read_photos;
use crate::auth::AdminUser;

#[derive(FromForm)]
pub struct PhotoUpload<'f> {
    #[field(default = Vec::new())]
    pub fotos: Vec<TempFile<'f>>,
}

/// Preview for the admin form: selected files come back as data URIs in
/// submission order.
#[post("/fotos", data = "<form>")]
pub async fn photo_preview(_admin: AdminUser, form: Form<PhotoUpload<'_>>) -> Json<Value> {
    let imagens = read_photos(&form.fotos).await;
    Json(json!({ "imagens": imagens }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![photo_preview]
}
