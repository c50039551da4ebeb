use actix_web::{HttpResponse, http::header};
use askama::Template;

use crate::api::error::AppError;

/// Option of a radio group, select box or checkbox list
#[derive(Debug, Clone)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub fn render<T: Template>(template: &T) -> Result<HttpResponse, AppError> {
    let body = template.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

/// 303 so browsers follow a form POST with a GET
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}
