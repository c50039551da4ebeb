use actix_web::{
    HttpRequest, HttpResponse, get,
    http::Method,
    web::{self, Data, ServiceConfig},
};
use chrono::Utc;

use crate::api::error::AppError;
use crate::api::validation::{FieldErrors, Submission};
use crate::api::views::{redirect, render};
use super::models::AffiliateForm;
use super::service::AffiliateService;
use super::views::{AffiliateFormView, AffiliateIndexView, AffiliateWaitView};

#[get("/affiliate")]
async fn list_affiliates(service: Data<AffiliateService>) -> Result<HttpResponse, AppError> {
    let affiliates = service.list().await?;
    let categories = service.categories().await?;
    render(&AffiliateIndexView::new(&affiliates, &categories))
}

#[get("/affiliate/new")]
async fn new_affiliate(service: Data<AffiliateService>) -> Result<HttpResponse, AppError> {
    let categories = service.categories().await?;
    render(&AffiliateFormView::new(&AffiliateForm::default(), FieldErrors::new(), &categories))
}

async fn create_affiliate(
    req: HttpRequest,
    service: Data<AffiliateService>,
    body: Option<web::Form<Vec<(String, String)>>>,
) -> Result<HttpResponse, AppError> {
    if req.method() != Method::POST {
        return Err(AppError::not_found(format!("No route for {} {}", req.method(), req.path())));
    }

    let form = body
        .map(|pairs| AffiliateForm::from_pairs(&pairs))
        .unwrap_or_default();

    match service.create(&form, Utc::now()).await? {
        Submission::Saved(_) => Ok(redirect("/affiliate/wait")),
        Submission::Invalid(errors) => {
            let categories = service.categories().await?;
            render(&AffiliateFormView::new(&form, errors, &categories))
        }
    }
}

#[get("/affiliate/wait")]
async fn wait() -> Result<HttpResponse, AppError> {
    render(&AffiliateWaitView)
}

pub fn affiliate_config(config: &mut ServiceConfig) {
    config
        .service(list_affiliates)
        .service(new_affiliate)
        .service(web::resource("/affiliate/create").to(create_affiliate))
        .service(wait);
}
