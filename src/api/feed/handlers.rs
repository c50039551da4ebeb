use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header,
    web::{Data, Path, ServiceConfig},
};
use actix_web_validator::Query;
use chrono::Utc;

use crate::api::error::AppError;
use super::models::{FeedQuery, Format};
use super::service::FeedService;

async fn respond(
    req: &HttpRequest,
    service: &FeedService,
    token: &str,
    query: &FeedQuery,
    format: Format,
) -> Result<HttpResponse, AppError> {
    let base_url = {
        let info = req.connection_info();
        format!("{}://{}", info.scheme(), info.host())
    };
    let feed = service.affiliate_feed(token, query.limit(), &base_url, Utc::now()).await?;

    match format {
        Format::Json => Ok(HttpResponse::Ok().json(&feed)),
        Format::Yaml => Ok(HttpResponse::Ok()
            .content_type("text/yaml")
            .body(serde_yaml::to_string(&feed)?)),
    }
}

#[get("/api/{token}/jobs.{format}")]
async fn list_jobs_as(
    req: HttpRequest,
    service: Data<FeedService>,
    path: Path<(String, String)>,
    query: Query<FeedQuery>,
) -> Result<HttpResponse, AppError> {
    let (token, suffix) = path.into_inner();
    let format = Format::from_suffix(&suffix)
        .ok_or_else(|| AppError::not_found(format!("Unknown feed format {suffix:?}")))?;
    respond(&req, &service, &token, &query, format).await
}

#[get("/api/{token}/jobs")]
async fn list_jobs(
    req: HttpRequest,
    service: Data<FeedService>,
    token: Path<String>,
    query: Query<FeedQuery>,
) -> Result<HttpResponse, AppError> {
    let accept = req.headers().get(header::ACCEPT).and_then(|v| v.to_str().ok());
    let format = Format::from_accept(accept);
    respond(&req, &service, &token, &query, format).await
}

pub fn feed_config(config: &mut ServiceConfig) {
    config.service(list_jobs_as).service(list_jobs);
}
