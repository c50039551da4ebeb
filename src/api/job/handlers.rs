use actix_multipart::form::MultipartForm;
use actix_session::Session;
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::Method,
    post,
    web::{self, Data, Path, ServiceConfig},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::error::AppError;
use crate::api::session::UserContext;
use crate::api::validation::{FieldErrors, Submission};
use crate::api::views::{redirect, render};
use crate::db::models::JobRow;
use super::models::{JobForm, JobUpload};
use super::service::JobService;
use super::views::{HistoryLink, JobFormView, JobIndexView, JobShowView};

/// Anti-forgery field posted by the owner action buttons
#[derive(Debug, Deserialize)]
pub struct CsrfForm {
    #[serde(rename = "_csrf_token")]
    csrf_token: Option<String>,
}

fn submitted_token(form: &Option<web::Form<CsrfForm>>) -> Option<&str> {
    form.as_ref().and_then(|f| f.csrf_token.as_deref())
}

fn require_post(req: &HttpRequest) -> Result<(), AppError> {
    if req.method() == Method::POST {
        Ok(())
    } else {
        Err(AppError::not_found(format!("No route for {} {}", req.method(), req.path())))
    }
}

/// Oversized or malformed multipart bodies are rejected rather than bound
/// as an empty form
fn read_upload(upload: Result<MultipartForm<JobUpload>, actix_web::Error>) -> Result<JobUpload, AppError> {
    upload
        .map(MultipartForm::into_inner)
        .map_err(|e| AppError::BadRequest(format!("Unreadable job submission: {e}")))
}

#[get("/")]
async fn index(service: Data<JobService>, session: Session) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    let context = UserContext::load(&session)?;

    let listings = service.homepage(now).await?;
    let history = service.history(context.job_history()).await?;

    render(&JobIndexView::new(listings, HistoryLink::from_jobs(&history, now)))
}

#[get("/job/new")]
async fn new_job(service: Data<JobService>) -> Result<HttpResponse, AppError> {
    let categories = service.categories().await?;
    render(&JobFormView::new_job(JobForm::for_new(), FieldErrors::new(), &categories))
}

async fn create_job(
    req: HttpRequest,
    service: Data<JobService>,
    upload: Result<MultipartForm<JobUpload>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    require_post(&req)?;

    let upload = read_upload(upload)?;
    let form = JobForm::from_upload(&upload);
    match service.create(&form, upload.logo.as_ref(), Utc::now()).await? {
        Submission::Saved(job) => Ok(redirect(&job.owner_path())),
        Submission::Invalid(errors) => {
            let categories = service.categories().await?;
            render(&JobFormView::new_job(form, errors, &categories))
        }
    }
}

/// Display a job and record it in the visitor's history
async fn show(
    service: &JobService,
    session: &Session,
    job: JobRow,
    owner: bool,
) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    let mut context = UserContext::load(session)?;
    context.add_job_to_history(job.id);
    let flash = context.take_flash();
    context.store(session)?;

    let history = service.history(context.job_history()).await?;
    let mut view = JobShowView::new(job, flash, HistoryLink::from_jobs(&history, now));
    if owner {
        let can_extend = service.can_extend(&view.job, now);
        view = view.with_owner_bar(context.csrf_token(), can_extend, service.settings().active_days, now);
    }

    render(&view)
}

/// Public page; the slug segments are cosmetic and only the id resolves the job
#[get("/job/{company}/{location}/{id}/{position}")]
async fn show_public_job(
    service: Data<JobService>,
    session: Session,
    path: Path<(String, String, i32, String)>,
) -> Result<HttpResponse, AppError> {
    let (_, _, id, _) = path.into_inner();
    let job = service.find_public(id, Utc::now()).await?;
    debug!("Showing public job id={}", job.id);
    show(&service, &session, job, false).await
}

#[get("/job/{token}")]
async fn show_job(service: Data<JobService>, session: Session, token: Path<String>) -> Result<HttpResponse, AppError> {
    let job = service.find_by_token(&token).await?;
    show(&service, &session, job, true).await
}

#[get("/job/{token}/edit")]
async fn edit_job(service: Data<JobService>, token: Path<String>) -> Result<HttpResponse, AppError> {
    let job = service.find_by_token(&token).await?;
    let categories = service.categories().await?;
    let form = JobForm::from_job(&job);
    render(&JobFormView::edit_job(&job, form, FieldErrors::new(), &categories))
}

async fn update_job(
    req: HttpRequest,
    service: Data<JobService>,
    token: Path<String>,
    upload: Result<MultipartForm<JobUpload>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    require_post(&req)?;
    let job = service.find_by_token(&token).await?;

    let upload = read_upload(upload)?;
    let form = JobForm::from_upload(&upload);
    match service.update(&job, &form, upload.logo.as_ref(), Utc::now()).await? {
        Submission::Saved(updated) => Ok(redirect(&updated.owner_path())),
        Submission::Invalid(errors) => {
            let categories = service.categories().await?;
            render(&JobFormView::edit_job(&job, form, errors, &categories))
        }
    }
}

#[post("/job/{token}/delete")]
async fn delete_job(
    service: Data<JobService>,
    session: Session,
    token: Path<String>,
    form: Option<web::Form<CsrfForm>>,
) -> Result<HttpResponse, AppError> {
    UserContext::load(&session)?.check_csrf(submitted_token(&form))?;

    let job = service.find_by_token(&token).await?;
    service.delete(&job).await?;
    Ok(redirect("/"))
}

#[post("/job/{token}/publish")]
async fn publish_job(
    service: Data<JobService>,
    session: Session,
    token: Path<String>,
    form: Option<web::Form<CsrfForm>>,
) -> Result<HttpResponse, AppError> {
    let mut context = UserContext::load(&session)?;
    context.check_csrf(submitted_token(&form))?;

    let job = service.find_by_token(&token).await?;
    let job = service.publish(&job, Utc::now()).await?;

    context.set_flash(format!(
        "Your job is now online for {} days.",
        service.settings().active_days
    ));
    context.store(&session)?;

    info!("Job {} published by its owner", job.id);
    Ok(redirect(&job.public_path()))
}

#[post("/job/{token}/extend")]
async fn extend_job(
    service: Data<JobService>,
    session: Session,
    token: Path<String>,
    form: Option<web::Form<CsrfForm>>,
) -> Result<HttpResponse, AppError> {
    let mut context = UserContext::load(&session)?;
    context.check_csrf(submitted_token(&form))?;

    let job = service.find_by_token(&token).await?;
    let job = service.extend(&job, Utc::now()).await?;

    context.set_flash(format!(
        "Your job validity has been extended until {}.",
        job.expires_at.format("%m/%d/%Y")
    ));
    context.store(&session)?;

    Ok(redirect(&job.public_path()))
}

/// Registration order matters: literal paths are matched before `/job/{token}`
pub fn job_config(config: &mut ServiceConfig) {
    config
        .service(index)
        .service(new_job)
        .service(web::resource("/job/create").to(create_job))
        .service(show_public_job)
        .service(show_job)
        .service(edit_job)
        .service(web::resource("/job/{token}/update").to(update_job))
        .service(delete_job)
        .service(publish_job)
        .service(extend_job);
}
