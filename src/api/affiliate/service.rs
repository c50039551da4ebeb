use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use validator::Validate;

use crate::api::error::AppError;
use crate::api::validation::{FieldErrors, Submission};
use crate::db::EntityStore;
use crate::db::models::{AffiliateRow, CategoryRow, NewAffiliate};
use crate::db::store::{AffiliateStore, CategoryStore};
use crate::token::owner_token;
use super::models::AffiliateForm;

/// Affiliate sign-up and approval
pub struct AffiliateService {
    store: Arc<dyn EntityStore>,
}

impl AffiliateService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Every affiliate, newest first, whatever its approval state
    pub async fn list(&self) -> Result<Vec<AffiliateRow>, AppError> {
        Ok(self.store.all_affiliates().await?)
    }

    pub async fn categories(&self) -> Result<Vec<CategoryRow>, AppError> {
        Ok(self.store.all_categories().await?)
    }

    /// Validate and register a new affiliate, inactive until approved
    pub async fn create(&self, form: &AffiliateForm, now: DateTime<Utc>) -> Result<Submission<AffiliateRow>, AppError> {
        let mut errors = match form.validate() {
            Ok(()) => FieldErrors::new(),
            Err(validation_errors) => FieldErrors::from(validation_errors),
        };

        let categories = self.store.all_categories().await?;
        let mut category_ids = Vec::with_capacity(form.category_ids.len());
        for raw in &form.category_ids {
            match raw.parse::<i32>().ok().filter(|id| categories.iter().any(|c| c.id == *id)) {
                Some(id) if !category_ids.contains(&id) => category_ids.push(id),
                Some(_) => {}
                None => errors.add("category_ids", "Invalid."),
            }
        }
        if form.category_ids.is_empty() {
            errors.add("category_ids", "Select at least one category.");
        }

        if let Some(email) = &form.email {
            if !errors.has("email") && self.store.find_affiliate_by_email(email).await?.is_some() {
                errors.add("email", "An affiliate with this email already exists.");
            }
        }

        let (Some(url), Some(email)) = (&form.url, &form.email) else {
            return Ok(Submission::Invalid(errors));
        };
        if !errors.is_empty() {
            warn!("Service: Affiliate form rejected: {:?}", errors);
            return Ok(Submission::Invalid(errors));
        }

        let affiliate = self
            .store
            .insert_affiliate(&NewAffiliate {
                url: url.clone(),
                email: email.clone(),
                token: owner_token(email),
                category_ids,
                created_at: now,
            })
            .await?;

        info!("Service: Affiliate registered with id={}, awaiting approval", affiliate.id);
        Ok(Submission::Saved(affiliate))
    }

    /// Approve an affiliate so its token opens the feed
    pub async fn activate(&self, id: i32) -> Result<AffiliateRow, AppError> {
        let affiliate = self
            .store
            .activate_affiliate(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Affiliate with id {} not found", id)))?;

        info!("Service: Affiliate {} activated", affiliate.id);
        Ok(affiliate)
    }
}
