use askama::Template;

use crate::api::validation::FieldErrors;
use crate::api::views::Choice;
use crate::db::models::{AffiliateRow, CategoryRow};
use super::models::AffiliateForm;

pub struct AffiliateLine {
    pub url: String,
    pub email: String,
    pub is_active: bool,
    pub created_on: String,
    pub categories: String,
}

#[derive(Template)]
#[template(path = "affiliate/index.html")]
pub struct AffiliateIndexView {
    pub affiliates: Vec<AffiliateLine>,
}

impl AffiliateIndexView {
    pub fn new(affiliates: &[AffiliateRow], categories: &[CategoryRow]) -> Self {
        let affiliates = affiliates
            .iter()
            .map(|affiliate| AffiliateLine {
                url: affiliate.url.clone(),
                email: affiliate.email.clone(),
                is_active: affiliate.is_active,
                created_on: affiliate.created_at.format("%m/%d/%Y").to_string(),
                categories: categories
                    .iter()
                    .filter(|c| affiliate.category_ids.contains(&c.id))
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
            .collect();

        Self { affiliates }
    }
}

#[derive(Template)]
#[template(path = "affiliate/form.html")]
pub struct AffiliateFormView {
    pub url: String,
    pub email: String,
    pub categories: Vec<Choice>,
    pub errors: FieldErrors,
}

impl AffiliateFormView {
    pub fn new(form: &AffiliateForm, errors: FieldErrors, categories: &[CategoryRow]) -> Self {
        Self {
            url: form.url.clone().unwrap_or_default(),
            email: form.email.clone().unwrap_or_default(),
            categories: categories
                .iter()
                .map(|c| Choice {
                    value: c.id.to_string(),
                    label: c.name.clone(),
                    selected: form.is_checked(c.id),
                })
                .collect(),
            errors,
        }
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.has(field)
    }

    pub fn error(&self, field: &str) -> String {
        self.errors.joined(field)
    }
}

#[derive(Template)]
#[template(path = "affiliate/wait.html")]
pub struct AffiliateWaitView;
