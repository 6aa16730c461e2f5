use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};

use crate::error::AppError;
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "form.html")]
struct ContactFormTemplate<'a> {
    action: &'a str,
    failure_url: &'a str,
    site_key: &'a str,
    bypass_first_name: Option<&'a str>,
    bypass_last_name: Option<&'a str>,
}

pub async fn contact_form(State(state): State<SharedState>) -> Result<Response, AppError> {
    let config = &state.config;
    let template = ContactFormTemplate {
        action: &config.form.action,
        failure_url: &config.form.failure_url,
        site_key: &config.turnstile.site_key,
        bypass_first_name: config.bypass.as_ref().map(|p| p.first_name.as_str()),
        bypass_last_name: config.bypass.as_ref().map(|p| p.last_name.as_str()),
    };

    let html = template
        .render()
        .map_err(|e| AppError::Internal(format!("Failed to render form: {e}")))?;
    Ok(Html(html).into_response())
}
