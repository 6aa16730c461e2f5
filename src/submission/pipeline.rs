use std::net::IpAddr;

use crate::captcha::CaptchaStatus;
use crate::error::AppError;
use crate::state::SharedState;

use super::fields::{self, Submission};
use super::parser::FormData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Regular `/submit`: a failed CAPTCHA sends the visitor to the intermediate page.
    Normal,
    /// `/submitAnyway`: record the submission even if the CAPTCHA failed.
    Force,
}

#[derive(Debug)]
pub enum Outcome {
    /// Record written; continue to the success page.
    Recorded {
        record_id: String,
        status: CaptchaStatus,
        redirect_url: String,
    },
    /// CAPTCHA failed and nothing was written; ask the visitor to confirm.
    Unverified { redirect_url: String },
}

pub async fn run(
    state: &SharedState,
    form: FormData,
    client_ip: IpAddr,
    mode: Mode,
) -> Result<Outcome, AppError> {
    let submission = Submission::from_form(&form).map_err(AppError::BadRequest)?;
    tracing::info!("Processing submission with fields {:?}", form.keys());

    let status = captcha_status(state, &submission, client_ip).await?;
    let query = fields::echo_query(&form, status);
    let redirects = &state.config.redirects;

    if status == CaptchaStatus::Failed && mode == Mode::Normal {
        tracing::info!("CAPTCHA failed, redirecting to intermediate page");
        return Ok(Outcome::Unverified {
            redirect_url: fields::with_query(&redirects.intermediate_url, &query),
        });
    }

    let record = submission.to_record(status);
    let record_id = state.store.create(&record).await?;
    tracing::debug!("Record written to {} (mode={mode:?})", state.store.name());

    Ok(Outcome::Recorded {
        record_id,
        status,
        redirect_url: fields::with_query(&redirects.success_url, &query),
    })
}

async fn captcha_status(
    state: &SharedState,
    submission: &Submission,
    client_ip: IpAddr,
) -> Result<CaptchaStatus, AppError> {
    if state
        .config
        .bypass
        .as_ref()
        .is_some_and(|pair| pair.matches(&submission.first_name, &submission.last_name))
    {
        tracing::info!("Bypass name pair matched, skipping CAPTCHA verification");
        return Ok(CaptchaStatus::Skipped);
    }

    let Some(token) = submission.captcha_token.as_deref() else {
        tracing::info!("Missing CAPTCHA token");
        return Ok(CaptchaStatus::Failed);
    };

    let passed = state.verifier.verify(token, client_ip).await?;
    tracing::info!(
        "CAPTCHA verdict from {}: {}",
        state.verifier.name(),
        if passed { "passed" } else { "failed" }
    );
    Ok(if passed {
        CaptchaStatus::Passed
    } else {
        CaptchaStatus::Failed
    })
}
