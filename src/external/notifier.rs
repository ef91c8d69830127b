use serde::{Deserialize, Serialize};
use std::env;

use crate::error::Error;

#[derive(Clone, Debug, Serialize)]
struct EmailMessage<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

#[derive(Clone, Debug, Deserialize)]
struct Response {
    status: String,
}

/// Hands an email to the notification gateway. Callers treat delivery as
/// best-effort; a failure here must never fail the operation that sent it.
#[tracing::instrument(skip(body))]
pub async fn send_email(to: &str, subject: &str, body: &str) -> Result<(), Error> {
    let api_base = env::var("NOTIFIER_API_BASE")?;
    let url = format!("https://{}/messages/email", api_base);
    let key = env::var("NOTIFIER_API_KEY")?;

    let res = reqwest::Client::new()
        .post(url)
        .bearer_auth(key)
        .json(&EmailMessage { to, subject, body })
        .send()
        .await?;

    let status_code = res.status().as_u16();

    if status_code != 200 && status_code != 202 {
        return Err(Error::Upstream(format!(
            "notification gateway returned status {}",
            status_code
        )));
    }

    let data: Response = res.json().await?;

    if data.status != "queued" && data.status != "sent" {
        return Err(Error::Upstream(format!(
            "notification gateway rejected message: {}",
            data.status
        )));
    }

    Ok(())
}
