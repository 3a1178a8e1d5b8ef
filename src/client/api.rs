use reqwest::Client;
use std::time::Duration;

use crate::{
    error::Result,
    models::{AttackModePayload, AttackModeReply, StatusReport},
};

const API_TIMEOUT: Duration = Duration::from_secs(2);

fn client() -> Result<Client> {
    Ok(Client::builder().timeout(API_TIMEOUT).build()?)
}

/// `GET {base}/api/status`.
pub async fn fetch_status(base: &str) -> Result<StatusReport> {
    let report = client()?
        .get(format!("{}/api/status", base.trim_end_matches('/')))
        .send()
        .await?
        .error_for_status()?
        .json::<StatusReport>()
        .await?;
    Ok(report)
}

/// `POST {base}/api/attack-mode`; returns the mode the server reports.
pub async fn set_remote_attack_mode(base: &str, enabled: bool) -> Result<bool> {
    let reply = client()?
        .post(format!("{}/api/attack-mode", base.trim_end_matches('/')))
        .json(&AttackModePayload { enabled })
        .send()
        .await?
        .error_for_status()?
        .json::<AttackModeReply>()
        .await?;
    Ok(reply.attack_mode)
}
