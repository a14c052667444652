use crate::error::{Result, UpdaterError};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("wow-addon-updater/", env!("CARGO_PKG_VERSION"));

/// Addon archives can be large, so the limit covers a full download.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(UpdaterError::Http)
}

/// Accepts exactly the 2xx range.
pub fn check_status(url: &str, status: StatusCode) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(UpdaterError::HttpStatus {
        url: url.to_string(),
        status: status.as_u16(),
    })
}

/// Issues a GET and fails on transport errors and non-2xx statuses.
pub fn get(client: &Client, url: &str) -> Result<Response> {
    debug!("Fetching: {}", url);
    let response = client.get(url).send()?;
    debug!("HTTP {}: {}", response.status(), url);
    check_status(url, response.status())?;
    Ok(response)
}

/// Fetches the body of an HTML page.
pub fn get_page(client: &Client, url: &str) -> Result<String> {
    Ok(get(client, url)?.text()?)
}
