//! Transport for pulling journey snapshots from the journey-data service.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, bail};

/// GETs `url` and returns the response body.
///
/// Non-success statuses are an error so a half-rendered error page never
/// reaches the journey parser.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let mut req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);
    req.headers_mut().insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("journey fetch from {} failed with status {}", url, status);
    }

    Ok(resp.bytes().await?.to_vec())
}

/// Loads a journey snapshot from a local file path or an http(s) URL.
#[tracing::instrument(skip(client))]
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(client, source).await
    } else {
        Ok(tokio::fs::read(source).await?)
    }
}
