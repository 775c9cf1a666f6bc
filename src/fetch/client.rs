use async_trait::async_trait;
use reqwest::{Request, Response};

/// Seam for the HTTP transport so callers can swap in an authenticated or
/// instrumented client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
