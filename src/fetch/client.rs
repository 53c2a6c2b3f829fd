use async_trait::async_trait;
use reqwest::{Request, Response};

/// Request execution seam. The downloader only needs this much of an HTTP
/// client, which keeps the worker pool testable against a mock server.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
