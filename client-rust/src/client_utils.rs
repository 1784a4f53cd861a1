use crate::GenerationError;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

/// Create a JSON request, parse the response.
/// Throws error on any non-2xx status code.
pub async fn send_json<T: Serialize, R: DeserializeOwned>(
    client: &Client,
    url: &str,
    data: &T,
    headers: reqwest::header::HeaderMap,
) -> Result<R, GenerationError> {
    let response = client.post(url).headers(headers).json(data).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(GenerationError::StatusCode(
            status,
            response.text().await.unwrap_or_default(),
        ));
    }

    let body = response.bytes().await?;
    serde_json::from_slice::<R>(&body)
        .map_err(|e| GenerationError::InvalidResponse(format!("Failed to parse response: {e}")))
}
