use crate::{
    backend::CheatSheetBackend,
    client_utils,
    errors::GenerationResult,
    opentelemetry::GenerationSpan,
    types::{GenerateRequest, GenerateResponse},
};
use reqwest::{
    header::{self, HeaderValue},
    Client,
};
use std::{env, time::Duration};

const PROVIDER: &str = "http";
const DEFAULT_BASE_URL: &str = "http://localhost:3001";
const GENERATE_PATH: &str = "/api/generate-cheatsheet";

pub const ENV_API_URL: &str = "CHEATSHEET_API_URL";
pub const ENV_API_TIMEOUT_SECS: &str = "CHEATSHEET_API_TIMEOUT_SECS";

#[derive(Debug, Clone, Default)]
pub struct HttpBackendOptions {
    /// Defaults to `http://localhost:3001`.
    pub base_url: Option<String>,
    /// Overall request timeout. No timeout when unset.
    pub timeout: Option<Duration>,
}

impl HttpBackendOptions {
    /// Read `CHEATSHEET_API_URL` and `CHEATSHEET_API_TIMEOUT_SECS`.
    /// Unset or unparsable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env::var(ENV_API_URL).ok().filter(|url| !url.trim().is_empty()),
            timeout: env::var(ENV_API_TIMEOUT_SECS)
                .ok()
                .and_then(|secs| secs.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        }
    }
}

/// Talks to the cheat sheet generation service over HTTP.
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(options: HttpBackendOptions) -> GenerationResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: options
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: builder.build()?,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}{GENERATE_PATH}", self.base_url)
    }
}

#[async_trait::async_trait]
impl CheatSheetBackend for HttpBackend {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn generate(&self, request: GenerateRequest) -> GenerationResult<GenerateResponse> {
        let mut span = GenerationSpan::new(PROVIDER, &request.topic);
        let url = self.endpoint();

        let result = span
            .instrument_future(client_utils::send_json::<_, GenerateResponse>(
                &self.client,
                &url,
                &request,
                header::HeaderMap::new(),
            ))
            .await;

        match &result {
            Ok(response) => span.on_response(response),
            Err(error) => span.on_error(error),
        }
        span.on_end();

        result
    }
}
