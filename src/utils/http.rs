// src/utils/http.rs

//! Retrying HTTP transport.
//!
//! Connection failures, timeouts and 4xx/5xx answers are retried up to the
//! configured attempt ceiling. A 3xx answer fails immediately: during this
//! protocol a redirect means a bad URL or a lost session.

use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode, header, redirect};

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Form keys whose values never reach the log.
const SECRET_KEYS: [&str; 3] = ["password", "pass", "pasw"];

/// Optional parts of a single request.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestOptions<'a> {
    /// URL-encoded form body
    pub form: Option<&'a [(String, String)]>,
    /// Raw `Cookie` header value
    pub cookie: Option<&'a str>,
    /// Follow redirects instead of failing on them
    pub follow_redirects: bool,
}

/// Auto-retrying HTTP client.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    redirecting: Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl Transport {
    /// Create a transport from crawler settings.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()?;
        let redirecting = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(timeout)
            .redirect(redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            redirecting,
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Attempt ceiling for one request.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Send a request, retrying transient failures.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions<'_>,
    ) -> Result<Response> {
        log::debug!(
            "{} {} {}",
            method,
            url,
            options.form.map(redact).unwrap_or_default()
        );

        let client = if options.follow_redirects {
            &self.redirecting
        } else {
            &self.client
        };

        for attempt in 1..=self.max_attempts {
            if attempt > 1 && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay * (attempt - 1)).await;
            }

            let mut builder = client.request(method.clone(), url);
            if let Some(form) = options.form {
                builder = builder.form(form);
            }
            if let Some(cookie) = options.cookie {
                builder = builder.header(header::COOKIE, cookie);
            }

            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) if is_transient(&e) => {
                    log::debug!("Attempt {attempt}/{} for {url} failed: {e}", self.max_attempts);
                    continue;
                }
                Err(e) => return Err(AppError::Http(e)),
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            if status.is_redirection() {
                return Err(AppError::Redirect {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            if is_retryable_status(status) {
                log::debug!(
                    "Attempt {attempt}/{} for {url} answered {status}",
                    self.max_attempts
                );
                continue;
            }
            return Err(AppError::malformed(format!("unexpected status {status} from {url}")));
        }

        log::warn!("Max retries exceeded with url: {url}");
        Err(AppError::TransportExhausted {
            url: url.to_string(),
            attempts: self.max_attempts,
        })
    }

    /// GET a URL and return the body text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.request(Method::GET, url, RequestOptions::default()).await?;
        Ok(response.text().await?)
    }

    /// GET a URL, following redirects, and return the body bytes.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let options = RequestOptions {
            follow_redirects: true,
            ..RequestOptions::default()
        };
        let response = self.request(Method::GET, url, options).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// POST a form and return the response.
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        cookie: Option<&str>,
    ) -> Result<Response> {
        let options = RequestOptions {
            form: Some(form),
            cookie,
            follow_redirects: false,
        };
        self.request(Method::POST, url, options).await
    }
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request() || error.is_body()
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

/// Render form pairs for logging with secret values masked.
pub fn redact(form: &[(String, String)]) -> String {
    let pairs: Vec<String> = form
        .iter()
        .map(|(key, value)| {
            if SECRET_KEYS.contains(&key.as_str()) {
                format!("{key}=********")
            } else {
                format!("{key}={value}")
            }
        })
        .collect();
    pairs.join("&")
}
