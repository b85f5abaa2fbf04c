// src/client.rs
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

use crate::config::RemoteConfig;
use crate::errors::{RelayError, Result};

/// Outbound HTTP client bound to one remote base address.
///
/// Built once at startup and handed to whatever needs to talk to the remote.
#[derive(Clone, Debug)]
pub struct RemoteClient {
    http: Client,
    api_base: String,
}

#[derive(serde::Deserialize)]
struct RejectionBody {
    message: Option<String>,
}

impl RemoteClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = &config.api_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| RelayError::Config(format!("invalid API token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in &config.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| RelayError::Config(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| RelayError::Config(format!("invalid value for header '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        log::debug!("POST {}", url);

        let start = Instant::now();
        let resp = self.http.post(&url).json(body).send().await?;
        log::info!(
            "POST {} -> {} ({}ms)",
            url,
            resp.status(),
            start.elapsed().as_millis()
        );

        decode(resp).await
    }

    pub async fn get_json<Q, T>(&self, path: &str, query: &Q) -> Result<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        log::debug!("GET {}", url);

        let start = Instant::now();
        let resp = self.http.get(&url).query(query).send().await?;
        log::info!(
            "GET {} -> {} ({}ms)",
            url,
            resp.status(),
            start.elapsed().as_millis()
        );

        decode(resp).await
    }
}

/// Non-2xx becomes a rejection carrying the remote's `message`, if it sent one.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();

    if !status.is_success() {
        // The status alone makes this a rejection; the body only supplies the reason.
        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Remote rejected request with status {} (body unreadable: {})", status, e);
                return Err(RelayError::RemoteRejection {
                    status: status.as_u16(),
                    message: None,
                });
            }
        };
        let message = serde_json::from_slice::<RejectionBody>(&body)
            .ok()
            .and_then(|b| b.message);
        log::warn!(
            "Remote rejected request with status {}: {}",
            status,
            String::from_utf8_lossy(&body)
        );
        return Err(RelayError::RemoteRejection {
            status: status.as_u16(),
            message,
        });
    }

    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| RelayError::MalformedBody(e.to_string()))
}
