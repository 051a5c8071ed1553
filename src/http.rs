//! HTTP client construction and request decoration.

use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use tracing::{trace, Level};

use crate::client::ClientError;
use crate::options::{HttpTransport, TransportOptions};

/// Build a configured HTTP client from transport options.
///
/// This applies common configuration like timeouts and proxies.
///
/// # Example
/// ```ignore
/// let client = build_http_client(&transport_options)?;
/// ```
pub fn build_http_client(
    transport_options: &TransportOptions<HttpTransport>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.provider.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }

    builder.build()
}

/// Add extra headers to a request if specified in transport options.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

/// Apply everything every backend request carries: JSON content type,
/// session cookie and extra headers.
pub fn decorate_request(request: RequestBuilder, transport: &HttpTransport) -> RequestBuilder {
    let mut request = request.header(CONTENT_TYPE, "application/json");

    if let Some(cookie) = &transport.cookie {
        request = request.header(COOKIE, cookie.expose_secret());
    }

    add_extra_headers(request, &transport.extra_headers)
}

/// JSON request bodies, traced at `TRACE` level.
pub trait RequestLogExt {
    fn json_logged<T: Serialize + ?Sized>(self, body: &T) -> Self;
}

impl RequestLogExt for RequestBuilder {
    fn json_logged<T: Serialize + ?Sized>(self, body: &T) -> Self {
        if tracing::enabled!(Level::TRACE) {
            if let Ok(json) = serde_json::to_string(body) {
                trace!(body = %json, "request body");
            }
        }
        self.json(body)
    }
}

/// Response bodies, traced at `TRACE` level.
pub trait ResponseLogExt {
    fn text_logged(self) -> impl Future<Output = Result<String, ClientError>> + Send;

    fn json_logged<T: DeserializeOwned>(self) -> impl Future<Output = Result<T, ClientError>> + Send;
}

impl ResponseLogExt for Response {
    async fn text_logged(self) -> Result<String, ClientError> {
        let status = self.status();
        let body = self.text().await?;
        trace!(%status, body = %body, "response body");
        Ok(body)
    }

    async fn json_logged<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let body = self.text_logged().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
