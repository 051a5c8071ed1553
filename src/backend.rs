//! HTTP implementation of [`ChatBackend`].

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::client::{ByteStream, ChatBackend, ClientError};
use crate::history::Conversation;
use crate::http::{build_http_client, decorate_request, RequestLogExt, ResponseLogExt};
use crate::model::StreamRequest;
use crate::options::{HttpTransport, TransportOptions};

/// Reply of the JSON (non-streaming) endpoints.
#[derive(Debug, Default, Deserialize)]
struct ApiReply {
    #[serde(default)]
    success: bool,

    #[serde(default)]
    error: Option<String>,

    #[serde(default)]
    history: Option<Vec<Conversation>>,
}

/// Talks to the travel backend over reqwest.
///
/// # Example
/// ```no_run
/// use travel_chat::backend::HttpBackend;
/// use travel_chat::options::{HttpTransport, TransportOptions};
///
/// let backend = HttpBackend::new(TransportOptions::new(
///     HttpTransport::default()
///         .with_base_url("http://localhost:5000".to_string())
///         .with_cookie("session=..."),
/// ))?;
/// # Ok::<(), travel_chat::ClientError>(())
/// ```
pub struct HttpBackend {
    http: Client,
    transport: TransportOptions<HttpTransport>,
}

impl HttpBackend {
    pub fn new(transport: TransportOptions<HttpTransport>) -> Result<Self, ClientError> {
        let http = build_http_client(&transport)?;
        Ok(Self { http, transport })
    }

    pub fn base_url(&self) -> &str {
        self.transport.provider.base_url()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> RequestBuilder {
        decorate_request(self.http.post(self.url(path)), &self.transport.provider).json_logged(body)
    }

    fn handle_error_response(status: StatusCode, body: &str) -> ClientError {
        let message = match serde_json::from_str::<ApiReply>(body) {
            Ok(ApiReply {
                error: Some(error), ..
            }) => error,
            _ if body.trim().is_empty() => status.canonical_reason().unwrap_or("").to_string(),
            _ => body.to_string(),
        };
        ClientError::Status {
            status: status.as_u16(),
            message,
        }
    }

    async fn send<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response, ClientError> {
        let response = self.post(path, body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text_logged().await.unwrap_or_default();
            return Err(Self::handle_error_response(status, &body));
        }
        Ok(response)
    }

    /// POST to a JSON endpoint; an `error` field in the reply is an error.
    async fn call<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiReply, ClientError> {
        let reply: ApiReply = self.send(path, body).await?.json_logged().await?;
        match reply.error {
            Some(error) => Err(ClientError::Server(error)),
            None => Ok(reply),
        }
    }

    /// Like [`Self::call`], for endpoints that acknowledge with `success`.
    async fn call_acknowledged<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), ClientError> {
        let reply = self.call(path, body).await?;
        if !reply.success {
            return Err(ClientError::Server(format!("{path} was not acknowledged")));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, ClientError> {
        let path = request.path();
        let response = self.send(path, request).await?;
        debug!(path, status = %response.status(), "stream opened");

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from))
            .boxed())
    }

    async fn load_history(&self, email: &str) -> Result<Vec<Conversation>, ClientError> {
        let reply = self.call("/load_history", &json!({ "email": email })).await?;
        let history = reply.history.unwrap_or_default();
        debug!(conversations = history.len(), "history loaded");
        Ok(history)
    }

    async fn clear_history(&self, email: &str) -> Result<(), ClientError> {
        self.call_acknowledged("/clear_history", &json!({ "email": email }))
            .await?;
        info!("history cleared");
        Ok(())
    }

    async fn delete_conversation(&self, email: &str, conversation_id: &str) -> Result<(), ClientError> {
        self.call_acknowledged(
            "/delete_conversation",
            &json!({ "email": email, "conversation_id": conversation_id }),
        )
        .await?;
        info!(conversation_id, "conversation deleted");
        Ok(())
    }

    async fn new_conversation(&self) -> Result<(), ClientError> {
        self.call_acknowledged("/new_conversation", &json!({})).await?;
        info!("new conversation started");
        Ok(())
    }
}
