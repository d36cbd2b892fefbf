//! REST client for the hosted document store.
//!
//! Collections live under `{base}/collections/{name}` and singleton documents
//! under `{base}/documents/{path}`. Listeners connect over WebSocket to
//! `{base}/listen/{name}` and receive one JSON array snapshot per text frame.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{Fields, RawDocument, RemoteStore, Snapshots, StoreError};

#[derive(Debug, Clone)]
pub struct HttpStore {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/collections/{}",
            self.base_url,
            urlencoding::encode(collection)
        )
    }

    fn entry_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(collection),
            urlencoding::encode(id)
        )
    }

    /// Document paths keep their `/` separators; each segment is encoded.
    fn document_url(&self, path: &str) -> String {
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/documents/{}", self.base_url, segments.join("/"))
    }

    /// Builds the WebSocket listener URL for a collection.
    fn listen_url(&self, collection: &str) -> String {
        // Convert http(s) to ws(s) if needed
        let base_url = if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if !self.base_url.starts_with("ws://") && !self.base_url.starts_with("wss://") {
            format!("ws://{}", self.base_url)
        } else {
            self.base_url.clone()
        };

        let url = format!("{}/listen/{}", base_url, urlencoding::encode(collection));
        match &self.api_key {
            Some(key) => format!("{}?key={}", url, urlencoding::encode(key)),
            None => url,
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, url: &str) -> Result<Response, StoreError> {
        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(StoreError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError> {
        let url = self.collection_url(collection);
        let response = self.send(self.request(Method::GET, &url), &url).await?;
        Ok(response.json().await?)
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<RawDocument, StoreError> {
        let url = self.collection_url(collection);
        let builder = self.request(Method::POST, &url).json(&fields);
        let response = self.send(builder, &url).await?;
        Ok(response.json().await?)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let url = self.entry_url(collection, id);
        let response = self
            .request(Method::PATCH, &url)
            .json(&fields)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(StoreError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.entry_url(collection, id);
        self.send(self.request(Method::DELETE, &url), &url).await?;
        Ok(())
    }

    async fn subscribe(&self, collection: &str) -> Result<Snapshots, StoreError> {
        let url = self.listen_url(collection);
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| StoreError::Listener(e.to_string()))?;

        tracing::debug!("Listening to {} at {}", collection, self.base_url);

        let snapshots = ws_stream.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(
                    serde_json::from_str::<Vec<RawDocument>>(text.as_str()).map_err(StoreError::from),
                ),
                Ok(Message::Binary(data)) => Some(
                    serde_json::from_slice::<Vec<RawDocument>>(&data).map_err(StoreError::from),
                ),
                // Pings, pongs and close frames carry no snapshot
                Ok(_) => None,
                Err(e) => Some(Err(StoreError::Listener(e.to_string()))),
            }
        });

        Ok(snapshots.boxed())
    }

    async fn get_document(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let url = self.document_url(path);
        let response = self.request(Method::GET, &url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(Some(response.json().await?))
    }

    async fn set_document(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let url = self.document_url(path);
        let builder = self.request(Method::PUT, &url).json(&value);
        self.send(builder, &url).await?;
        Ok(())
    }
}
