//! Google Cloud Storage over the JSON API
//!
//! Requests are anonymous, so only public buckets can be read.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use super::{ObjectInfo, ObjectPage, ObjectStore};
use crate::error::{ReportError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<ListItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    name: String,
}

#[derive(Debug, Clone)]
pub struct GcsStore {
    client: reqwest::Client,
    api_url: Url,
    bucket: String,
}

impl GcsStore {
    pub fn new(api_url: &str, bucket: &str) -> Result<Self> {
        let api_url = Url::parse(api_url)
            .map_err(|e| ReportError::Config(format!("invalid storage API url {}: {}", api_url, e)))?;
        if api_url.cannot_be_a_base() {
            return Err(ReportError::Config(format!(
                "storage API url cannot be a base: {}",
                api_url
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_url,
            bucket: bucket.to_string(),
        })
    }

    /// `{api}/storage/v1/b/{bucket}/o[/{object}]`, each segment percent-encoded
    fn objects_url(&self, object: Option<&str>) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["storage", "v1", "b", self.bucket.as_str(), "o"]);
            if let Some(name) = object {
                segments.push(name);
            }
        }
        url
    }

    async fn get(&self, url: Url, operation: &str) -> Result<reqwest::Response> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ReportError::unreachable(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::unreachable(
                operation,
                format!("got response status code {}", status.as_u16()),
            ));
        }
        Ok(response)
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn list_page(&self, prefix: &str, page_token: Option<String>) -> Result<ObjectPage> {
        let mut url = self.objects_url(None);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("prefix", prefix);
            if let Some(token) = &page_token {
                query.append_pair("pageToken", token);
            }
        }

        let operation = format!("Bucket({}).Objects", self.bucket);
        let body = self
            .get(url, &operation)
            .await?
            .bytes()
            .await
            .map_err(|e| ReportError::unreachable(&operation, e))?;

        let listing: ListResponse =
            serde_json::from_slice(&body).map_err(|e| ReportError::malformed("object listing", e))?;

        Ok(ObjectPage {
            objects: listing
                .items
                .into_iter()
                .map(|item| ObjectInfo { name: item.name })
                .collect(),
            next_page_token: listing.next_page_token,
        })
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let mut url = self.objects_url(Some(name));
        url.query_pairs_mut().append_pair("alt", "media");

        let operation = format!("Object({}).NewReader", name);
        let body = self
            .get(url, &operation)
            .await?
            .bytes()
            .await
            .map_err(|e| ReportError::unreachable(&operation, e))?;

        Ok(body.to_vec())
    }
}
