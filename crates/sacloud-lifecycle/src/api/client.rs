//! HTTP implementation of `ResourceGateway`

use super::error::classify_response;
use super::types::{SearchQuery, decode_resource, decode_search};
use crate::config::ApiConfig;
use crate::error::ConfigError;
use reqwest::{Client, Method, Url};
use sacloud_lifecycle_common::{
    GatewayError, Resource, ResourceGateway, ResourceId, ResourceKind, SearchResult,
};
use tracing::debug;

/// Control-plane client authenticating with an access token pair
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    access_token: String,
    access_token_secret: String,
}

impl HttpGateway {
    /// Build a client for the configured zone; fails without credentials
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (token, secret) = config.credentials().ok_or(ConfigError::MissingCredentials)?;

        let client = Client::builder()
            .timeout(config.http_timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            access_token: token.to_string(),
            access_token_secret: secret.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, query: Option<&str>) -> Result<Url, GatewayError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| GatewayError::transport(format!("invalid URL for {path}"), e))?;
        if let Some(query) = query {
            url.query_pairs_mut().append_key_only(query);
        }
        Ok(url)
    }

    /// Send a request and return the body of a successful response
    async fn request(
        &self,
        method: Method,
        url: Url,
        target: Option<(ResourceKind, ResourceId)>,
    ) -> Result<String, GatewayError> {
        let label = format!("{method} {}", url.path());
        debug!(request = %label, "Sending API request");

        let response = self
            .client
            .request(method, url)
            .basic_auth(&self.access_token, Some(&self.access_token_secret))
            .send()
            .await
            .map_err(|e| GatewayError::transport(label.clone(), e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::transport(format!("{label}: reading body"), e))?;

        if !status.is_success() {
            debug!(request = %label, status = status.as_u16(), "API request failed");
            return Err(classify_response(status.as_u16(), &body, target));
        }
        Ok(body)
    }
}

impl ResourceGateway for HttpGateway {
    async fn read_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> Result<Resource, GatewayError> {
        let url = self.url(&format!("{}/{id}", kind.collection()), None)?;
        let body = self.request(Method::GET, url, Some((kind, id))).await?;
        decode_resource(kind, &body).map_err(GatewayError::Decode)
    }

    async fn search_by_name_prefix(
        &self,
        kind: ResourceKind,
        token: &str,
        limit: usize,
    ) -> Result<SearchResult, GatewayError> {
        let query = serde_json::to_string(&SearchQuery::by_name(token, limit))
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        let url = self.url(kind.collection(), Some(&query))?;
        let body = self.request(Method::GET, url, None).await?;
        decode_search(kind, &body).map_err(GatewayError::Decode)
    }

    async fn attach_reference(
        &self,
        target: ResourceId,
        reference: ResourceId,
    ) -> Result<(), GatewayError> {
        let path = format!(
            "{}/{target}/to/{}/{reference}",
            ResourceKind::Interface.collection(),
            ResourceKind::PacketFilter.collection()
        );
        let url = self.url(&path, None)?;
        self.request(Method::PUT, url, Some((ResourceKind::Interface, target)))
            .await?;
        Ok(())
    }
}
