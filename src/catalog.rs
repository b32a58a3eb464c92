// ABOUTME: Paged organization and space listing against the platform API.
// ABOUTME: Merges both listings into org-name-annotated deployment targets.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use thiserror::Error;

use crate::session::TokenPair;
use crate::types::Target;

const ORGANIZATIONS_PATH: &str = "/v2/organizations";
const SPACES_PATH: &str = "/v2/spaces";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default)]
    next_url: Option<String>,
    resources: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct Org {
    pub metadata: Metadata,
    pub entity: OrgEntity,
}

#[derive(Debug, Deserialize)]
pub struct OrgEntity {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Space {
    pub metadata: Metadata,
    pub entity: SpaceEntity,
}

#[derive(Debug, Deserialize)]
pub struct SpaceEntity {
    pub name: String,
    pub organization_guid: String,
}

#[derive(Debug, Deserialize)]
pub struct Metadata {
    pub guid: String,
}

/// Read-only listing client used to populate target selection.
pub struct CatalogClient {
    http: reqwest::Client,
    api_url: String,
}

impl CatalogClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
        }
    }

    pub async fn organizations(&self, token: &TokenPair) -> Result<Vec<Org>, CatalogError> {
        self.fetch_pages(token, ORGANIZATIONS_PATH).await
    }

    pub async fn spaces(&self, token: &TokenPair) -> Result<Vec<Space>, CatalogError> {
        self.fetch_pages(token, SPACES_PATH).await
    }

    /// All spaces visible to the token, each annotated with its owning
    /// organization's name. Spaces whose org is not visible keep an empty
    /// org name rather than being dropped.
    pub async fn targets(&self, token: &TokenPair) -> Result<Vec<Target>, CatalogError> {
        let orgs = self.organizations(token).await?;
        let spaces = self.spaces(token).await?;

        let org_names: HashMap<String, String> = orgs
            .into_iter()
            .map(|org| (org.metadata.guid, org.entity.name))
            .collect();

        Ok(spaces
            .into_iter()
            .map(|space| Target {
                org_name: org_names
                    .get(&space.entity.organization_guid)
                    .cloned()
                    .unwrap_or_default(),
                org_guid: space.entity.organization_guid,
                space_guid: space.metadata.guid,
                space_name: space.entity.name,
            })
            .collect())
    }

    async fn fetch_pages<T: DeserializeOwned>(
        &self,
        token: &TokenPair,
        first_path: &str,
    ) -> Result<Vec<T>, CatalogError> {
        let mut resources = Vec::new();
        let mut path = first_path.to_string();

        loop {
            let page: Page<T> = self
                .http
                .get(format!("{}{}", self.api_url, path))
                .bearer_auth(&token.access_token)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            resources.extend(page.resources);

            match page.next_url {
                Some(next) if !next.is_empty() => path = next,
                _ => break,
            }
        }

        Ok(resources)
    }
}
