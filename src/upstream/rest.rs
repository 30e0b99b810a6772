//! HTTP implementations of [`ResourceManager`] and [`AssetInventory`]
//!
//! Talks to Cloud Resource Manager v3 and Cloud Asset v1 with a bearer token.
//! `queryAssets` may answer before the query has finished; unfinished jobs are
//! polled by job reference, and the job reference travels inside the page
//! token handed back to callers.

use super::query::AssetQuery;
use super::{AssetInventory, Page, ResourceManager, UpstreamError, UpstreamResult};
use crate::config::ApiConfig;
use crate::resource::{Folder, LifecycleState, Organization, Project, ResourceName};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

/// Separates the asset job reference from the service's own page token
const JOB_TOKEN_SEPARATOR: char = '|';
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Resolve an access token: configured value first, then the gcloud CLI
pub fn access_token(api: &ApiConfig) -> UpstreamResult<String> {
    if let Some(token) = api.access_token.as_deref().filter(|t| !t.trim().is_empty()) {
        return Ok(token.trim().to_string());
    }

    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .map_err(|e| UpstreamError::Auth(format!("could not run gcloud: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(UpstreamError::Auth(stderr.trim().to_string()));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(UpstreamError::Auth(
            "gcloud printed an empty access token".to_string(),
        ));
    }
    Ok(token)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: DeserializeOwned"))]
struct Listing<T> {
    #[serde(default, alias = "organizations", alias = "folders", alias = "projects")]
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOrganization {
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFolder {
    name: String,
    #[serde(default)]
    display_name: String,
    parent: String,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProject {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    project_id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryAssetsResponse {
    #[serde(default)]
    job_reference: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    query_result: Option<QueryResult>,
    #[serde(default)]
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResult {
    #[serde(default)]
    rows: Vec<Value>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Status,
}

fn state(raw: Option<&str>) -> LifecycleState {
    raw.map(LifecycleState::parse).unwrap_or_default()
}

fn decode_name(raw: &str, endpoint: &str) -> UpstreamResult<ResourceName> {
    ResourceName::parse(raw).map_err(|e| UpstreamError::Decode {
        endpoint: endpoint.to_string(),
        cause: e.to_string(),
    })
}

impl WireOrganization {
    fn into_organization(self, endpoint: &str) -> UpstreamResult<Organization> {
        Ok(Organization {
            name: decode_name(&self.name, endpoint)?,
            display_name: self.display_name,
            lifecycle_state: state(self.state.as_deref()),
        })
    }
}

impl WireFolder {
    fn into_folder(self, endpoint: &str) -> UpstreamResult<Folder> {
        let name = decode_name(&self.name, endpoint)?;
        let display_name = if self.display_name.is_empty() {
            name.id().to_string()
        } else {
            self.display_name
        };
        Ok(Folder {
            name,
            display_name,
            lifecycle_state: state(self.state.as_deref()),
            parent: decode_name(&self.parent, endpoint)?,
        })
    }
}

impl WireProject {
    fn into_project(self, endpoint: &str) -> UpstreamResult<Project> {
        let name = decode_name(&self.name, endpoint)?;
        let parent = match self.parent.as_deref().filter(|p| !p.is_empty()) {
            Some(raw) => Some(decode_name(raw, endpoint)?),
            None => None,
        };
        let display_name = self
            .display_name
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.project_id.clone());
        Ok(Project {
            name,
            project_id: self.project_id,
            project_number: Some(name.id()),
            display_name,
            lifecycle_state: state(self.state.as_deref()),
            parent,
        })
    }
}

fn split_job_token(token: &str) -> (&str, Option<&str>) {
    match token.split_once(JOB_TOKEN_SEPARATOR) {
        Some((job, page)) if !page.is_empty() => (job, Some(page)),
        Some((job, _)) => (job, None),
        None => (token, None),
    }
}

/// Blocking client for both services.
///
/// The access token is acquired on the first request, so a client that is
/// never used (a load served from cache) never shells out to gcloud.
#[derive(Debug, Clone)]
pub struct RestCloud {
    http: Client,
    api: ApiConfig,
    token: OnceLock<String>,
    page_size: u32,
}

impl RestCloud {
    pub fn new(api: &ApiConfig, page_size: u32) -> UpstreamResult<Self> {
        let http = Client::builder()
            .timeout(api.timeout())
            .build()
            .map_err(|e| UpstreamError::Transport {
                endpoint: "client".to_string(),
                cause: e.to_string(),
            })?;
        let mut api = api.clone();
        api.resource_manager_endpoint = api
            .resource_manager_endpoint
            .trim_end_matches('/')
            .to_string();
        api.asset_endpoint = api.asset_endpoint.trim_end_matches('/').to_string();
        api.max_query_polls = api.max_query_polls.max(1);
        Ok(Self {
            http,
            api,
            token: OnceLock::new(),
            page_size: page_size.max(1),
        })
    }

    fn token(&self) -> UpstreamResult<&str> {
        if let Some(token) = self.token.get() {
            return Ok(token);
        }
        let token = access_token(&self.api)?;
        Ok(self.token.get_or_init(|| token))
    }

    fn crm_url(&self, path: &str) -> String {
        format!("{}/{path}", self.api.resource_manager_endpoint)
    }

    fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
        resource: &str,
    ) -> UpstreamResult<T> {
        tracing::debug!("upstream call {endpoint}");
        let response = request
            .bearer_auth(self.token()?)
            .send()
            .map_err(|e| UpstreamError::Transport {
                endpoint: endpoint.to_string(),
                cause: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .ok()
                .and_then(|body| serde_json::from_str::<ErrorEnvelope>(&body).ok())
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
            return Err(match status {
                StatusCode::FORBIDDEN => UpstreamError::PermissionDenied {
                    resource: resource.to_string(),
                },
                StatusCode::NOT_FOUND => UpstreamError::NotFound {
                    resource: resource.to_string(),
                },
                _ => UpstreamError::Http {
                    endpoint: endpoint.to_string(),
                    status: status.as_u16(),
                    message,
                },
            });
        }

        response.json::<T>().map_err(|e| UpstreamError::Decode {
            endpoint: endpoint.to_string(),
            cause: e.to_string(),
        })
    }

    fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        parent: Option<&ResourceName>,
        page_token: Option<&str>,
    ) -> UpstreamResult<Listing<T>> {
        let mut params = vec![("pageSize", self.page_size.to_string())];
        if let Some(parent) = parent {
            params.push(("parent", parent.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        let resource = parent.map_or_else(|| path.to_string(), ResourceName::to_string);
        let request = self.http.get(self.crm_url(path)).query(&params);
        self.send(request, path, &resource)
    }

    fn post_query(&self, query: &AssetQuery, body: &Value) -> UpstreamResult<QueryAssetsResponse> {
        let endpoint = format!("{}:queryAssets", query.organization);
        let url = format!("{}/{endpoint}", self.api.asset_endpoint);
        let response: QueryAssetsResponse = self.send(
            self.http.post(url).json(body),
            &endpoint,
            &query.organization.to_string(),
        )?;
        if let Some(error) = &response.error {
            return Err(UpstreamError::Http {
                endpoint,
                status: u16::try_from(error.code).unwrap_or(500),
                message: error.message.clone(),
            });
        }
        Ok(response)
    }
}

impl ResourceManager for RestCloud {
    fn search_organizations(&self, page_token: Option<&str>) -> UpstreamResult<Page<Organization>> {
        let endpoint = "organizations:search";
        let listing: Listing<WireOrganization> = self.list(endpoint, None, page_token)?;
        Ok(Page {
            items: listing
                .items
                .into_iter()
                .map(|o| o.into_organization(endpoint))
                .collect::<UpstreamResult<_>>()?,
            next_page_token: listing.next_page_token,
        })
    }

    fn list_folders(&self, parent: &ResourceName, page_token: Option<&str>) -> UpstreamResult<Page<Folder>> {
        let endpoint = "folders";
        let listing: Listing<WireFolder> = self.list(endpoint, Some(parent), page_token)?;
        Ok(Page {
            items: listing
                .items
                .into_iter()
                .map(|f| f.into_folder(endpoint))
                .collect::<UpstreamResult<_>>()?,
            next_page_token: listing.next_page_token,
        })
    }

    fn list_projects(&self, parent: &ResourceName, page_token: Option<&str>) -> UpstreamResult<Page<Project>> {
        let endpoint = "projects";
        let listing: Listing<WireProject> = self.list(endpoint, Some(parent), page_token)?;
        Ok(Page {
            items: listing
                .items
                .into_iter()
                .map(|p| p.into_project(endpoint))
                .collect::<UpstreamResult<_>>()?,
            next_page_token: listing.next_page_token,
        })
    }

    fn search_projects(&self, page_token: Option<&str>) -> UpstreamResult<Page<Project>> {
        let endpoint = "projects:search";
        let listing: Listing<WireProject> = self.list(endpoint, None, page_token)?;
        Ok(Page {
            items: listing
                .items
                .into_iter()
                .map(|p| p.into_project(endpoint))
                .collect::<UpstreamResult<_>>()?,
            next_page_token: listing.next_page_token,
        })
    }

    fn get_folder(&self, name: &ResourceName) -> UpstreamResult<Folder> {
        let endpoint = name.to_string();
        let wire: WireFolder =
            self.send(self.http.get(self.crm_url(&endpoint)), &endpoint, &endpoint)?;
        wire.into_folder(&endpoint)
    }

    fn get_project(&self, name: &ResourceName) -> UpstreamResult<Project> {
        let endpoint = name.to_string();
        let wire: WireProject =
            self.send(self.http.get(self.crm_url(&endpoint)), &endpoint, &endpoint)?;
        wire.into_project(&endpoint)
    }
}

impl AssetInventory for RestCloud {
    fn query_assets(&self, query: &AssetQuery, page_token: Option<&str>) -> UpstreamResult<Page<Value>> {
        let mut body = match page_token.map(split_job_token) {
            Some((job, Some(page))) => json!({
                "jobReference": job,
                "pageToken": page,
                "pageSize": self.page_size,
            }),
            Some((job, None)) => json!({ "jobReference": job, "pageSize": self.page_size }),
            None => json!({ "statement": query.statement(), "pageSize": self.page_size }),
        };

        let mut response = self.post_query(query, &body)?;
        let mut polls = 0;
        while !response.done {
            let job = response
                .job_reference
                .clone()
                .ok_or_else(|| UpstreamError::Decode {
                    endpoint: format!("{}:queryAssets", query.organization),
                    cause: "unfinished query without a job reference".to_string(),
                })?;
            polls += 1;
            if polls > self.api.max_query_polls {
                return Err(UpstreamError::QueryTimeout {
                    attempts: self.api.max_query_polls,
                });
            }
            tracing::debug!("asset query {job} still running, poll {polls}");
            std::thread::sleep(POLL_INTERVAL);
            body = json!({ "jobReference": job, "pageSize": self.page_size });
            response = self.post_query(query, &body)?;
        }

        let result = response.query_result.unwrap_or(QueryResult {
            rows: Vec::new(),
            next_page_token: None,
        });
        let next_page_token = match (result.next_page_token, response.job_reference) {
            (Some(page), Some(job)) if !page.is_empty() => {
                Some(format!("{job}{JOB_TOKEN_SEPARATOR}{page}"))
            }
            _ => None,
        };
        Ok(Page {
            items: result.rows,
            next_page_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_v3_folder_listing() {
        let body = r#"{
            "folders": [
                {"name": "folders/1", "parent": "organizations/100",
                 "displayName": "eng", "state": "ACTIVE"},
                {"name": "folders/2", "parent": "folders/1",
                 "displayName": "old", "state": "DELETE_REQUESTED"}
            ],
            "nextPageToken": "abc"
        }"#;
        let listing: Listing<WireFolder> = serde_json::from_str(body).unwrap();
        assert_eq!(listing.next_page_token.as_deref(), Some("abc"));

        let folders: Vec<Folder> = listing
            .items
            .into_iter()
            .map(|f| f.into_folder("folders").unwrap())
            .collect();
        assert_eq!(folders[0].parent, ResourceName::organization(100));
        assert!(folders[0].lifecycle_state.is_active());
        assert!(!folders[1].lifecycle_state.is_active());
    }

    #[test]
    fn decodes_organization_search() {
        let body = r#"{
            "organizations": [
                {"name": "organizations/100", "displayName": "example.com", "state": "ACTIVE"}
            ]
        }"#;
        let listing: Listing<WireOrganization> = serde_json::from_str(body).unwrap();
        assert!(listing.next_page_token.is_none());

        let orgs: Vec<Organization> = listing
            .items
            .into_iter()
            .map(|o| o.into_organization("organizations:search").unwrap())
            .collect();
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, ResourceName::organization(100));
        assert_eq!(orgs[0].display_name, "example.com");
    }

    #[test]
    fn empty_listing_has_no_items() {
        let listing: Listing<WireProject> = serde_json::from_str("{}").unwrap();
        assert!(listing.items.is_empty());
        assert!(listing.next_page_token.is_none());
    }

    #[test]
    fn project_without_parent_or_display_name() {
        let wire: WireProject = serde_json::from_str(
            r#"{"name": "projects/9", "projectId": "sandbox", "state": "ACTIVE"}"#,
        )
        .unwrap();
        let project = wire.into_project("projects:search").unwrap();
        assert!(project.is_organizationless());
        assert_eq!(project.display_name, "sandbox");
        assert_eq!(project.project_number, Some(9));
    }

    #[test]
    fn malformed_name_is_decode_error() {
        let wire: WireFolder =
            serde_json::from_str(r#"{"name": "folders/x", "parent": "organizations/1"}"#).unwrap();
        assert!(matches!(
            wire.into_folder("folders"),
            Err(UpstreamError::Decode { .. })
        ));
    }

    #[test]
    fn job_tokens_split() {
        assert_eq!(split_job_token("job-1|page-2"), ("job-1", Some("page-2")));
        assert_eq!(split_job_token("job-1|"), ("job-1", None));
        assert_eq!(split_job_token("job-1"), ("job-1", None));
    }

    #[test]
    fn client_builds_without_a_token() {
        let client = RestCloud::new(&ApiConfig::default(), 0).unwrap();
        assert_eq!(client.page_size, 1);
        assert!(client.token.get().is_none());
    }

    #[test]
    fn configured_token_skips_gcloud() {
        let api = ApiConfig {
            access_token: Some(" ya29.token ".to_string()),
            ..ApiConfig::default()
        };
        assert_eq!(access_token(&api).unwrap(), "ya29.token");
    }
}
