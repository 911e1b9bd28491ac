use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::{Query, QueryOptions};
use crate::transport::Transport;
use crate::{ApiClient, ApiResponse};

const USER_ENDPOINT: &str = "rest/api/2/user";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarUrls {
    #[serde(rename = "48x48", skip_serializing_if = "Option::is_none")]
    pub large: Option<String>,
    #[serde(rename = "32x32", skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(rename = "24x24", skip_serializing_if = "Option::is_none")]
    pub small: Option<String>,
    #[serde(rename = "16x16", skip_serializing_if = "Option::is_none")]
    pub xsmall: Option<String>,
}

/// A Jira user. `password` is only sent when creating a user and is never
/// read back from a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_urls: Option<AvatarUrls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub application_keys: Vec<String>,
}

/// Query for `GET /rest/api/2/user/permission/search`. When `max_results`
/// is unset the search asks for 1000 users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPermissionSearch {
    pub username: Option<String>,
    /// Comma-separated permission keys, e.g. `BROWSE,CREATE_ISSUES`.
    pub permissions: Option<String>,
    pub issue_key: Option<String>,
    pub project_key: Option<String>,
    pub start_at: Option<u32>,
    pub max_results: Option<u32>,
}

impl QueryOptions for UserPermissionSearch {
    fn append_to(&self, query: &mut Query) {
        query
            .set_opt("username", self.username.as_deref())
            .set_opt("permissions", self.permissions.as_deref())
            .set_opt("issueKey", self.issue_key.as_deref())
            .set_opt("projectKey", self.project_key.as_deref())
            .set_opt("startAt", self.start_at)
            .set("maxResults", self.max_results.unwrap_or(1000));
    }
}

pub struct UserService<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> UserService<'a, T> {
    pub(crate) fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub async fn get(&self, username: &str) -> Result<ApiResponse<User>> {
        let mut query = Query::new();
        query.set("username", username);
        self.client.get(&query.apply_to(USER_ENDPOINT)).await
    }

    /// The user the client is authenticated as.
    pub async fn myself(&self) -> Result<ApiResponse<User>> {
        self.client.get("rest/api/2/myself").await
    }

    pub async fn create(&self, user: &User) -> Result<ApiResponse<User>> {
        self.client.post(USER_ENDPOINT, user).await
    }

    pub async fn permission_search(
        &self,
        search: &UserPermissionSearch,
    ) -> Result<ApiResponse<Vec<User>>> {
        let path = search.to_query().apply_to("rest/api/2/user/permission/search");
        self.client.get(&path).await
    }
}
