//! Agile boards and everything hanging off a board: configuration, sprints,
//! epics and backlog issues.

use std::fmt::{self, Display};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::issue::{Epic, Issue, IssueList};
use crate::pagination::{warn_if_truncated, PagedResponse, Paginator};
use crate::query::{self, Query, QueryOptions};
use crate::transport::{Response, Transport};
use crate::{segment, ApiClient, ApiResponse};

const BOARD_ENDPOINT: &str = "rest/agile/1.0/board";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardType {
    Scrum,
    Kanban,
    Simple,
    #[serde(other)]
    Unknown,
}

impl BoardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardType::Scrum => "scrum",
            BoardType::Kanban => "kanban",
            BoardType::Simple => "simple",
            BoardType::Unknown => "unknown",
        }
    }
}

impl Display for BoardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub board_type: Option<BoardType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_id: Option<u64>,
}

impl Board {
    /// A board ready for [`BoardService::create_board`]. Name must be under 255
    /// characters and the filter must be visible to the caller.
    pub fn new(name: impl Into<String>, board_type: BoardType, filter_id: u64) -> Self {
        Self {
            name: Some(name.into()),
            board_type: Some(board_type),
            filter_id: Some(filter_id),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SprintState {
    Open,
    Active,
    Closed,
    Future,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: Option<u64>,
    pub name: Option<String>,
    #[serde(rename = "self")]
    pub self_url: Option<String>,
    pub state: Option<SprintState>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub complete_date: Option<DateTime<Utc>>,
    pub origin_board_id: Option<u64>,
    pub goal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFilter {
    pub id: Option<String>,
    #[serde(rename = "self")]
    pub self_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStatus {
    pub id: Option<String>,
    #[serde(rename = "self")]
    pub self_url: Option<String>,
}

/// A board column. `min`/`max` are the work-in-progress limits, absent when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: Option<String>,
    #[serde(default)]
    pub statuses: Vec<BoardStatus>,
    pub min: Option<u32>,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    #[serde(default)]
    pub columns: Vec<Column>,
    pub constraint_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardEstimationField {
    pub field_id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimation {
    #[serde(rename = "type")]
    pub estimation_type: Option<String>,
    pub field: Option<BoardEstimationField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub rank_custom_field_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfiguration {
    pub id: Option<u64>,
    pub name: Option<String>,
    #[serde(rename = "self")]
    pub self_url: Option<String>,
    pub filter: Option<ConfigFilter>,
    #[serde(default)]
    pub column_config: ColumnConfig,
    pub estimation: Option<Estimation>,
    pub ranking: Option<Ranking>,
}

/// Optional filters for [`BoardService::get_all_boards`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardListOptions {
    pub board_type: Option<BoardType>,
    /// Matches boards whose name contains this value.
    pub name: Option<String>,
    /// Boards whose filter references this project.
    pub project_key_or_id: Option<String>,
    pub start_at: Option<u32>,
    pub max_results: Option<u32>,
}

impl QueryOptions for BoardListOptions {
    fn append_to(&self, query: &mut Query) {
        query
            .set_opt("boardType", self.board_type)
            .set_opt("name", self.name.as_deref())
            .set_opt("projectKeyOrId", self.project_key_or_id.as_deref())
            .set_opt("startAt", self.start_at)
            .set_opt("maxResults", self.max_results);
    }
}

pub struct BoardService<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> BoardService<'a, T> {
    pub(crate) fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// Boards visible to the caller, filtered by `options` when given.
    pub async fn get_all_boards(
        &self,
        options: Option<&BoardListOptions>,
    ) -> Result<ApiResponse<PagedResponse<Board>>> {
        let path = query::with_options(BOARD_ENDPOINT, options);
        self.client.get(&path).await
    }

    pub async fn get_board(&self, board_id: impl Display) -> Result<ApiResponse<Board>> {
        let path = format!("{BOARD_ENDPOINT}/{}", segment(board_id));
        self.client.get(&path).await
    }

    /// Creates a board from `board`'s name, type and filter id. The returned
    /// board is the server's copy, with `id` and `self` filled in.
    pub async fn create_board(&self, board: &Board) -> Result<ApiResponse<Board>> {
        self.client.post(BOARD_ENDPOINT, board).await
    }

    pub async fn get_board_config(
        &self,
        board_id: impl Display,
    ) -> Result<ApiResponse<BoardConfiguration>> {
        let path = format!("{BOARD_ENDPOINT}/{}/configuration", segment(board_id));
        self.client.get(&path).await
    }

    pub async fn delete_board(&self, board_id: impl Display) -> Result<Response> {
        let path = format!("{BOARD_ENDPOINT}/{}", segment(board_id));
        self.client.delete(&path).await
    }

    /// All sprints of a board in one request capped at `maxResults=1000`.
    pub async fn get_all_sprints(&self, board_id: impl Display) -> Result<ApiResponse<Vec<Sprint>>> {
        let path = format!("{BOARD_ENDPOINT}/{}/sprint?maxResults=1000", segment(board_id));
        self.values(&path, "sprints").await
    }

    /// All epics of a board in one request capped at `maxResults=1000`.
    pub async fn get_epics_for_board(&self, board_id: impl Display) -> Result<ApiResponse<Vec<Epic>>> {
        let path = format!("{BOARD_ENDPOINT}/{}/epic?maxResults=1000", segment(board_id));
        self.values(&path, "epics").await
    }

    pub async fn get_issues_for_backlog(
        &self,
        board_id: impl Display,
    ) -> Result<ApiResponse<Vec<Issue>>> {
        let path = format!("{BOARD_ENDPOINT}/{}/backlog?maxResults=1000", segment(board_id));
        self.issues(&path, "backlog").await
    }

    pub async fn get_issues_for_epic(
        &self,
        board_id: impl Display,
        epic_id: impl Display,
    ) -> Result<ApiResponse<Vec<Issue>>> {
        let path = format!(
            "{BOARD_ENDPOINT}/{}/epic/{}/issue?maxResults=1000",
            segment(board_id),
            segment(epic_id)
        );
        self.issues(&path, "epic issues").await
    }

    pub async fn get_issues_without_epic(
        &self,
        board_id: impl Display,
    ) -> Result<ApiResponse<Vec<Issue>>> {
        let path = format!(
            "{BOARD_ENDPOINT}/{}/epic/none/issue?maxResults=1000",
            segment(board_id)
        );
        self.issues(&path, "issues without epic").await
    }

    /// Walks the board list page by page instead of one capped request.
    pub fn pages(&self, options: BoardListOptions) -> BoardPages<'a, T> {
        BoardPages {
            client: self.client,
            options,
        }
    }

    async fn values<V>(&self, path: &str, resource: &str) -> Result<ApiResponse<Vec<V>>>
    where
        V: serde::de::DeserializeOwned,
    {
        let page: ApiResponse<PagedResponse<V>> = self.client.get(path).await?;
        warn_if_truncated(resource, page.data.values.len(), page.data.total);
        Ok(page.map(|page| page.values))
    }

    async fn issues(&self, path: &str, resource: &str) -> Result<ApiResponse<Vec<Issue>>> {
        let list: ApiResponse<IssueList> = self.client.get(path).await?;
        warn_if_truncated(resource, list.data.issues.len(), list.data.total);
        Ok(list.map(|list| list.issues))
    }
}

/// Board listing as a [`Paginator`].
pub struct BoardPages<'a, T> {
    client: &'a ApiClient<T>,
    options: BoardListOptions,
}

#[async_trait]
impl<'a, T: Transport> Paginator<Board> for BoardPages<'a, T> {
    async fn fetch_page(&self, start_at: u32, max_results: u32) -> Result<PagedResponse<Board>> {
        debug!(start_at, max_results, "Fetching board page");
        let options = BoardListOptions {
            start_at: Some(start_at),
            max_results: Some(max_results),
            ..self.options.clone()
        };
        let page = self.client.boards().get_all_boards(Some(&options)).await?;
        Ok(page.into_data())
    }
}
