use anyhow::{Context as _, Result};
use clap::{Args, Subcommand, ValueEnum};
use jira_agile_api::{
    collect_pages, Board, BoardListOptions, BoardType, Epic, Issue, Sprint, SprintState,
};
use serde::Serialize;

use super::{format_date, Context};

#[derive(Args, Debug, Clone)]
pub struct BoardArgs {
    #[command(subcommand)]
    command: BoardCommand,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BoardKind {
    Scrum,
    Kanban,
    Simple,
}

impl From<BoardKind> for BoardType {
    fn from(kind: BoardKind) -> Self {
        match kind {
            BoardKind::Scrum => BoardType::Scrum,
            BoardKind::Kanban => BoardType::Kanban,
            BoardKind::Simple => BoardType::Simple,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
enum BoardCommand {
    /// List boards visible to you
    List {
        /// Only boards of this type
        #[arg(long = "type", value_enum)]
        board_type: Option<BoardKind>,
        /// Only boards whose name contains this text
        #[arg(long)]
        name: Option<String>,
        /// Only boards relevant to this project key or id
        #[arg(long)]
        project: Option<String>,
        /// Index of the first board to return
        #[arg(long)]
        start_at: Option<u32>,
        /// Page size
        #[arg(long)]
        max_results: Option<u32>,
        /// Follow pagination until every board has been fetched
        #[arg(long)]
        all: bool,
        /// Stop after this many boards (with --all)
        #[arg(long, requires = "all")]
        limit: Option<usize>,
    },
    /// Show a single board
    Get {
        /// Board id
        id: u64,
    },
    /// Create a board from a saved filter
    Create {
        /// Board name (under 255 characters)
        #[arg(long)]
        name: String,
        /// Board type
        #[arg(long = "type", value_enum)]
        board_type: BoardKind,
        /// Id of a filter you are allowed to view
        #[arg(long)]
        filter_id: u64,
    },
    /// Delete a board
    Delete {
        /// Board id
        id: u64,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Show a board's column, estimation and ranking configuration
    Config {
        /// Board id
        id: u64,
    },
    /// List a board's sprints
    Sprints {
        /// Board id
        id: u64,
        /// Only sprints in this state
        #[arg(long, value_enum)]
        state: Option<StateFilter>,
    },
    /// List a board's epics
    Epics {
        /// Board id
        id: u64,
    },
    /// List issues in a board's backlog
    Backlog {
        /// Board id
        id: u64,
    },
    /// List a board's issues that belong to an epic
    EpicIssues {
        /// Board id
        id: u64,
        /// Epic id or key
        epic: String,
    },
    /// List a board's issues that belong to no epic
    NoEpicIssues {
        /// Board id
        id: u64,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StateFilter {
    Active,
    Closed,
    Future,
}

impl StateFilter {
    fn matches(self, state: Option<SprintState>) -> bool {
        matches!(
            (self, state),
            (StateFilter::Active, Some(SprintState::Active | SprintState::Open))
                | (StateFilter::Closed, Some(SprintState::Closed))
                | (StateFilter::Future, Some(SprintState::Future))
        )
    }
}

pub async fn execute(args: BoardArgs, ctx: &Context<'_>) -> Result<()> {
    match args.command {
        BoardCommand::List {
            board_type,
            name,
            project,
            start_at,
            max_results,
            all,
            limit,
        } => {
            let options = BoardListOptions {
                board_type: board_type.map(BoardType::from),
                name,
                project_key_or_id: project,
                start_at,
                max_results,
            };
            list_boards(ctx, options, all, limit).await
        }
        BoardCommand::Get { id } => get_board(ctx, id).await,
        BoardCommand::Create {
            name,
            board_type,
            filter_id,
        } => create_board(ctx, &name, board_type.into(), filter_id).await,
        BoardCommand::Delete { id, force } => delete_board(ctx, id, force).await,
        BoardCommand::Config { id } => board_config(ctx, id).await,
        BoardCommand::Sprints { id, state } => list_sprints(ctx, id, state).await,
        BoardCommand::Epics { id } => list_epics(ctx, id).await,
        BoardCommand::Backlog { id } => {
            let issues = ctx
                .client
                .boards()
                .get_issues_for_backlog(id)
                .await
                .with_context(|| format!("Failed to list backlog of board {id}"))?
                .into_data();
            render_issues(ctx, &issues)
        }
        BoardCommand::EpicIssues { id, epic } => {
            let issues = ctx
                .client
                .boards()
                .get_issues_for_epic(id, &epic)
                .await
                .with_context(|| format!("Failed to list issues of epic {epic} on board {id}"))?
                .into_data();
            render_issues(ctx, &issues)
        }
        BoardCommand::NoEpicIssues { id } => {
            let issues = ctx
                .client
                .boards()
                .get_issues_without_epic(id)
                .await
                .with_context(|| format!("Failed to list issues without epic on board {id}"))?
                .into_data();
            render_issues(ctx, &issues)
        }
    }
}

#[derive(Serialize)]
struct BoardRow<'a> {
    id: Option<u64>,
    name: &'a str,
    #[serde(rename = "type")]
    board_type: String,
    filter_id: Option<u64>,
}

impl<'a> From<&'a Board> for BoardRow<'a> {
    fn from(board: &'a Board) -> Self {
        Self {
            id: board.id,
            name: board.name.as_deref().unwrap_or(""),
            board_type: board
                .board_type
                .map(|t| t.to_string())
                .unwrap_or_default(),
            filter_id: board.filter_id,
        }
    }
}

async fn list_boards(
    ctx: &Context<'_>,
    options: BoardListOptions,
    all: bool,
    limit: Option<usize>,
) -> Result<()> {
    let boards = if all {
        let page_size = options.max_results.unwrap_or(50);
        let pages = ctx.client.boards().pages(options);
        collect_pages(&pages, page_size, limit)
            .await
            .context("Failed to list boards")?
    } else {
        let page = ctx
            .client
            .boards()
            .get_all_boards(Some(&options))
            .await
            .context("Failed to list boards")?
            .into_data();
        if page.has_next() {
            tracing::info!(
                total = page.total,
                "More boards available; use --all or --start-at to see them"
            );
        }
        page.values
    };

    if boards.is_empty() {
        tracing::info!("No boards returned for this account.");
        return Ok(());
    }

    let rows: Vec<BoardRow<'_>> = boards.iter().map(BoardRow::from).collect();
    ctx.renderer.render(&rows)
}

async fn get_board(ctx: &Context<'_>, id: u64) -> Result<()> {
    let board = ctx
        .client
        .boards()
        .get_board(id)
        .await
        .with_context(|| format!("Failed to get board {id}"))?
        .into_data();

    ctx.renderer.render(&BoardRow::from(&board))
}

async fn create_board(
    ctx: &Context<'_>,
    name: &str,
    board_type: BoardType,
    filter_id: u64,
) -> Result<()> {
    let board = Board::new(name, board_type, filter_id);
    let created = ctx
        .client
        .boards()
        .create_board(&board)
        .await
        .context("Failed to create board")?
        .into_data();

    tracing::info!(id = ?created.id, name, "Board created");
    ctx.renderer.success(&format!(
        "Created board {} (ID: {})",
        created.name.as_deref().unwrap_or(name),
        created.id.map(|id| id.to_string()).unwrap_or_default()
    ));
    ctx.renderer.render(&BoardRow::from(&created))
}

async fn delete_board(ctx: &Context<'_>, id: u64, force: bool) -> Result<()> {
    if !force {
        ctx.renderer.warn(&format!(
            "This will permanently delete board {id}. Use --force to confirm."
        ));
        return Ok(());
    }

    ctx.client
        .boards()
        .delete_board(id)
        .await
        .with_context(|| format!("Failed to delete board {id}"))?;

    tracing::info!(id, "Board deleted");
    ctx.renderer.success(&format!("Deleted board {id}"));
    Ok(())
}

async fn board_config(ctx: &Context<'_>, id: u64) -> Result<()> {
    let config = ctx
        .client
        .boards()
        .get_board_config(id)
        .await
        .with_context(|| format!("Failed to get configuration of board {id}"))?
        .into_data();

    #[derive(Serialize)]
    struct ColumnRow<'a> {
        column: &'a str,
        statuses: String,
        min: Option<u32>,
        max: Option<u32>,
    }

    let rows: Vec<ColumnRow<'_>> = config
        .column_config
        .columns
        .iter()
        .map(|column| ColumnRow {
            column: column.name.as_deref().unwrap_or(""),
            statuses: column
                .statuses
                .iter()
                .filter_map(|s| s.id.as_deref())
                .collect::<Vec<_>>()
                .join(", "),
            min: column.min,
            max: column.max,
        })
        .collect();

    if let Some(estimation) = &config.estimation {
        let field = estimation
            .field
            .as_ref()
            .and_then(|f| f.display_name.as_deref().or(f.field_id.as_deref()))
            .unwrap_or("");
        let kind = estimation.estimation_type.as_deref().unwrap_or("");
        tracing::info!(kind, field, "Estimation");
    }

    ctx.renderer.render(&rows)
}

#[derive(Serialize)]
struct SprintRow<'a> {
    id: Option<u64>,
    name: &'a str,
    state: String,
    start: String,
    end: String,
    completed: String,
}

impl<'a> From<&'a Sprint> for SprintRow<'a> {
    fn from(sprint: &'a Sprint) -> Self {
        Self {
            id: sprint.id,
            name: sprint.name.as_deref().unwrap_or(""),
            state: sprint
                .state
                .map(|s| format!("{s:?}").to_lowercase())
                .unwrap_or_default(),
            start: format_date(sprint.start_date),
            end: format_date(sprint.end_date),
            completed: format_date(sprint.complete_date),
        }
    }
}

async fn list_sprints(ctx: &Context<'_>, id: u64, state: Option<StateFilter>) -> Result<()> {
    let sprints = ctx
        .client
        .boards()
        .get_all_sprints(id)
        .await
        .with_context(|| format!("Failed to list sprints of board {id}"))?
        .into_data();

    let rows: Vec<SprintRow<'_>> = sprints
        .iter()
        .filter(|sprint| state.map_or(true, |filter| filter.matches(sprint.state)))
        .map(SprintRow::from)
        .collect();

    if rows.is_empty() {
        tracing::info!(board = id, "No sprints found.");
        return Ok(());
    }

    ctx.renderer.render(&rows)
}

async fn list_epics(ctx: &Context<'_>, id: u64) -> Result<()> {
    let epics: Vec<Epic> = ctx
        .client
        .boards()
        .get_epics_for_board(id)
        .await
        .with_context(|| format!("Failed to list epics of board {id}"))?
        .into_data();

    #[derive(Serialize)]
    struct EpicRow<'a> {
        id: Option<u64>,
        key: &'a str,
        name: &'a str,
        done: bool,
    }

    let rows: Vec<EpicRow<'_>> = epics
        .iter()
        .map(|epic| EpicRow {
            id: epic.id,
            key: epic.key.as_deref().unwrap_or(""),
            name: epic
                .name
                .as_deref()
                .or(epic.summary.as_deref())
                .unwrap_or(""),
            done: epic.done,
        })
        .collect();

    ctx.renderer.render(&rows)
}

fn render_issues(ctx: &Context<'_>, issues: &[Issue]) -> Result<()> {
    #[derive(Serialize)]
    struct IssueRow<'a> {
        key: &'a str,
        summary: &'a str,
        status: &'a str,
        #[serde(rename = "type")]
        issue_type: &'a str,
        assignee: &'a str,
    }

    if issues.is_empty() {
        tracing::info!("No issues found.");
        return Ok(());
    }

    let rows: Vec<IssueRow<'_>> = issues
        .iter()
        .map(|issue| {
            let fields = &issue.fields;
            IssueRow {
                key: issue.key.as_deref().unwrap_or(""),
                summary: fields.summary.as_deref().unwrap_or(""),
                status: fields
                    .status
                    .as_ref()
                    .and_then(|s| s.name.as_deref())
                    .unwrap_or(""),
                issue_type: fields
                    .issue_type
                    .as_ref()
                    .and_then(|t| t.name.as_deref())
                    .unwrap_or(""),
                assignee: fields
                    .assignee
                    .as_ref()
                    .and_then(|u| u.display_name.as_deref())
                    .unwrap_or("Unassigned"),
            }
        })
        .collect();

    ctx.renderer.render(&rows)
}
