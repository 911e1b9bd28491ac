use jira_agile_api::ApiClient;
use jira_agile_output::OutputRenderer;

pub mod board;
pub mod user;
pub mod webhook;

pub struct Context<'a> {
    pub client: ApiClient,
    pub renderer: &'a OutputRenderer,
}

/// Formats an optional timestamp as `YYYY-MM-DD HH:MM`, blank when unset.
pub(crate) fn format_date(value: Option<chrono::DateTime<chrono::Utc>>) -> String {
    value
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
