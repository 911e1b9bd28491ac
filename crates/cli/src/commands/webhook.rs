use anyhow::{bail, Context as _, Result};
use clap::{Args, Subcommand};
use jira_agile_api::Webhook;
use serde::Serialize;

use super::Context;

#[derive(Args, Debug, Clone)]
pub struct WebhookArgs {
    #[command(subcommand)]
    command: WebhookCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum WebhookCommand {
    /// List registered webhooks
    List,
    /// Register a webhook
    Create {
        /// Webhook name
        #[arg(long)]
        name: String,
        /// URL the server will deliver events to
        #[arg(long)]
        url: String,
        /// Event to subscribe to (repeatable), e.g. jira:issue_updated
        #[arg(long = "event", required = true)]
        events: Vec<String>,
        /// Only deliver events for issues matching this JQL
        #[arg(long)]
        jql: Option<String>,
        /// Leave issue details out of the delivered payload
        #[arg(long)]
        exclude_issue_details: bool,
    },
}

#[derive(Serialize)]
struct WebhookRow<'a> {
    name: &'a str,
    url: &'a str,
    events: &'a [String],
    jql: &'a str,
}

impl<'a> From<&'a Webhook> for WebhookRow<'a> {
    fn from(webhook: &'a Webhook) -> Self {
        Self {
            name: webhook.name.as_deref().unwrap_or(""),
            url: webhook.url.as_deref().unwrap_or(""),
            events: &webhook.events,
            jql: webhook.jql_filter.as_deref().unwrap_or(""),
        }
    }
}

pub async fn execute(args: WebhookArgs, ctx: &Context<'_>) -> Result<()> {
    match args.command {
        WebhookCommand::List => list_webhooks(ctx).await,
        WebhookCommand::Create {
            name,
            url,
            events,
            jql,
            exclude_issue_details,
        } => {
            let mut webhook = Webhook::new(name, url, events);
            webhook.jql_filter = jql;
            if exclude_issue_details {
                webhook.exclude_issue_details = Some(true);
            }
            create_webhook(ctx, &webhook).await
        }
    }
}

async fn list_webhooks(ctx: &Context<'_>) -> Result<()> {
    let webhooks = ctx
        .client
        .webhooks()
        .get_all()
        .await
        .context("Failed to list webhooks")?
        .into_data();

    if webhooks.is_empty() {
        tracing::info!("No webhooks registered.");
        return Ok(());
    }

    let rows: Vec<WebhookRow<'_>> = webhooks.iter().map(WebhookRow::from).collect();
    ctx.renderer.render(&rows)
}

async fn create_webhook(ctx: &Context<'_>, webhook: &Webhook) -> Result<()> {
    if let Some(url) = &webhook.url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("Webhook URL must start with http:// or https://, got '{url}'");
        }
    }

    let created = ctx
        .client
        .webhooks()
        .create(webhook)
        .await
        .context("Failed to create webhook")?
        .into_data();

    ctx.renderer.success(&format!(
        "Registered webhook {}",
        created
            .name
            .as_deref()
            .or(webhook.name.as_deref())
            .unwrap_or("")
    ));
    ctx.renderer.render(&WebhookRow::from(&created))
}
