//! Event handlers for the bot.
//!
//! | Event | Action | Handler |
//! |-------|--------|---------|
//! | `installation` | `created` | [`InstallationGreeter`] |
//! | `pull_request` | `opened` | [`CodeownersCheck`] |
//!
//! Both handlers fetch a fresh installation token per delivery and treat a
//! failed exchange as fatal.

pub mod codeowners;
pub mod installation;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use github_bot_sdk::{
    ActionFilter, GitHubClient, InstallationToken, RouterError, WebhookEvent,
};

use crate::config::BotConfig;
use crate::errors::BotError;

pub use codeowners::{CodeownersCheck, CodeownersLocation, ProbeOutcome, Verdict};
pub use installation::InstallationGreeter;

/// Build the handler table the service dispatches against.
///
/// # Errors
///
/// Returns `RouterError::DuplicateRegistration` if two handlers claim the
/// same `(event, action)` key.
pub fn register_handlers(
    bot: &BotConfig,
) -> Result<github_bot_sdk::Router<GitHubClient>, RouterError> {
    let mut router = github_bot_sdk::Router::new();

    router.register(
        "installation",
        ActionFilter::exact("created"),
        Arc::new(InstallationGreeter::new(bot.name.clone())),
    )?;
    router.register(
        "pull_request",
        ActionFilter::exact("opened"),
        Arc::new(CodeownersCheck::new(bot.status_context.clone())),
    )?;

    Ok(router)
}

/// Exchange the app's credentials for a token on the delivery's installation.
pub(crate) async fn installation_token(
    event: &WebhookEvent,
    client: &GitHubClient,
) -> Result<InstallationToken, BotError> {
    let installation = event
        .installation()
        .ok_or(BotError::MissingInstallation)?;

    let token = client
        .create_installation_access_token(
            installation.id,
            installation.access_tokens_url.as_deref(),
        )
        .await?;

    Ok(token)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
