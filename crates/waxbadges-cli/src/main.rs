//! grant-achievement: grants a WAXBadges achievement to a Twitter user.
//!
//! ```text
//! grant-achievement [-d] [-c local_settings.toml] <twitter_username> <ecosystem_id> <category_id> <achievement_id>
//! ```

mod config;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use waxbadges_chain::ChainClient;
use waxbadges_social::TwitterClient;
use waxbadges_workflow::{GrantRequest, Granter};

use crate::config::{Settings, DEFAULT_SETTINGS_PATH};

#[derive(Parser)]
#[command(name = "grant-achievement")]
#[command(about = "Automates granting WAXBadges achievements to Twitter users")]
#[command(version)]
struct Cli {
    /// Twitter username, with or without the leading '@'
    twitter_username: String,

    /// Ecosystem key
    ecosystem_id: u32,

    /// Category index within the ecosystem
    category_id: u32,

    /// Achievement index within the category
    achievement_id: u32,

    /// Send the user a DM with a link to their Proof-of-Achievement
    #[arg(short = 'd', long = "send-dm", alias = "send_dm")]
    send_dm: bool,

    /// Settings file location
    #[arg(short = 'c', long, env = "WAXBADGES_SETTINGS", default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    // RUST_LOG wins over the settings file
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::try_new(log_level)?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Settings, then logging at the configured level
    let settings = Settings::load(&cli.settings)?;
    init_tracing(&settings.advanced.log_level)?;
    let config = settings.grant_config()?;
    info!(
        account = %config.account,
        signer = %config.private_key.public_key(),
        "settings loaded from {:?}",
        cli.settings
    );

    // 2. Collaborators
    let ledger = ChainClient::new(settings.wax.chain_url.as_str())?;
    let social = TwitterClient::new(settings.twitter.api_url.as_str(), settings.credentials())?;

    // 3. Grant
    let request = GrantRequest {
        handle: cli.twitter_username,
        ecosystem_id: cli.ecosystem_id,
        category_id: cli.category_id,
        achievement_id: cli.achievement_id,
        send_dm: cli.send_dm,
    };
    let outcome = Granter::new(&ledger, &social, &config).run(&request).await?;

    if let Some(response) = &outcome.add_user_response {
        info!(%response, "adduser response");
    }
    info!(response = %outcome.grant_response, "grantach response");
    info!(
        user_id = outcome.user_id,
        handle = %outcome.handle,
        created_user = outcome.created_user(),
        notified = outcome.notified,
        link = %outcome.poa_link,
        "achievement granted"
    );
    Ok(())
}
