use anyhow::bail;
use clap::Subcommand;
use serde_json::json;

use crate::auth::SessionTokens;
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::types::UserId;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a session token for a user id")]
    Issue {
        #[arg(help = "User id the token identifies", required_unless_present = "demo")]
        user_id: Option<UserId>,
        #[arg(long, help = "Issue a demo token instead")]
        demo: bool,
    },

    #[command(about = "Show the user id a token resolves to")]
    Parse {
        #[arg(help = "Token, without the Bearer prefix")]
        token: String,
    },
}

pub fn handle(cmd: TokenCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let tokens = SessionTokens::from_config(&config.security)?;

    match cmd {
        TokenCommands::Issue { user_id, demo } => {
            let token = match (demo, user_id) {
                (true, _) => tokens.issue_demo()?,
                (false, Some(user_id)) => tokens.issue(user_id)?,
                (false, None) => bail!("a user id or --demo is required"),
            };
            output_value(output_format, "token", &token)
        }
        TokenCommands::Parse { token } => match tokens.parse(&token) {
            Some(user_id) => output_success(
                output_format,
                &format!("Token resolves to user {}", user_id),
                Some(json!({ "user_id": user_id })),
            ),
            None => bail!("token does not carry an identity"),
        },
    }
}
