use clap::Subcommand;

use crate::auth::hash_password;
use crate::cli::utils::output_value;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum PasswordCommands {
    #[command(about = "Hash a password for the users.password_hash column")]
    Hash {
        #[arg(help = "Plain-text password")]
        password: String,
    },
}

pub fn handle(cmd: PasswordCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PasswordCommands::Hash { password } => {
            let hash = hash_password(&password)?;
            output_value(output_format, "hash", &hash)
        }
    }
}
