use crate::demo::{run_seed, SeedArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use nagrik_neeti::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "NagrikNeeti",
    about = "Run the NagrikNeeti civic transparency API or load its demo catalogue",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Load demo candidates, promises and feedback and print the dashboard summary
    Seed(SeedArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Load the demo catalogue before accepting requests
    #[arg(long)]
    pub(crate) seed: bool,
    /// Register this uid as an administrator at startup
    #[arg(long)]
    pub(crate) admin_uid: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Seed(args) => run_seed(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["nagrik-neeti-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_accepts_seed_and_admin_flags() {
        let cli = Cli::try_parse_from([
            "nagrik-neeti-api",
            "serve",
            "--port",
            "8080",
            "--seed",
            "--admin-uid",
            "admin-1",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert!(args.seed);
                assert_eq!(args.admin_uid.as_deref(), Some("admin-1"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
