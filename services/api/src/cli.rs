use crate::commands::{run_analyze, run_countries, AnalyzeArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use invoice_readiness::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Invoice Readiness",
    about = "Score invoice exports for e-invoicing readiness over HTTP or from the command line",
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
    /// Analyze a local CSV or JSON invoice export and print the report
    Analyze(AnalyzeArgs),
    /// List the supported country profiles
    Countries,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Analyze(args) => run_analyze(args),
        Command::Countries => {
            run_countries();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_falls_back_to_serve() {
        let cli = Cli::try_parse_from(["invoice-readiness-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn analyze_accepts_country_and_json_flags() {
        let cli = Cli::try_parse_from([
            "invoice-readiness-api",
            "analyze",
            "--file",
            "invoices.csv",
            "--country",
            "KSA",
            "--json",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Analyze(args)) => {
                assert_eq!(args.country, "KSA");
                assert!(args.json);
                assert_eq!(args.file.to_str(), Some("invoices.csv"));
            }
            other => panic!("expected analyze command, got {other:?}"),
        }
    }

    #[test]
    fn serve_overrides_parse() {
        let cli = Cli::try_parse_from(["invoice-readiness-api", "serve", "--port", "8081"])
            .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8081));
                assert!(args.host.is_none());
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }
}
