use crate::score::{run_score, run_summarize, ScoreArgs, SummarizeArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use job_scorer::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "ERW Job Scorer",
    about = "Score construction bid packages from scope extractor spreadsheets",
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
    /// Score one job made of one or more spreadsheets
    Score(ScoreArgs),
    /// Print the aggregated scope summary without calling the model
    Summarize(SummarizeArgs),
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
        Command::Score(args) => run_score(args).await,
        Command::Summarize(args) => run_summarize(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["job-scorer-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn score_accepts_several_files_and_flags() {
        let cli = Cli::try_parse_from([
            "job-scorer-api",
            "score",
            "walls.xlsx",
            "paving.csv",
            "--output",
            "out.json",
            "--json",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Score(args)) => {
                assert_eq!(
                    args.files,
                    vec![PathBuf::from("walls.xlsx"), PathBuf::from("paving.csv")]
                );
                assert_eq!(args.output, Some(PathBuf::from("out.json")));
                assert!(args.json);
            }
            other => panic!("expected score command, got {other:?}"),
        }
    }

    #[test]
    fn score_requires_at_least_one_file() {
        assert!(Cli::try_parse_from(["job-scorer-api", "score"]).is_err());
    }

    #[test]
    fn serve_overrides_are_optional() {
        let cli = Cli::try_parse_from(["job-scorer-api", "serve", "--port", "8080"])
            .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert!(args.host.is_none());
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }
}
