use anyhow::Result;
use clap::Parser;
use geneagrapher::progress::ProgressBar;
use geneagrapher::report::report_for_error;
use geneagrapher::{dot, request, Config, GeneagrapherError, GraphClient, StartNodeSpec};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "geneagrapher", version)]
#[command(
    about = "Create a Graphviz \"dot\" file for a mathematics genealogy, where ID is a \
             record identifier from the Mathematics Genealogy Project."
)]
struct Args {
    /// Write output to FILE [default: stdout]
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: Option<PathBuf>,

    /// Do not display the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Mathematician record ID; valid formats are 'ID' for advisor traversal,
    /// 'ID:a' for advisor traversal, 'ID:d' for descendant traversal, or 'ID:ad'
    /// for advisor and descendant traversal
    #[arg(value_name = "ID", required = true)]
    ids: Vec<StartNodeSpec>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", render_failure(&config_error(e)));
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG wins over logging.level; logs go to stderr
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.logging.level.as_str()),
    )
    .init();

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<GeneagrapherError>() {
                Some(err) => eprintln!("{}", render_failure(err)),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, config: Config) -> Result<()> {
    let payload = request::build(&args.ids, args.quiet);
    let client = GraphClient::from_config(&config.service);
    log::info!(
        "Requesting graph for {} from {}",
        args.ids.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", "),
        client.url()
    );

    let mut bar = (!args.quiet).then(|| ProgressBar::stderr(config.progress.bar_width));
    let result = client
        .build_graph(&payload, |counts| {
            if let Some(bar) = bar.as_mut() {
                if let Err(e) = bar.report(counts) {
                    log::debug!("Failed to draw progress bar: {}", e);
                }
            }
        })
        .await;
    if let Some(bar) = bar.as_mut() {
        if let Err(e) = bar.finish() {
            log::debug!("Failed to finish progress bar: {}", e);
        }
    }

    let graph = result?;
    if graph.is_truncated() {
        log::warn!("The service truncated this graph; some referenced records are not included");
    }

    write_output(args.out.as_deref(), &dot::encode(&graph))?;
    Ok(())
}

/// Write the dot text plus a trailing newline to `out`, or stdout when unset.
fn write_output(out: Option<&Path>, output: &str) -> geneagrapher::Result<()> {
    match out {
        Some(path) => std::fs::write(path, format!("{output}\n")).map_err(|e| {
            log::warn!("Failed to write output file {}: {}", path.display(), e);
            GeneagrapherError::Io(e)
        })?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{output}")?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn config_error(err: anyhow::Error) -> GeneagrapherError {
    GeneagrapherError::Config(format!("{err:#}"))
}

/// Service failures get the full issue report; local failures a single line.
fn render_failure(err: &GeneagrapherError) -> String {
    match err {
        GeneagrapherError::ServiceUnavailable { .. } | GeneagrapherError::UnexpectedResponse { .. } => {
            report_for_error(err, &command_line())
        }
        other => format!("Error: {other}"),
    }
}

fn command_line() -> String {
    std::env::args().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_options_and_ids() {
        let args = Args::try_parse_from(["geneagrapher", "-q", "-o", "out.dot", "3", "43:ad"]).unwrap();
        assert!(args.quiet);
        assert_eq!(args.out, Some(PathBuf::from("out.dot")));
        assert_eq!(args.ids, vec![StartNodeSpec::new(3, true, false), StartNodeSpec::new(43, true, true)]);
    }

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["geneagrapher", "30484"]).unwrap();
        assert!(!args.quiet);
        assert!(args.out.is_none());
        assert_eq!(args.ids.len(), 1);
    }

    #[test]
    fn test_parse_requires_an_id() {
        assert!(Args::try_parse_from(["geneagrapher"]).is_err());
        assert!(Args::try_parse_from(["geneagrapher", "-q"]).is_err());
    }

    #[test]
    fn test_write_output_to_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("out.dot");
        write_output(Some(&path), "digraph {\n}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "digraph {\n}\n");
    }

    #[test]
    fn test_write_output_failure_is_io_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("out.dot");
        let err = write_output(Some(&path), "digraph {}").unwrap_err();
        assert!(matches!(err, GeneagrapherError::Io(_)));
        assert!(render_failure(&err).starts_with("Error: IO error:"));
    }

    #[test]
    fn test_config_failure_is_config_error() {
        let err = config_error(anyhow::anyhow!("progress.bar_width must be greater than 0"));
        assert!(matches!(err, GeneagrapherError::Config(_)));
        assert_eq!(
            render_failure(&err),
            "Error: Configuration error: progress.bar_width must be greater than 0"
        );
    }

    #[test]
    fn test_service_failure_gets_full_report() {
        let err = GeneagrapherError::UnexpectedResponse {
            response: r#"{"kind":"error"}"#.to_string(),
        };
        let text = render_failure(&err);
        assert!(text.starts_with("Request to Geneagrapher backend failed."));
        assert!(text.contains("Response: {\"kind\":\"error\"}"));
    }

    #[test]
    fn test_parse_rejects_bad_id() {
        let err = Args::try_parse_from(["geneagrapher", "3:x"]).unwrap_err();
        assert!(err.to_string().contains("3:x"));
    }
}
