use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ets_cat30::{
    config::{Config, ReportFormat},
    runner::{self, Executor},
    suite::SuiteContext,
};

#[derive(Parser)]
#[command(name = "ets-cat30", version, about = "Conformance tests for CSW 3.0 / OpenSearch")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the test suite against an implementation
    Run(RunArgs),
    /// List the test classes and their tests
    List,
}

#[derive(clap::Args)]
struct RunArgs {
    /// URL of the capabilities document of the implementation under test
    #[arg(long)]
    iut: Option<String>,
    /// Test class to run (repeatable; all when omitted)
    #[arg(long = "class")]
    classes: Vec<String>,
    #[arg(long, value_enum)]
    format: Option<ReportFormat>,
    /// Report file; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
    /// CSW 3.0 schema (cswAll.xsd)
    #[arg(long)]
    csw_schema: Option<PathBuf>,
    /// Atom schema replacing the bundled one
    #[arg(long)]
    atom_schema: Option<PathBuf>,
    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl RunArgs {
    fn apply(self, config: &mut Config) {
        if let Some(iut) = self.iut {
            config.iut = Some(iut);
        }
        if !self.classes.is_empty() {
            config.classes = self.classes;
        }
        if let Some(format) = self.format {
            config.report.format = format;
        }
        if let Some(output) = self.output {
            config.report.output = Some(output);
        }
        if let Some(path) = self.csw_schema {
            config.schemas.csw = Some(path);
        }
        if let Some(path) = self.atom_schema {
            config.schemas.atom = Some(path);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ets_cat30=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::List => {
            for class in runner::test_classes() {
                println!("{}", class.name);
                for test in class.tests {
                    match test.requirement {
                        Some(req) => println!("  {} ({}): {}", test.name, req, test.description),
                        None => println!("  {}: {}", test.name, test.description),
                    }
                }
            }
            Ok(())
        }
        Command::Run(args) => {
            let mut config = Config::load()?;
            args.apply(&mut config);
            tracing::debug!("Configuration: {:?}", config);
            let config = Arc::new(config);

            let ctx = SuiteContext::initialize(config.clone()).await?;
            let report = Executor::new(&ctx, &config.classes)?.run().await;
            tracing::info!(
                "{} tests: {} passed, {} failed, {} errors, {} skipped",
                report.summary.total,
                report.summary.passed,
                report.summary.failed,
                report.summary.errors,
                report.summary.skipped
            );

            let rendered = match config.report.format {
                ReportFormat::Json => report.to_json()?,
                ReportFormat::Markdown => report.to_markdown(),
            };
            match &config.report.output {
                Some(path) => {
                    std::fs::write(path, rendered)?;
                    tracing::info!("Report written to {}", path.display());
                }
                None => println!("{}", rendered),
            }

            if report.has_failures() {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
