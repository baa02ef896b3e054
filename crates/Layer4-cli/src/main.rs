//! UILint CLI - Main entry point

mod app;
mod report;

use app::App;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uilint_foundation::{Error, UilintConfig};

/// UILint - lint overlay plugin host
#[derive(Parser, Debug)]
#[command(name = "uilint")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Config file to use instead of the global/project config
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a lint manifest and report visible issues
    Check {
        /// Manifest path or http(s) URL
        #[arg(short, long)]
        manifest: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Hide issues from this rule (repeatable)
        #[arg(long = "disable-rule")]
        disable_rule: Vec<String>,
    },
    /// List rules from a lint manifest and which plugin owns them
    Rules {
        /// Manifest path or http(s) URL
        #[arg(short, long)]
        manifest: Option<String>,
    },
    /// List registered plugins in initialization order
    Plugins,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn load_config(path: Option<&PathBuf>) -> UilintConfig {
    let loaded = match path {
        Some(path) => UilintConfig::load_from(path),
        None => UilintConfig::load(),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        UilintConfig::default()
    })
}

/// 사용자 입력이 원인인 실패에 쓰는 종료 코드 (린트 에러는 1)
const EXIT_USAGE: u8 = 2;

/// 설정이나 매니페스트처럼 사용자 입력이 원인인 실패인지
fn is_usage_failure(err: &anyhow::Error) -> bool {
    err.downcast_ref::<Error>().is_some_and(Error::is_user_facing)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    match run(args).await {
        Ok(code) => Ok(code),
        // 사용자 입력 에러는 한 줄로, 나머지는 anyhow 보고서로
        Err(err) if is_usage_failure(&err) => {
            eprintln!("✗ {:#}", err);
            Ok(ExitCode::from(EXIT_USAGE))
        }
        Err(err) => Err(err),
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = load_config(args.config.as_ref());

    // Initialize logging
    let log_level = if args.debug {
        "debug"
    } else {
        config.log_level.as_str()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match args.command {
        Command::Check {
            manifest,
            format,
            disable_rule,
        } => {
            let app = App::start(&config, &disable_rule).await?;
            let loaded = app.load_manifest(manifest.as_deref(), &config).await;
            let slice = app.eslint_state();
            app.shutdown().await;
            let summary = loaded?;
            tracing::debug!(
                files = summary.files,
                locations = summary.locations,
                issues = summary.issues,
                "Manifest loaded"
            );

            match format {
                OutputFormat::Text => print!("{}", report::check_text(&slice)),
                OutputFormat::Json => println!("{}", report::check_json(&slice)?),
            }

            if report::has_errors(&slice) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Rules { manifest } => {
            let app = App::start(&config, &[]).await?;
            let loaded = app.load_manifest(manifest.as_deref(), &config).await;
            if loaded.is_ok() {
                print!("{}", report::rules_text(&app.eslint_state(), app.registry()));
            }
            app.shutdown().await;
            loaded?;
        }
        Command::Plugins => {
            let app = App::start(&config, &[]).await?;
            print!("{}", report::plugins_text(app.registry()));
            app.shutdown().await;
        }
    }

    Ok(ExitCode::SUCCESS)
}
