use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mishap::config::Config;
use mishap::error::{Error, Result};
use mishap::export::{self, ExportOptions};
use mishap::http::Server;

mod cli;
use cli::{BuildArgs, Cli, Commands, CommonArgs, ServeArgs};

/// How long in-flight requests may take to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize logging based on verbosity level
/// - 0: info for mishap only
/// - 1 (-v): debug for mishap
/// - 2+ (-vv): trace for everything
fn init_logging(cli: &Cli) {
    let filter = match cli.verbose {
        0 => "mishap=info",
        1 => "mishap=debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Build(args) => run_build(args),
    }
}

/// Apply the flags shared between `serve` and `build` to the configuration.
fn apply_common(config: &mut Config, common: &CommonArgs) -> Result<()> {
    for path in &common.add_template {
        let name = config.templates.add_from_file(path).map_err(|e| {
            Error::config(format!(
                "cannot add template from file {}: {}",
                path.display(),
                e
            ))
        })?;
        tracing::info!(name = %name, path = %path.display(), "template added");
    }

    for name in &common.disable_template {
        if config.templates.remove(name) {
            tracing::info!(name = %name, "template disabled");
        } else {
            tracing::warn!(name = %name, "template to disable was not found");
        }
    }

    for spec in &common.add_code {
        config.add_code_spec(spec)?;
        tracing::info!(spec = %spec, "HTTP code added");
    }

    config.disable_l10n = common.disable_l10n;
    config.disable_minification = common.disable_minification;

    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = Config::default();
    apply_common(&mut config, &args.common)?;

    if let Some(name) = args.template_name {
        config.template_name = name;
    }
    config.rotation_mode = args.rotation_mode;
    config.show_details = args.show_details;
    config.default_code_to_render = args.default_error_page;
    config.default_http_code = args.default_http_code;
    config.json_format = args.json_format;
    config.xml_format = args.xml_format;
    if !args.proxy_headers.is_empty() {
        config.proxy_headers = args
            .proxy_headers
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();
    }

    tracing::debug!(
        templates = ?config.templates.names(),
        codes = config.codes.len(),
        template_name = %config.template_name,
        rotation_mode = %config.rotation_mode,
        show_details = config.show_details,
        "configuration assembled"
    );

    let server = Arc::new(Server::new(config)?);

    let mut serving = {
        let server = Arc::clone(&server);
        let (addr, port) = (args.listen, args.port);
        tokio::spawn(async move { server.start(addr, port).await })
    };

    tokio::select! {
        result = &mut serving => {
            result.map_err(|e| Error::config(format!("server task failed: {}", e)))?
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(grace = ?SHUTDOWN_GRACE, "shutdown signal received");
            server.stop(SHUTDOWN_GRACE).await?;
            serving
                .await
                .map_err(|e| Error::config(format!("server task failed: {}", e)))?
        }
    }
}

fn run_build(args: BuildArgs) -> Result<()> {
    let mut config = Config::default();
    apply_common(&mut config, &args.common)?;

    let summary = export::export(&config, &args.target_dir, &ExportOptions { index: args.index })?;
    println!(
        "{} page(s) written into {}",
        summary.written,
        args.target_dir.display()
    );

    if summary.failed > 0 {
        return Err(Error::render(format!(
            "{} page(s) failed to export",
            summary.failed
        )));
    }

    Ok(())
}
