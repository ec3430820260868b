use anyhow::{Context, Result};
use brickdash::config::DashboardConfig;
use brickdash::graph::render_chart;
use brickdash::parser::parse_selection_str;
use brickdash::{server, DashboardContext, OutputFormat, RenderOptions};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "brickdash")]
#[command(about = "Filter and plot LEGO sets by theme", long_about = None)]
#[command(version = brickdash::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the interactive dashboard
    Serve {
        #[command(flatten)]
        source: SourceArgs,

        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port number to bind to
        #[arg(long, default_value = "8050")]
        port: u16,
    },
    /// Render one chart to stdout
    Render {
        #[command(flatten)]
        source: SourceArgs,

        /// Selection DSL (e.g., 'themes("City", "Technic") | x(year) | y(price)')
        selection: String,

        #[arg(long, value_enum, default_value = "png")]
        format: OutputFormat,

        #[arg(long, default_value = "800")]
        width: u32,

        #[arg(long, default_value = "600")]
        height: u32,

        /// Chart title
        #[arg(long)]
        title: Option<String>,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// CSV file with the LEGO sets
    #[arg(long, env = "BRICKDASH_DATA", default_value = "data/brickset_data.csv")]
    data: PathBuf,

    /// JSON file overriding the theme list, palette, labels or load filters
    #[arg(long, env = "BRICKDASH_CONFIG")]
    config: Option<PathBuf>,
}

impl SourceArgs {
    fn load(&self) -> Result<DashboardContext> {
        let config = match &self.config {
            Some(path) => DashboardConfig::from_json_file(path)?,
            None => DashboardConfig::default(),
        };
        let ctx = DashboardContext::load(config, &self.data)
            .with_context(|| format!("Failed to load dashboard data from {}", self.data.display()))?;
        Ok(ctx)
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brickdash=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { source, host, port } => {
            let ctx = source.load()?;
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .with_context(|| format!("Invalid host or port: {}:{}", host, port))?;
            server::serve(ctx, addr).await
        }
        Command::Render {
            source,
            selection,
            format,
            width,
            height,
            title,
        } => {
            let ctx = source.load()?;
            let selection = parse_selection_str(&selection)?;
            let spec = ctx.query(&selection)?;
            info!("Rendering {} points", spec.points.len());

            let options = RenderOptions {
                width,
                height,
                format,
                title,
            };
            let bytes = render_chart(&spec, &ctx.colors, &options).context("Failed to render chart")?;

            // Write the chart to stdout
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(&bytes).context("Failed to write chart to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
            Ok(())
        }
    }
}
