//! meshview - preview 3D mesh files
//!
//! `meshview view` opens an interactive window, `meshview info` prints the
//! model's topology attributes as JSON.

mod app;
mod info;
mod options;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::options::{DisplayArgs, SourceArgs};

#[derive(Parser, Debug)]
#[command(name = "meshview")]
#[command(about = "Preview STL, OBJ and PLY meshes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open an interactive preview window
    View {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Print size, volume, area and triangle count as JSON
    Info {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    match cli.command {
        Command::View { source, display } => {
            let options = display.viewer_options()?;
            info!(file = %source.file.display(), "meshview v{}", env!("CARGO_PKG_VERSION"));
            app::run(options, source.model_source())
        }
        Command::Info { source } => {
            let topology = info::topology_report(source.model_source())?;
            println!("{}", serde_json::to_string_pretty(&topology)?);
            Ok(())
        }
    }
}
