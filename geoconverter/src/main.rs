//! Point d'entrée CLI pour geoconverter

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use geoconverter::cli::{self, CoordArgs, FileArgs, LayerArgs};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Convertir des fichiers géographiques (.shp, .gdb, .geojson, .gpkg)
#[derive(Parser)]
#[command(name = "geoconverter")]
#[command(author)]
#[command(about = "A conversion tool for geo files such as .shp, .gdb, .geojson, etc.")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Print the version of the program
    #[arg(short = 'v', long, help_heading = "General options")]
    version: bool,

    /// Augmenter la verbosité (--verbose, --verbose --verbose)
    #[arg(long, action = clap::ArgAction::Count, help_heading = "General options")]
    verbose: u8,

    /// Mode silencieux (ni progression ni résumé)
    #[arg(short, long, help_heading = "General options")]
    quiet: bool,

    #[command(flatten)]
    layer: LayerArgs,

    #[command(flatten)]
    files: FileArgs,

    #[command(flatten)]
    coords: CoordArgs,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    // Toute erreur d'arguments sort en 1 ; l'aide sort en 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    if cli.version {
        println!("GeoConverter v{}", env!("CARGO_PKG_VERSION"));
        println!();
        return Ok(());
    }

    if cli.layer.layers {
        return cli::cmd_list_layers(cli.files.file.as_deref());
    }

    cli::cmd_convert(cli.layer, cli.files, cli.coords, !cli.quiet)
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
