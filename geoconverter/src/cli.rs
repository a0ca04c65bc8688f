//! Définition et implémentation des commandes CLI
//!
//! - `--layers` : liste les couches du fichier d'entrée
//! - défaut : conversion (lecture → CRS → arrondi → écriture)

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::ConvertOptions;
use crate::pipeline::Stage;

/// Options de couche
#[derive(Args, Debug)]
#[command(next_help_heading = "Layer options")]
pub struct LayerArgs {
    /// The layer to convert
    #[arg(short, long)]
    pub layer: Option<String>,

    /// List the layers in the file. If this is set, the program will not convert the file
    #[arg(long, visible_alias = "ls")]
    pub layers: bool,
}

/// Options de fichiers
#[derive(Args, Debug)]
#[command(next_help_heading = "File options")]
pub struct FileArgs {
    /// The file to convert
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// The output file name
    #[arg(short, long, env = "GEOCONVERTER_OUTPUT", default_value = "output.geojson")]
    pub output: PathBuf,

    /// The output format (.shp, .geojson, .gpkg)
    #[arg(long, visible_alias = "fmt", env = "GEOCONVERTER_FORMAT", default_value = ".geojson")]
    pub format: String,

    /// Write a JSON conversion report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Options de coordonnées
#[derive(Args, Debug)]
#[command(next_help_heading = "Coordinate options")]
pub struct CoordArgs {
    /// The coordinate reference system to convert to
    #[arg(short, long, env = "GEOCONVERTER_CRS", default_value = "epsg:4326")]
    pub crs: String,

    /// The number of decimal places to round the coordinates to (i.e. 7 for 0.0000001)
    #[arg(
        short,
        long,
        env = "GEOCONVERTER_ROUND",
        default_value_t = 7,
        allow_negative_numbers = true
    )]
    pub round: i32,
}

/// Exécute la commande de liste des couches
pub fn cmd_list_layers(file: Option<&Path>) -> Result<()> {
    let Some(path) = file else {
        bail!("You must set the file to list the layers");
    };

    info!(path = %path.display(), "Listing layers");
    let layers = geodata::list_layers(path)?;

    println!("Layers in the file:");
    for layer in &layers {
        println!("  - {}", layer);
    }
    println!();

    Ok(())
}

/// Exécute la conversion
pub fn cmd_convert(layer: LayerArgs, files: FileArgs, coords: CoordArgs, show_progress: bool) -> Result<()> {
    let Some(input) = files.file else {
        bail!("You must set the file to convert");
    };

    // Format et CRS validés avant toute lecture : aucune sortie en cas d'erreur
    let options = ConvertOptions::new(
        input,
        layer.layer,
        &files.output,
        &files.format,
        &coords.crs,
        coords.round,
        files.report,
    )?;

    info!(
        input = %options.input.display(),
        output = %options.output.display(),
        format = %options.format,
        crs = %options.crs,
        round = options.round,
        "Starting conversion"
    );

    let progress = stage_progress(show_progress)?;
    let result = crate::pipeline::run(&options, &progress);
    progress.finish_and_clear();
    let report = result?;

    if let Some(path) = &options.report {
        report.save_json(path)?;
        info!(path = %path.display(), "Report written");
    }
    if show_progress {
        report.print_summary();
    }

    println!("Output file created successfully at {}", options.output.display());
    println!();

    Ok(())
}

/// Barre de progression sur les étapes du pipeline (masquée en mode silencieux)
fn stage_progress(visible: bool) -> Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }

    let bar = ProgressBar::new(Stage::ALL.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "Processing... {bar:40.cyan/blue} {pos}/{len} {msg}",
    )?);
    Ok(bar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_layers_requires_file() {
        let err = cmd_list_layers(None).unwrap_err();
        assert_eq!(err.to_string(), "You must set the file to list the layers");
    }

    #[test]
    fn test_convert_requires_file() {
        let err = cmd_convert(
            LayerArgs {
                layer: None,
                layers: false,
            },
            FileArgs {
                file: None,
                output: PathBuf::from("output.geojson"),
                format: ".geojson".to_string(),
                report: None,
            },
            CoordArgs {
                crs: "epsg:4326".to_string(),
                round: 7,
            },
            false,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "You must set the file to convert");
    }

    #[test]
    fn test_stage_progress_hidden() {
        let bar = stage_progress(false).unwrap();
        assert!(bar.is_hidden());
    }
}
