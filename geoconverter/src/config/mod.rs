//! Configuration d'une conversion

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use geodata::Crs;
use serde::Serialize;
use tracing::warn;

/// Format de sortie (table fixe format -> driver OGR)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputFormat {
    Shapefile,
    GeoJson,
    GeoPackage,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [
        OutputFormat::Shapefile,
        OutputFormat::GeoJson,
        OutputFormat::GeoPackage,
    ];

    /// Jeton CLI (`.shp`, `.geojson`, `.gpkg`)
    pub fn token(self) -> &'static str {
        match self {
            OutputFormat::Shapefile => ".shp",
            OutputFormat::GeoJson => ".geojson",
            OutputFormat::GeoPackage => ".gpkg",
        }
    }

    /// Nom du driver OGR
    pub fn driver(self) -> &'static str {
        match self {
            OutputFormat::Shapefile => "ESRI Shapefile",
            OutputFormat::GeoJson => "GeoJSON",
            OutputFormat::GeoPackage => "GPKG",
        }
    }

    /// Extension de fichier canonique
    pub fn extension(self) -> &'static str {
        &self.token()[1..]
    }

    /// Extensions acceptées telles quelles pour le chemin de sortie
    fn accepts_extension(self, ext: &str) -> bool {
        match self {
            OutputFormat::GeoJson => {
                ext.eq_ignore_ascii_case("geojson") || ext.eq_ignore_ascii_case("json")
            }
            other => ext.eq_ignore_ascii_case(other.extension()),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().trim_start_matches('.');
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| anyhow::anyhow!("The format {} is not supported", s))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Options d'une conversion, validées avant toute lecture
#[derive(Debug, Clone, Serialize)]
pub struct ConvertOptions {
    /// Fichier (ou dossier .gdb) d'entrée
    pub input: PathBuf,

    /// Couche à lire (première couche si absent)
    pub layer: Option<String>,

    /// Chemin de sortie effectif (extension du format appliquée)
    pub output: PathBuf,

    pub format: OutputFormat,

    /// CRS cible
    pub crs: Crs,

    /// Nombre de décimales conservées (10^-round)
    pub round: i32,

    /// Rapport JSON optionnel
    pub report: Option<PathBuf>,
}

impl ConvertOptions {
    pub fn new(
        input: PathBuf,
        layer: Option<String>,
        output: &Path,
        format: &str,
        crs: &str,
        round: i32,
        report: Option<PathBuf>,
    ) -> Result<Self> {
        let format: OutputFormat = format.parse()?;
        let crs = Crs::parse(crs).context("Invalid target CRS")?;
        let round = validate_round(round)?;
        let output = resolve_output_path(output, format);

        Ok(Self {
            input,
            layer,
            output,
            format,
            crs,
            round,
            report,
        })
    }
}

/// Applique l'extension du format au chemin de sortie
///
/// - sans extension : l'extension du format est ajoutée
/// - extension cohérente avec le format : chemin inchangé
/// - autre extension : remplacée par celle du format
pub fn resolve_output_path(output: &Path, format: OutputFormat) -> PathBuf {
    match output.extension().and_then(|e| e.to_str()) {
        None => {
            let mut name = output.as_os_str().to_os_string();
            name.push(format.token());
            PathBuf::from(name)
        }
        Some(ext) if format.accepts_extension(ext) => output.to_path_buf(),
        Some(ext) => {
            let resolved = output.with_extension(format.extension());
            warn!(
                "Output extension .{} does not match format {}, writing to {}",
                ext,
                format,
                resolved.display()
            );
            resolved
        }
    }
}

/// Vérifie qu'un nombre de décimales reste dans la plage utile d'un f64
pub fn validate_round(round: i32) -> Result<i32> {
    if !(-15..=15).contains(&round) {
        bail!("Rounding must be between -15 and 15 decimals, got: {}", round);
    }
    Ok(round)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_lookup() {
        assert_eq!(".shp".parse::<OutputFormat>().unwrap(), OutputFormat::Shapefile);
        assert_eq!(".geojson".parse::<OutputFormat>().unwrap(), OutputFormat::GeoJson);
        assert_eq!("GPKG".parse::<OutputFormat>().unwrap(), OutputFormat::GeoPackage);
        assert_eq!(OutputFormat::Shapefile.driver(), "ESRI Shapefile");
        assert_eq!(OutputFormat::GeoJson.driver(), "GeoJSON");
        assert_eq!(OutputFormat::GeoPackage.driver(), "GPKG");
    }

    #[test]
    fn test_unsupported_format() {
        let err = ".kml".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err.to_string(), "The format .kml is not supported");
    }

    #[test]
    fn test_resolve_output_path() {
        assert_eq!(
            resolve_output_path(Path::new("out"), OutputFormat::GeoPackage),
            PathBuf::from("out.gpkg")
        );
        assert_eq!(
            resolve_output_path(Path::new("dir/out.json"), OutputFormat::GeoJson),
            PathBuf::from("dir/out.json")
        );
        assert_eq!(
            resolve_output_path(Path::new("output.geojson"), OutputFormat::Shapefile),
            PathBuf::from("output.shp")
        );
    }

    #[test]
    fn test_options_validation() {
        let options = ConvertOptions::new(
            PathBuf::from("in.shp"),
            None,
            Path::new("output.geojson"),
            ".geojson",
            "epsg:4326",
            7,
            None,
        )
        .unwrap();
        assert_eq!(options.crs.epsg_code(), Some(4326));
        assert_eq!(options.output, PathBuf::from("output.geojson"));

        let bad_format = ConvertOptions::new(
            PathBuf::from("in.shp"),
            None,
            Path::new("output.geojson"),
            ".csv",
            "epsg:4326",
            7,
            None,
        );
        assert!(bad_format.is_err());

        let bad_crs = ConvertOptions::new(
            PathBuf::from("in.shp"),
            None,
            Path::new("output.geojson"),
            ".geojson",
            "",
            7,
            None,
        );
        assert!(bad_crs.is_err());
    }

    #[test]
    fn test_validate_round() {
        assert_eq!(validate_round(7).unwrap(), 7);
        assert_eq!(validate_round(-2).unwrap(), -2);
        assert!(validate_round(40).is_err());
    }
}
