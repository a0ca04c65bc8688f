//! Pipeline de conversion : chargement → reprojection → précision → écriture
//!
//! Chaque étape est un appel à la pile géospatiale (GDAL, PROJ, geo). Une
//! erreur interrompt le pipeline ; aucun résultat partiel n'est produit.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use geodata::{Crs, FeatureCollection, PrecisionStats};
use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ConvertOptions, OutputFormat};
use crate::export::Reprojector;
use crate::report::ConversionReport;

/// Étapes du pipeline, dans l'ordre d'exécution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Load,
    Reproject,
    Precision,
    Save,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Load, Stage::Reproject, Stage::Precision, Stage::Save];

    /// Libellé affiché dans la barre de progression
    pub fn label(self) -> &'static str {
        match self {
            Stage::Load => "Reading file",
            Stage::Reproject => "Setting CRS",
            Stage::Precision => "Rounding geometry",
            Stage::Save => "Writing file",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Reproject => "reproject",
            Stage::Precision => "precision",
            Stage::Save => "save",
        };
        f.write_str(name)
    }
}

/// Étape 1 : charge la couche demandée (ou la première) en mémoire
pub fn load(input: &Path, layer: Option<&str>) -> Result<FeatureCollection> {
    let collection = geodata::read(input, layer)?;

    info!(
        input = %input.display(),
        layer = %collection.layer_name,
        features = collection.len(),
        fields = collection.fields.len(),
        crs = %collection.crs.as_ref().map(|c| c.to_string()).unwrap_or_default(),
        "Loaded"
    );

    Ok(collection)
}

/// Étape 2 : reprojette la géométrie active vers le CRS cible
pub fn reproject(collection: &mut FeatureCollection, target: &Crs) -> Result<()> {
    let source = collection.crs.clone().ok_or_else(|| {
        anyhow!(
            "Cannot transform naive geometries. Layer '{}' has no CRS defined",
            collection.layer_name
        )
    })?;

    let reprojector = Reprojector::new(&source, target)?;
    if reprojector.is_identity() {
        debug!(crs = %target, "Source CRS matches target, no reprojection");
    } else {
        for feature in &mut collection.features {
            if let Some(geometry) = &feature.geometry {
                let transformed = reprojector
                    .transform_geometry(geometry)
                    .context(format!("Failed to reproject feature {:?}", feature.fid))?;
                feature.geometry = Some(transformed);
            }
        }
        info!(from = %reprojector.source(), to = %reprojector.target(), "Reprojected");
    }

    collection.crs = Some(target.clone());
    Ok(())
}

/// Étape 3 : accroche les coordonnées sur la grille `10^-decimals`
pub fn simplify_precision(collection: &mut FeatureCollection, decimals: i32) -> Result<PrecisionStats> {
    let stats = geodata::set_collection_precision(collection, decimals);

    info!(
        decimals,
        snapped = stats.snapped,
        collapsed = stats.collapsed,
        "Rounded coordinates"
    );
    if stats.collapsed > 0 {
        warn!(
            "{} geometries collapsed at {} decimals and were written as null",
            stats.collapsed,
            decimals
        );
    }

    Ok(stats)
}

/// Étape 4 : écrit la collection avec le driver du format
pub fn save(collection: &FeatureCollection, output: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::GeoJson => crate::export::geojson::export_to_geojson(collection, output)?,
        OutputFormat::Shapefile | OutputFormat::GeoPackage => {
            crate::export::ogr::export_with_driver(collection, format.driver(), output)?
        }
    }

    info!(
        output = %output.display(),
        driver = format.driver(),
        features = collection.len(),
        "Written"
    );

    Ok(())
}

/// Exécute les quatre étapes dans l'ordre
pub fn run(options: &ConvertOptions, progress: &ProgressBar) -> Result<ConversionReport> {
    let started_at = Instant::now();
    let mut report = ConversionReport::new(
        &options.input,
        &options.output,
        options.format,
        options.crs.definition(),
        options.round,
    );

    let step = |stage: Stage| {
        progress.set_message(stage.label());
        (stage, Instant::now())
    };

    let (stage, t) = step(Stage::Load);
    let mut collection = load(&options.input, options.layer.as_deref())
        .context(format!("Failed to read {}", options.input.display()))?;
    report.layer = collection.layer_name.clone();
    report.features_read = collection.len();
    report.source_crs = collection.crs.as_ref().map(|c| c.to_string());
    report.record_stage(stage, t.elapsed());
    progress.inc(1);

    let (stage, t) = step(Stage::Reproject);
    reproject(&mut collection, &options.crs)
        .context(format!("Failed to set CRS {}", options.crs))?;
    report.record_stage(stage, t.elapsed());
    progress.inc(1);

    let (stage, t) = step(Stage::Precision);
    let stats = simplify_precision(&mut collection, options.round)
        .context("Failed to round geometry")?;
    report.collapsed_geometries = stats.collapsed;
    report.record_stage(stage, t.elapsed());
    progress.inc(1);

    let (stage, t) = step(Stage::Save);
    save(&collection, &options.output, options.format)
        .context(format!("Failed to write {}", options.output.display()))?;
    report.features_written = collection.len();
    report.null_geometries = collection.null_geometries();
    report.record_stage(stage, t.elapsed());
    progress.inc(1);

    report.finalize(started_at.elapsed());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, Point};
    use geodata::Feature;

    fn point_collection(crs: Option<Crs>) -> FeatureCollection {
        FeatureCollection {
            layer_name: "points".to_string(),
            crs,
            fields: vec![],
            features: vec![Feature {
                fid: Some(0),
                geometry: Some(Geometry::Point(Point::new(2.352221912345, 48.856613987654))),
                attributes: vec![],
            }],
        }
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(Stage::ALL[0], Stage::Load);
        assert_eq!(Stage::ALL[3], Stage::Save);
        assert_eq!(Stage::Precision.to_string(), "precision");
    }

    #[test]
    fn test_reproject_naive_geometries_fails() {
        let mut collection = point_collection(None);
        let err = reproject(&mut collection, &Crs::wgs84()).unwrap_err();
        assert!(err.to_string().contains("Cannot transform naive geometries"));
    }

    #[test]
    fn test_reproject_identity_sets_crs() {
        let mut collection = point_collection(Some(Crs::parse("epsg:4326").unwrap()));
        let before = collection.features[0].geometry.clone();
        reproject(&mut collection, &Crs::wgs84()).unwrap();
        assert_eq!(collection.features[0].geometry, before);
        assert_eq!(collection.crs, Some(Crs::wgs84()));
    }

    #[test]
    fn test_simplify_precision() {
        let mut collection = point_collection(Some(Crs::wgs84()));
        let stats = simplify_precision(&mut collection, 3).unwrap();
        assert_eq!(stats.snapped, 1);
        assert_eq!(
            collection.features[0].geometry,
            Some(Geometry::Point(Point::new(2.352, 48.857)))
        );
    }

    #[test]
    fn test_run_missing_input() {
        let options = ConvertOptions::new(
            "/nonexistent/input.shp".into(),
            None,
            Path::new("/tmp/never_written.geojson"),
            ".geojson",
            "epsg:4326",
            7,
            None,
        )
        .unwrap();

        let err = run(&options, &ProgressBar::hidden()).unwrap_err();
        assert!(format!("{:#}", err).contains("No such file"));
        assert!(!Path::new("/tmp/never_written.geojson").exists());
    }
}
