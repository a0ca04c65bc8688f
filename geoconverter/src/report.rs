//! Rapport de conversion
//!
//! Collecte les compteurs et durées de chaque étape du pipeline, pour un
//! résumé console et un export JSON optionnel.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::OutputFormat;
use crate::pipeline::Stage;

/// Durée d'une étape du pipeline
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub duration_secs: f64,
}

/// Rapport complet d'une conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Fichier d'entrée
    pub input: PathBuf,
    /// Couche lue
    pub layer: String,
    /// Fichier de sortie
    pub output: PathBuf,
    pub format: OutputFormat,
    /// CRS de la couche source (absent si non défini)
    pub source_crs: Option<String>,
    /// CRS de sortie
    pub target_crs: String,
    /// Décimales conservées
    pub precision: i32,

    // Compteurs
    /// Nombre de features lues
    pub features_read: usize,
    /// Nombre de features écrites
    pub features_written: usize,
    /// Nombre de géométries nulles en sortie
    pub null_geometries: usize,
    /// Nombre de géométries effondrées par la réduction de précision
    pub collapsed_geometries: usize,

    /// Durée de chaque étape
    pub stages: Vec<StageTiming>,
    /// Durée totale
    pub duration_secs: f64,
}

impl ConversionReport {
    /// Crée un rapport vide pour une conversion
    pub fn new(input: &Path, output: &Path, format: OutputFormat, target_crs: &str, precision: i32) -> Self {
        Self {
            input: input.to_path_buf(),
            layer: String::new(),
            output: output.to_path_buf(),
            format,
            source_crs: None,
            target_crs: target_crs.to_string(),
            precision,
            features_read: 0,
            features_written: 0,
            null_geometries: 0,
            collapsed_geometries: 0,
            stages: Vec::new(),
            duration_secs: 0.0,
        }
    }

    /// Enregistre la durée d'une étape
    pub fn record_stage(&mut self, stage: Stage, duration: Duration) {
        self.stages.push(StageTiming {
            stage,
            duration_secs: duration.as_secs_f64(),
        });
    }

    /// Finalise le rapport
    pub fn finalize(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Affiche le résumé
    pub fn print_summary(&self) {
        println!("=== Conversion ===");
        println!("Input: {} (layer: {})", self.input.display(), self.layer);
        println!("Output: {} ({})", self.output.display(), self.format.driver());
        println!(
            "CRS: {} -> {}",
            self.source_crs.as_deref().unwrap_or("undefined"),
            self.target_crs
        );
        println!("Precision: {} decimals", self.precision);
        println!(
            "Features: {} read, {} written",
            self.features_read, self.features_written
        );
        if self.null_geometries > 0 {
            println!("Null geometries: {}", self.null_geometries);
        }
        if self.collapsed_geometries > 0 {
            println!("Collapsed by rounding: {}", self.collapsed_geometries);
        }
        for timing in &self.stages {
            println!("  {:<10} {:.3}s", timing.stage.to_string(), timing.duration_secs);
        }
        println!("Duration: {:.2}s", self.duration_secs);
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .context(format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }
}
