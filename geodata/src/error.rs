//! Types d'erreurs pour le crate geodata

use std::path::PathBuf;

use thiserror::Error;

/// Erreurs pouvant survenir lors du chargement d'un jeu de données vecteur
#[derive(Debug, Error)]
pub enum GeodataError {
    /// Le chemin d'entrée n'existe pas
    #[error("{}: No such file or directory", .0.display())]
    NotFound(PathBuf),

    /// Erreur remontée par GDAL/OGR
    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),

    /// Couche demandée absente du jeu de données
    #[error("Layer '{layer}' not found in {}", .path.display())]
    LayerNotFound { path: PathBuf, layer: String },

    /// Aucune couche vecteur dans le jeu de données
    #[error("No vector layer found in {}", .0.display())]
    NoLayer(PathBuf),

    /// Système de coordonnées non reconnu
    #[error("Invalid CRS '{input}': {reason}")]
    InvalidCrs { input: String, reason: String },
}

impl GeodataError {
    /// Crée une erreur de CRS invalide avec contexte
    pub fn invalid_crs(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCrs {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Alias de résultat du crate
pub type Result<T> = std::result::Result<T, GeodataError>;
