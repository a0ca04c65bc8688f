//! Réduction de précision : accrochage des coordonnées sur une grille décimale
//!
//! La grille a un pas de `10^-decimals` (7 décimales ≈ 1 cm en degrés).
//! Après accrochage, les sommets consécutifs identiques sont fusionnés et les
//! géométries dégénérées (ligne d'un seul point, anneau plat) disparaissent.

use geo::{
    Area, Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};

use crate::types::FeatureCollection;

/// Compteurs de la passe de réduction de précision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrecisionStats {
    /// Géométries accrochées à la grille
    pub snapped: usize,
    /// Géométries devenues dégénérées (remplacées par une géométrie nulle)
    pub collapsed: usize,
}

/// Grille d'accrochage
#[derive(Debug, Clone, Copy)]
struct Grid {
    decimals: i32,
    scale: f64,
}

impl Grid {
    fn new(decimals: i32) -> Self {
        // decimals >= 0 : facteur multiplicatif exact (10^d)
        // decimals < 0 : pas entier exact (10^-d)
        let scale = 10_f64.powi(decimals.abs());
        Self { decimals, scale }
    }

    fn snap(&self, v: f64) -> f64 {
        if self.decimals >= 0 {
            (v * self.scale).round() / self.scale
        } else {
            (v / self.scale).round() * self.scale
        }
    }

    fn snap_coord(&self, c: Coord) -> Coord {
        Coord {
            x: self.snap(c.x),
            y: self.snap(c.y),
        }
    }

    fn snap_line(&self, ls: &LineString) -> LineString {
        let mut coords: Vec<Coord> = ls.0.iter().map(|c| self.snap_coord(*c)).collect();
        coords.dedup();
        LineString::new(coords)
    }
}

/// Accroche une géométrie sur la grille `10^-decimals`
///
/// Retourne `None` si la géométrie devient dégénérée.
pub fn set_precision(geom: &Geometry, decimals: i32) -> Option<Geometry> {
    snap_geometry(&Grid::new(decimals), geom)
}

/// Applique [`set_precision`] à toutes les géométries d'une collection
pub fn set_collection_precision(collection: &mut FeatureCollection, decimals: i32) -> PrecisionStats {
    let grid = Grid::new(decimals);
    let mut stats = PrecisionStats::default();

    for feature in &mut collection.features {
        if let Some(geom) = feature.geometry.take() {
            stats.snapped += 1;
            feature.geometry = snap_geometry(&grid, &geom);
            if feature.geometry.is_none() {
                stats.collapsed += 1;
            }
        }
    }

    stats
}

fn snap_geometry(grid: &Grid, geom: &Geometry) -> Option<Geometry> {
    match geom {
        Geometry::Point(p) => Some(Geometry::Point(Point::from(grid.snap_coord(p.0)))),
        Geometry::Line(l) => {
            snap_linestring(grid, &LineString::new(vec![l.start, l.end])).map(Geometry::LineString)
        }
        Geometry::LineString(ls) => snap_linestring(grid, ls).map(Geometry::LineString),
        Geometry::Polygon(poly) => snap_polygon(grid, poly).map(Geometry::Polygon),
        Geometry::Rect(r) => snap_polygon(grid, &r.to_polygon()).map(Geometry::Polygon),
        Geometry::Triangle(t) => snap_polygon(grid, &t.to_polygon()).map(Geometry::Polygon),
        Geometry::MultiPoint(mp) => {
            let points: Vec<Point> = mp.0.iter().map(|p| Point::from(grid.snap_coord(p.0))).collect();
            non_empty(points).map(|p| Geometry::MultiPoint(MultiPoint::new(p)))
        }
        Geometry::MultiLineString(mls) => {
            let lines: Vec<LineString> = mls.0.iter().filter_map(|ls| snap_linestring(grid, ls)).collect();
            non_empty(lines).map(|l| Geometry::MultiLineString(MultiLineString::new(l)))
        }
        Geometry::MultiPolygon(mpoly) => {
            let polys: Vec<Polygon> = mpoly.0.iter().filter_map(|p| snap_polygon(grid, p)).collect();
            non_empty(polys).map(|p| Geometry::MultiPolygon(MultiPolygon::new(p)))
        }
        Geometry::GeometryCollection(gc) => {
            let geoms: Vec<Geometry> = gc.0.iter().filter_map(|g| snap_geometry(grid, g)).collect();
            non_empty(geoms).map(|g| Geometry::GeometryCollection(GeometryCollection::new_from(g)))
        }
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn snap_linestring(grid: &Grid, ls: &LineString) -> Option<LineString> {
    let snapped = grid.snap_line(ls);
    if snapped.0.len() < 2 {
        None
    } else {
        Some(snapped)
    }
}

/// Un anneau valide a au moins 4 sommets (fermé) et une aire non nulle
fn snap_ring(grid: &Grid, ring: &LineString) -> Option<LineString> {
    let mut snapped = grid.snap_line(ring);
    snapped.close();
    if snapped.0.len() < 4 {
        return None;
    }
    if Polygon::new(snapped.clone(), vec![]).unsigned_area() == 0.0 {
        return None;
    }
    Some(snapped)
}

fn snap_polygon(grid: &Grid, poly: &Polygon) -> Option<Polygon> {
    let exterior = snap_ring(grid, poly.exterior())?;
    let interiors: Vec<LineString> = poly
        .interiors()
        .iter()
        .filter_map(|ring| snap_ring(grid, ring))
        .collect();
    Some(Polygon::new(exterior, interiors))
}
