//! Asset catalog data model.
//!
//! The catalog is a static JSON document mapping semantic categories to model
//! names and each model name to its cached bounding-box anchors. It is loaded
//! once at startup and never mutated; per-session filtering (for example
//! restricting counters to one wood family) produces a fresh [`SceneCatalog`]
//! instead of editing shared tables.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 3D point in worldspace meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Named bounding-box anchor points of a model, relative to its pivot.
///
/// `left`/`right` span the x axis, `front`/`back` span the z axis, `top` is
/// the highest point and `center` the centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBounds {
    pub left: Vec3,
    pub right: Vec3,
    pub front: Vec3,
    pub back: Vec3,
    pub top: Vec3,
    pub center: Vec3,
}

impl ModelBounds {
    /// Extents as `[width, height, depth]`.
    pub fn extents(&self) -> [f32; 3] {
        [
            (self.right.x - self.left.x).abs(),
            self.top.y,
            (self.back.z - self.front.z).abs(),
        ]
    }

    /// The longer horizontal side. Footprints are compared by this value.
    pub fn long_side(&self) -> f32 {
        let [width, _, depth] = self.extents();
        width.max(depth)
    }

    /// The shorter horizontal side.
    pub fn short_side(&self) -> f32 {
        let [width, _, depth] = self.extents();
        width.min(depth)
    }
}

/// Immutable descriptor for one catalog model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub name: String,
    pub bounds: ModelBounds,
}

/// Cell size and skip probability for filling a surface with small objects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrangementParams {
    pub cell_size: f32,
    pub density: f32,
}

impl Default for ArrangementParams {
    fn default() -> Self {
        Self {
            cell_size: 0.05,
            density: 0.4,
        }
    }
}

/// Shelf metadata: the (x, z) span of a board in the model frame and the y
/// level of each board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfSpec {
    pub size: [f32; 2],
    pub ys: Vec<f32>,
}

/// Raw on-disk catalog schema.
#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    models: Vec<ModelRecord>,
    categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    kinematic_categories: Vec<String>,
    #[serde(default)]
    unique_categories: Vec<String>,
    #[serde(default)]
    canonical_rotations: BTreeMap<String, f32>,
    #[serde(default)]
    rectangular_arrangements: BTreeMap<String, ArrangementParams>,
    #[serde(default)]
    shelves: BTreeMap<String, ShelfSpec>,
    #[serde(default)]
    on_top_of: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    on_shelf: Vec<String>,
    #[serde(default)]
    wood_families: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("category {category:?} references unknown model {model:?}")]
    UnknownModel { category: String, model: String },
    #[error("shelf metadata references unknown model {0:?}")]
    UnknownShelfModel(String),
    #[error("unknown wood family {0:?}")]
    UnknownWoodFamily(String),
}

/// The validated, loaded catalog. Shared read-only across sessions.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: BTreeMap<String, ModelRecord>,
    categories: BTreeMap<String, Vec<String>>,
    kinematic_categories: Vec<String>,
    unique_categories: Vec<String>,
    canonical_rotations: BTreeMap<String, f32>,
    rectangular_arrangements: BTreeMap<String, ArrangementParams>,
    shelves: BTreeMap<String, ShelfSpec>,
    on_top_of: BTreeMap<String, Vec<String>>,
    on_shelf: Vec<String>,
    wood_families: BTreeMap<String, String>,
}

impl Catalog {
    pub fn parse(input: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(input)?;
        let mut records = BTreeMap::new();
        for record in file.models {
            records.insert(record.name.clone(), record);
        }
        for (category, names) in &file.categories {
            for name in names {
                if !records.contains_key(name) {
                    return Err(CatalogError::UnknownModel {
                        category: category.clone(),
                        model: name.clone(),
                    });
                }
            }
        }
        for name in file.shelves.keys() {
            if !records.contains_key(name) {
                return Err(CatalogError::UnknownShelfModel(name.clone()));
            }
        }
        Ok(Self {
            records,
            categories: file.categories,
            kinematic_categories: file.kinematic_categories,
            unique_categories: file.unique_categories,
            canonical_rotations: file.canonical_rotations,
            rectangular_arrangements: file.rectangular_arrangements,
            shelves: file.shelves,
            on_top_of: file.on_top_of,
            on_shelf: file.on_shelf,
            wood_families: file.wood_families,
        })
    }

    pub fn record(&self, name: &str) -> Option<&ModelRecord> {
        self.records.get(name)
    }

    pub fn category(&self, name: &str) -> Option<&[String]> {
        self.categories.get(name).map(Vec::as_slice)
    }

    pub fn wood_families(&self) -> impl Iterator<Item = &str> {
        self.wood_families.keys().map(String::as_str)
    }
}

/// Categories whose model lists are restricted to one wood family per session.
const WOOD_FILTERED_CATEGORIES: [&str; 2] = ["kitchen_counter", "wall_cabinet"];

/// An immutable per-session view of the catalog.
///
/// Construction applies the session's wood-family filter once; afterwards the
/// view never changes, so concurrent or repeated generation sessions cannot
/// interfere with each other through shared tables.
#[derive(Debug, Clone)]
pub struct SceneCatalog {
    categories: BTreeMap<String, Vec<ModelRecord>>,
    kinematic_categories: Vec<String>,
    unique_categories: Vec<String>,
    canonical_rotations: BTreeMap<String, f32>,
    rectangular_arrangements: BTreeMap<String, ArrangementParams>,
    shelves: BTreeMap<String, ShelfSpec>,
    on_top_of: BTreeMap<String, Vec<String>>,
    on_shelf: Vec<String>,
    counter_top_material: String,
}

impl SceneCatalog {
    /// Build a session view, restricting wood-filtered categories to models
    /// whose name contains `wood_family`.
    pub fn new(catalog: &Catalog, wood_family: &str) -> Result<Self, CatalogError> {
        let counter_top_material = catalog
            .wood_families
            .get(wood_family)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownWoodFamily(wood_family.to_string()))?;
        let mut categories = BTreeMap::new();
        for (category, names) in &catalog.categories {
            let filtered: Vec<ModelRecord> = names
                .iter()
                .filter(|name| {
                    !WOOD_FILTERED_CATEGORIES.contains(&category.as_str())
                        || name.contains(wood_family)
                })
                .filter_map(|name| catalog.records.get(name).cloned())
                .collect();
            categories.insert(category.clone(), filtered);
        }
        Ok(Self {
            categories,
            kinematic_categories: catalog.kinematic_categories.clone(),
            unique_categories: catalog.unique_categories.clone(),
            canonical_rotations: catalog.canonical_rotations.clone(),
            rectangular_arrangements: catalog.rectangular_arrangements.clone(),
            shelves: catalog.shelves.clone(),
            on_top_of: catalog.on_top_of.clone(),
            on_shelf: catalog.on_shelf.clone(),
            counter_top_material,
        })
    }

    /// Build a session view without any wood-family restriction.
    pub fn unfiltered(catalog: &Catalog) -> Self {
        let mut categories = BTreeMap::new();
        for (category, names) in &catalog.categories {
            let records: Vec<ModelRecord> = names
                .iter()
                .filter_map(|name| catalog.records.get(name).cloned())
                .collect();
            categories.insert(category.clone(), records);
        }
        Self {
            categories,
            kinematic_categories: catalog.kinematic_categories.clone(),
            unique_categories: catalog.unique_categories.clone(),
            canonical_rotations: catalog.canonical_rotations.clone(),
            rectangular_arrangements: catalog.rectangular_arrangements.clone(),
            shelves: catalog.shelves.clone(),
            on_top_of: catalog.on_top_of.clone(),
            on_shelf: catalog.on_shelf.clone(),
            counter_top_material: String::new(),
        }
    }

    pub fn models_in(&self, category: &str) -> Option<&[ModelRecord]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    pub fn record(&self, name: &str) -> Option<&ModelRecord> {
        self.categories
            .values()
            .flat_map(|records| records.iter())
            .find(|record| record.name == name)
    }

    pub fn is_kinematic(&self, category: &str) -> bool {
        self.kinematic_categories.iter().any(|c| c == category)
    }

    pub fn is_unique(&self, category: &str) -> bool {
        self.unique_categories.iter().any(|c| c == category)
    }

    /// Canonical yaw offset baked into a model's mesh, in degrees.
    pub fn canonical_rotation(&self, model: &str) -> f32 {
        self.canonical_rotations.get(model).copied().unwrap_or(0.0)
    }

    pub fn arrangement_params(&self, category: &str) -> ArrangementParams {
        self.rectangular_arrangements
            .get(category)
            .copied()
            .unwrap_or_default()
    }

    pub fn shelf(&self, model: &str) -> Option<&ShelfSpec> {
        self.shelves.get(model)
    }

    /// Categories whose models may be placed on top of `category`.
    pub fn children_on_top(&self, category: &str) -> &[String] {
        self.on_top_of
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Categories whose models may be placed on shelf boards.
    pub fn shelf_categories(&self) -> &[String] {
        &self.on_shelf
    }

    pub fn counter_top_material(&self) -> &str {
        &self.counter_top_material
    }
}

/// Read and validate a catalog file from disk.
pub fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let catalog = Catalog::parse(&text)
        .with_context(|| format!("parsing catalog {}", path.display()))?;
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "models": [
            {
                "name": "counter_white_wood_a",
                "bounds": {
                    "left": {"x": -0.5, "y": 0.0, "z": 0.0},
                    "right": {"x": 0.5, "y": 0.0, "z": 0.0},
                    "front": {"x": 0.0, "y": 0.0, "z": -0.3},
                    "back": {"x": 0.0, "y": 0.0, "z": 0.3},
                    "top": {"x": 0.0, "y": 0.9, "z": 0.0},
                    "center": {"x": 0.0, "y": 0.45, "z": 0.0}
                }
            },
            {
                "name": "counter_wood_beach_honey_a",
                "bounds": {
                    "left": {"x": -0.6, "y": 0.0, "z": 0.0},
                    "right": {"x": 0.6, "y": 0.0, "z": 0.0},
                    "front": {"x": 0.0, "y": 0.0, "z": -0.3},
                    "back": {"x": 0.0, "y": 0.0, "z": 0.3},
                    "top": {"x": 0.0, "y": 0.9, "z": 0.0},
                    "center": {"x": 0.0, "y": 0.45, "z": 0.0}
                }
            }
        ],
        "categories": {
            "kitchen_counter": ["counter_white_wood_a", "counter_wood_beach_honey_a"]
        },
        "kinematic_categories": ["kitchen_counter"],
        "unique_categories": [],
        "wood_families": {
            "white_wood": "granite_beige_french",
            "wood_beach_honey": "granite_black"
        }
    }"#;

    #[test]
    fn parses_and_validates() {
        let catalog = Catalog::parse(FIXTURE).expect("fixture parses");
        let record = catalog.record("counter_white_wood_a").expect("record");
        assert_eq!(record.bounds.extents(), [1.0, 0.9, 0.6]);
        assert_eq!(record.bounds.long_side(), 1.0);
        assert_eq!(
            catalog.category("kitchen_counter").map(|c| c.len()),
            Some(2)
        );
    }

    #[test]
    fn rejects_unknown_model_reference() {
        let broken = FIXTURE.replace("counter_wood_beach_honey_a\"]", "missing_model\"]");
        match Catalog::parse(&broken) {
            Err(CatalogError::UnknownModel { category, model }) => {
                assert_eq!(category, "kitchen_counter");
                assert_eq!(model, "missing_model");
            }
            other => panic!("expected UnknownModel, got {other:?}"),
        }
    }

    #[test]
    fn scene_catalog_filters_wood_family() {
        let catalog = Catalog::parse(FIXTURE).expect("fixture parses");
        let scene = SceneCatalog::new(&catalog, "white_wood").expect("known family");
        let counters = scene.models_in("kitchen_counter").expect("category");
        assert_eq!(counters.len(), 1);
        assert_eq!(counters[0].name, "counter_white_wood_a");
        assert_eq!(scene.counter_top_material(), "granite_beige_french");
        assert!(scene.is_kinematic("kitchen_counter"));
        assert!(!scene.is_kinematic("plate"));
    }

    #[test]
    fn unknown_wood_family_is_an_error() {
        let catalog = Catalog::parse(FIXTURE).expect("fixture parses");
        assert!(matches!(
            SceneCatalog::new(&catalog, "mahogany"),
            Err(CatalogError::UnknownWoodFamily(_))
        ));
    }
}
