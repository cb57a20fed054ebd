//! Category-to-model selection.
//!
//! Selection draws only from the session catalog: an arrangement can never
//! invent geometry that is not in the loaded tables. Unknown categories are
//! warned about and skipped so a stale category plan degrades to a sparser
//! scene instead of a hard failure.

use hearth_formats::{ModelRecord, SceneCatalog, Vec3};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::PlaceError;
use crate::geometry::{
    direction_offset, footprint_fits_in_region, lateral_footprint, model_fits_in_region,
    CardinalDirection, Region,
};

/// A model chosen for placement, along with the category that supplied it.
#[derive(Debug, Clone, Copy)]
pub struct ModelChoice<'a> {
    pub record: &'a ModelRecord,
    pub category: &'a str,
}

/// Pick a uniformly random model across `categories` whose longer horizontal
/// side is strictly smaller than `max_footprint`.
pub fn resolve<'a>(
    catalog: &'a SceneCatalog,
    categories: &[&'a str],
    max_footprint: f32,
    rng: &mut impl Rng,
) -> Result<ModelChoice<'a>, PlaceError> {
    let mut candidates: Vec<ModelChoice<'a>> = Vec::new();
    for &category in categories {
        let Some(records) = catalog.models_in(category) else {
            log::warn!("invalid model category {category:?}; skipping");
            continue;
        };
        for record in records {
            if record.bounds.long_side() < max_footprint {
                candidates.push(ModelChoice { record, category });
            }
        }
    }
    if candidates.is_empty() {
        return Err(PlaceError::NoFit(categories.join(", ")));
    }
    let index = rng.gen_range(0..candidates.len());
    Ok(candidates[index])
}

/// Pick a model from `category` that, anchored at `anchor` (optionally offset
/// along `direction` by its own span), fits inside `region` and within
/// `max_extent` of remaining run length.
///
/// For lateral placements the fit test uses the footprint the model occupies
/// after its wall and canonical rotations, not the footprint as modeled.
/// Candidates are tried in a shuffled order so repeated calls with the same
/// category do not always yield the same model.
pub fn model_fitting_in_region<'a>(
    catalog: &'a SceneCatalog,
    category: &str,
    anchor: Vec3,
    direction: Option<CardinalDirection>,
    region: &Region,
    max_extent: f32,
    rng: &mut impl Rng,
) -> Result<(&'a ModelRecord, Vec3), PlaceError> {
    let Some(records) = catalog.models_in(category) else {
        log::warn!("invalid model category {category:?}; skipping");
        return Err(PlaceError::InvalidCategory(category.to_string()));
    };
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.shuffle(rng);
    for index in order {
        let record = &records[index];
        let extents = record.bounds.extents();
        match direction {
            Some(direction) => {
                let canonical = catalog.canonical_rotation(&record.name);
                let footprint = lateral_footprint(extents, direction, canonical);
                let along = match direction {
                    CardinalDirection::East | CardinalDirection::West => footprint.0,
                    CardinalDirection::North | CardinalDirection::South => footprint.1,
                };
                if along > max_extent {
                    continue;
                }
                let offset = direction_offset(along, direction);
                let position = Vec3::new(anchor.x + offset.x, anchor.y, anchor.z + offset.z);
                if footprint_fits_in_region(position, footprint, region) {
                    return Ok((record, position));
                }
            }
            None => {
                if extents[0] > max_extent {
                    continue;
                }
                if model_fits_in_region(&record.bounds, anchor, region) {
                    return Ok((record, anchor));
                }
            }
        }
    }
    Err(PlaceError::NoFit(category.to_string()))
}
