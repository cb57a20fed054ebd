//! Kitchen scene recipes.
//!
//! A kitchen is a work triangle of counters and appliances along one or more
//! walls, a table near the room center, and secondary objects sprinkled
//! along the remaining free edges. Everything downstream of the seed is
//! deterministic: the same seed, catalog and region always produce the same
//! command plan.

use hearth_formats::{Catalog, SceneCatalog, Vec3};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::arrangement::Composer;
use crate::command::CommandPlan;
use crate::error::GenError;
use crate::geometry::{CardinalDirection, Region};
use crate::resolver;

/// Gap between a wall and the back of a wall-aligned arrangement.
const WALL_DEPTH: f32 = 0.28;

/// Extra clearance at the start of a secondary run so it does not collide
/// with the arrangement already standing in the shared corner.
const CORNER_CLEARANCE: f32 = 0.6081842 * 2.0;

/// How far the table shifts away from each wall the work triangle occupies.
const TABLE_WALL_OFFSET: f32 = 0.1;

const SECONDARY_CATEGORIES: [&str; 3] = ["basket", "floor_lamp", "side_table"];

const STRAIGHT_RUN: [&str; 7] = [
    "refrigerator",
    "dishwasher",
    "sink",
    "kitchen_counter",
    "stove",
    "kitchen_counter",
    "shelf",
];
const PARALLEL_RUN_A: [&str; 5] = [
    "kitchen_counter",
    "stove",
    "kitchen_counter",
    "kitchen_counter",
    "kitchen_counter",
];
const PARALLEL_RUN_B: [&str; 5] = [
    "refrigerator",
    "dishwasher",
    "sink",
    "kitchen_counter",
    "kitchen_counter",
];
const L_LONG_RUN: [&str; 5] = ["sink", "dishwasher", "stove", "kitchen_counter", "shelf"];
const L_SHORT_RUNS: [[&str; 4]; 2] = [
    ["kitchen_counter", "kitchen_counter", "refrigerator", "shelf"],
    ["kitchen_counter", "refrigerator", "kitchen_counter", "shelf"],
];
const U_LONG_RUN: [&str; 4] = ["sink", "kitchen_counter", "stove", "kitchen_counter"];
const U_SHORT_RUN_A: [&str; 4] = ["kitchen_counter", "refrigerator", "kitchen_counter", "shelf"];
const U_SHORT_RUN_B: [&str; 4] = [
    "kitchen_counter",
    "dishwasher",
    "kitchen_counter",
    "kitchen_counter",
];

/// The work-triangle shapes, weighted toward wrap-around kitchens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Straight,
    Parallel,
    LShaped,
    UShaped,
}

fn roll_layout(rng: &mut StdRng) -> Layout {
    let roll: f32 = rng.gen();
    if roll < 0.2 {
        Layout::Straight
    } else if roll < 0.4 {
        Layout::Parallel
    } else if roll < 0.6 {
        Layout::LShaped
    } else {
        Layout::UShaped
    }
}

/// Generate a complete kitchen plan for one region.
///
/// Picks a wood family for the session (when the catalog defines any), lays
/// out the work triangle, the table, and the secondary objects, and returns
/// the finished command plan.
pub fn compose_kitchen(
    catalog: &Catalog,
    region: Region,
    seed: u64,
) -> Result<CommandPlan, GenError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let families: Vec<&str> = catalog.wood_families().collect();
    let scene = match families.as_slice() {
        [] => SceneCatalog::unfiltered(catalog),
        families => {
            let family = families[rng.gen_range(0..families.len())];
            log::debug!("session wood family: {family}");
            SceneCatalog::new(catalog, family)?
        }
    };
    let mut composer = Composer::new(&scene, region, &mut rng);
    let used_walls = add_work_triangle(&mut composer);
    add_table(&mut composer, &used_walls);
    add_secondary_objects(&mut composer);
    Ok(composer.finish())
}

/// Walls whose length is the longer room dimension, and that length.
fn longer_walls(region: &Region) -> (&'static [CardinalDirection], f32) {
    if region.width() < region.depth() {
        (
            &[CardinalDirection::West, CardinalDirection::East],
            region.depth(),
        )
    } else {
        (
            &[CardinalDirection::North, CardinalDirection::South],
            region.width(),
        )
    }
}

fn shorter_walls(region: &Region) -> (&'static [CardinalDirection], f32) {
    if region.width() < region.depth() {
        (
            &[CardinalDirection::North, CardinalDirection::South],
            region.width(),
        )
    } else {
        (
            &[CardinalDirection::West, CardinalDirection::East],
            region.depth(),
        )
    }
}

/// Start position of a lateral run along `wall`, one wall-depth out from the
/// corner where the run direction begins. `clear_corner` shifts the start
/// past an arrangement that already wraps around that corner.
fn run_start(region: &Region, wall: CardinalDirection, clear_corner: bool) -> Vec3 {
    let clearance = if clear_corner { CORNER_CLEARANCE } else { 0.0 };
    match wall {
        // North/south runs travel east, so they start at x_min.
        CardinalDirection::North => Vec3::new(
            region.x_min + WALL_DEPTH + clearance,
            0.0,
            region.z_max - WALL_DEPTH,
        ),
        CardinalDirection::South => Vec3::new(
            region.x_min + WALL_DEPTH + clearance,
            0.0,
            region.z_min + WALL_DEPTH,
        ),
        // East/west runs travel north, so they start at z_min.
        CardinalDirection::West => Vec3::new(
            region.x_min + WALL_DEPTH,
            0.0,
            region.z_min + WALL_DEPTH + clearance,
        ),
        CardinalDirection::East => Vec3::new(
            region.x_max - WALL_DEPTH,
            0.0,
            region.z_min + WALL_DEPTH + clearance,
        ),
    }
}

/// Lay out the work triangle, returning the walls it occupies.
fn add_work_triangle(composer: &mut Composer<'_>) -> Vec<CardinalDirection> {
    let region = *composer.region();
    match roll_layout(composer.rng()) {
        Layout::Straight => {
            let (walls, length) = longer_walls(&region);
            let wall = walls[composer.rng().gen_range(0..walls.len())];
            let mut categories = STRAIGHT_RUN.to_vec();
            if composer.rng().gen::<f32>() < 0.5 {
                categories.reverse();
            }
            composer.lateral_run(wall, run_start(&region, wall, false), &categories, length);
            vec![wall]
        }
        Layout::Parallel => {
            let (walls, length) = longer_walls(&region);
            let mut walls = walls.to_vec();
            walls.shuffle(composer.rng());
            for (wall, run) in walls.iter().zip([PARALLEL_RUN_A, PARALLEL_RUN_B]) {
                let mut categories = run.to_vec();
                if composer.rng().gen::<f32>() < 0.5 {
                    categories.reverse();
                }
                composer.lateral_run(*wall, run_start(&region, *wall, false), &categories, length);
            }
            walls
        }
        Layout::LShaped => {
            let (long_walls, long_length) = longer_walls(&region);
            let long_wall = long_walls[composer.rng().gen_range(0..long_walls.len())];
            composer.lateral_run(
                long_wall,
                run_start(&region, long_wall, false),
                &L_LONG_RUN,
                long_length,
            );
            let (short_walls, short_length) = shorter_walls(&region);
            let short_wall = short_walls[composer.rng().gen_range(0..short_walls.len())];
            let index = composer.rng().gen_range(0..L_SHORT_RUNS.len());
            composer.lateral_run(
                short_wall,
                run_start(&region, short_wall, true),
                &L_SHORT_RUNS[index],
                short_length - CORNER_CLEARANCE,
            );
            vec![long_wall, short_wall]
        }
        Layout::UShaped => {
            let (long_walls, long_length) = longer_walls(&region);
            let long_wall = long_walls[composer.rng().gen_range(0..long_walls.len())];
            let mut categories = U_LONG_RUN.to_vec();
            if composer.rng().gen::<f32>() < 0.5 {
                categories.reverse();
            }
            // Pad with counters so the run spans the whole wall.
            categories.extend(std::iter::repeat("kitchen_counter").take(20));
            composer.lateral_run(
                long_wall,
                run_start(&region, long_wall, false),
                &categories,
                long_length,
            );
            let (short_walls, short_length) = shorter_walls(&region);
            let mut short_walls = short_walls.to_vec();
            if composer.rng().gen::<f32>() < 0.5 {
                short_walls.reverse();
            }
            for (wall, run) in short_walls.iter().zip([U_SHORT_RUN_A, U_SHORT_RUN_B]) {
                composer.lateral_run(
                    *wall,
                    run_start(&region, *wall, true),
                    &run,
                    short_length - CORNER_CLEARANCE,
                );
            }
            let mut used = vec![long_wall];
            used.extend(short_walls);
            used
        }
    }
}

/// The table sits near the room center, nudged away from the walls the work
/// triangle occupies, with a small random yaw.
fn add_table(composer: &mut Composer<'_>, used_walls: &[CardinalDirection]) {
    let center = composer.region().center();
    let mut anchor = Vec3::new(
        center.x + composer.rng().gen_range(-0.1..0.1),
        0.0,
        center.z + composer.rng().gen_range(-0.1..0.1),
    );
    for wall in used_walls {
        match wall {
            CardinalDirection::North => anchor.z -= TABLE_WALL_OFFSET,
            CardinalDirection::South => anchor.z += TABLE_WALL_OFFSET,
            CardinalDirection::East => anchor.x -= TABLE_WALL_OFFSET,
            CardinalDirection::West => anchor.x += TABLE_WALL_OFFSET,
        }
    }
    let yaw = composer.rng().gen_range(-10.0..10.0);
    if let Err(err) = composer.add_kitchen_table(anchor, yaw, true) {
        log::debug!("no table: {err}");
    }
}

/// Sprinkle lamps, side tables and baskets over the free room-grid cells
/// along the edges of the region. Most candidate cells are skipped.
fn add_secondary_objects(composer: &mut Composer<'_>) {
    let catalog = composer.catalog();
    for spot in composer.free_edge_positions() {
        if composer.rng().gen::<f32>() > 0.125 {
            continue;
        }
        let category =
            SECONDARY_CATEGORIES[composer.rng().gen_range(0..SECONDARY_CATEGORIES.len())];
        let yaw = if category == "side_table" {
            if composer.rng().gen::<f32>() < 0.5 {
                90.0
            } else {
                0.0
            }
        } else {
            composer.rng().gen_range(0.0..360.0)
        };
        let position = Vec3::new(
            spot.x + composer.rng().gen_range(-0.05..0.05),
            0.0,
            spot.z + composer.rng().gen_range(-0.05..0.05),
        );
        let choice = match resolver::resolve(catalog, &[category], f32::INFINITY, composer.rng()) {
            Ok(choice) => choice,
            Err(err) => {
                log::debug!("no secondary {category}: {err}");
                continue;
            }
        };
        if !composer.fits_in_region(choice.record, position) {
            continue;
        }
        composer.add_model(choice.record, position, yaw, true);
        if category == "basket" {
            fill_basket(composer, choice.record.bounds.extents(), position);
        }
    }
}

/// Drop a few half-scale items into a basket at stacked heights so physics
/// settles them into a pile.
fn fill_basket(composer: &mut Composer<'_>, extents: [f32; 3], position: Vec3) {
    let catalog = composer.catalog();
    let categories: Vec<&str> = catalog
        .children_on_top("basket")
        .iter()
        .map(String::as_str)
        .collect();
    if categories.is_empty() {
        return;
    }
    let radius = extents[0].min(extents[2]) * 0.6 / 2.0;
    let mut drop_y = extents[1];
    let count = composer.rng().gen_range(4..6) - 2;
    for _ in 0..count {
        let choice = match resolver::resolve(catalog, &categories, f32::INFINITY, composer.rng()) {
            Ok(choice) => choice,
            Err(err) => {
                log::debug!("empty basket: {err}");
                return;
            }
        };
        let angle = composer.rng().gen_range(0.0..std::f32::consts::TAU);
        let distance = radius * composer.rng().gen::<f32>().sqrt();
        let item_position = Vec3::new(
            position.x + distance * angle.cos(),
            drop_y,
            position.z + distance * angle.sin(),
        );
        let rotation = Vec3::new(
            composer.rng().gen_range(0.0..360.0),
            composer.rng().gen_range(0.0..360.0),
            composer.rng().gen_range(0.0..360.0),
        );
        let name = choice.record.name.clone();
        composer.add_prop(&name, item_position, rotation, Some(Vec3::new(0.5, 0.5, 0.5)));
        drop_y += 0.25;
    }
}
