//! Planar geometry shared by the placement passes.

use hearth_formats::{ModelBounds, Vec3};
use hearth_stream::RegionRecord;

/// Compass direction of a wall or of travel along a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardinalDirection {
    North,
    South,
    East,
    West,
}

impl CardinalDirection {
    /// Direction a lateral run travels when it follows this wall.
    ///
    /// Runs along the north/south walls advance east; runs along the east and
    /// west walls advance north.
    pub fn run_direction(self) -> CardinalDirection {
        match self {
            CardinalDirection::North | CardinalDirection::South => CardinalDirection::East,
            CardinalDirection::East | CardinalDirection::West => CardinalDirection::North,
        }
    }

    /// Yaw, in degrees, that turns a wall-aligned object to face away from
    /// this wall.
    pub fn wall_rotation(self) -> f32 {
        match self {
            CardinalDirection::North => 180.0,
            CardinalDirection::South => 0.0,
            CardinalDirection::West => 270.0,
            CardinalDirection::East => 90.0,
        }
    }
}

/// Axis-aligned rectangle over the floor plane of one room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x_min: f32,
    pub x_max: f32,
    pub z_min: f32,
    pub z_max: f32,
}

impl Region {
    pub fn new(x_min: f32, x_max: f32, z_min: f32, z_max: f32) -> Self {
        Self {
            x_min,
            x_max,
            z_min,
            z_max,
        }
    }

    /// A region of the given size centered on the origin.
    pub fn centered(width: f32, depth: f32) -> Self {
        Self::new(-width / 2.0, width / 2.0, -depth / 2.0, depth / 2.0)
    }

    pub fn from_record(record: &RegionRecord) -> Self {
        Self::new(record.x_min, record.x_max, record.z_min, record.z_max)
    }

    pub fn is_inside(&self, x: f32, z: f32) -> bool {
        x >= self.x_min && x <= self.x_max && z >= self.z_min && z <= self.z_max
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn depth(&self) -> f32 {
        self.z_max - self.z_min
    }

    pub fn area(&self) -> f32 {
        self.width() * self.depth()
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.x_min + self.x_max) / 2.0,
            0.0,
            (self.z_min + self.z_max) / 2.0,
        )
    }
}

/// True if every horizontal bound anchor of the model, placed at `position`,
/// lies inside the region.
pub fn model_fits_in_region(bounds: &ModelBounds, position: Vec3, region: &Region) -> bool {
    let anchors = [
        &bounds.left,
        &bounds.right,
        &bounds.front,
        &bounds.back,
        &bounds.center,
    ];
    anchors
        .iter()
        .all(|anchor| region.is_inside(position.x + anchor.x, position.z + anchor.z))
}

/// Offset from a lateral-run anchor to the pivot of the object placed there:
/// half the object's span along the direction of travel. The run then
/// advances by the full span, so consecutive objects sit flush.
pub fn direction_offset(along: f32, direction: CardinalDirection) -> Vec3 {
    let half = along / 2.0;
    match direction {
        CardinalDirection::North => Vec3::new(0.0, 0.0, half),
        CardinalDirection::South => Vec3::new(0.0, 0.0, -half),
        CardinalDirection::West => Vec3::new(-half, 0.0, 0.0),
        CardinalDirection::East => Vec3::new(half, 0.0, 0.0),
    }
}

/// World-space (x, z) footprint of a model standing in a lateral run.
///
/// An object in a run is yawed to face away from its wall, plus its own
/// canonical rotation. An odd number of quarter turns swaps the footprint
/// axes: runs along the west and east walls travel north/south and turn the
/// model 90 degrees, and a canonical quarter turn undoes (or adds) that swap.
pub fn lateral_footprint(
    extents: [f32; 3],
    direction: CardinalDirection,
    canonical_rotation: f32,
) -> (f32, f32) {
    let quarter_turns = (canonical_rotation / 90.0).round() as i32;
    let swapped = match direction {
        CardinalDirection::East | CardinalDirection::West => quarter_turns.rem_euclid(2) == 1,
        CardinalDirection::North | CardinalDirection::South => quarter_turns.rem_euclid(2) == 0,
    };
    if swapped {
        (extents[2], extents[0])
    } else {
        (extents[0], extents[2])
    }
}

/// True if an axis-aligned footprint centered at `position` lies inside the
/// region.
pub fn footprint_fits_in_region(position: Vec3, footprint: (f32, f32), region: &Region) -> bool {
    let (half_x, half_z) = (footprint.0 / 2.0, footprint.1 / 2.0);
    region.is_inside(position.x - half_x, position.z - half_z)
        && region.is_inside(position.x + half_x, position.z + half_z)
}
