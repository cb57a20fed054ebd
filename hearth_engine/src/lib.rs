//! Procedural scene generation for the Hearth simulation host.
//!
//! The pipeline is a pure function from (catalog, region, seed) to an ordered
//! command plan: the composer places furniture and tabletop objects with an
//! occupancy grid and a seeded rng, and the resulting plan is streamed to the
//! external host over HearthStream. The host executes commands verbatim; no
//! physics or rendering happens on this side.

pub mod arrangement;
pub mod command;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod host;
pub mod kitchen;
pub mod resolver;
pub mod session;
