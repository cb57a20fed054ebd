//! The generation session state machine.
//!
//! Scene generation needs more than one round trip to the host: the region
//! bounds arrive in a reply, the command plan goes out in a second batch, and
//! the physics settle is acknowledged in a third. The session models those
//! round trips as explicit states with one outstanding request at a time;
//! the transport (or a test harness) feeds replies in and sends the batches
//! it gets back.

use hearth_formats::Catalog;
use hearth_stream::{CommandBatch, RegionReport, StepAck};
use serde_json::Value;

use crate::command::Command;
use crate::error::GenError;
use crate::geometry::Region;
use crate::kitchen::compose_kitchen;

/// Frames of physics stepped after placement so stacked objects settle.
const SETTLE_FRAMES: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Start,
    AwaitingRegions,
    PlacingObjects,
    SteppingPhysics,
    Done,
}

impl SessionState {
    fn name(self) -> &'static str {
        match self {
            SessionState::Start => "start",
            SessionState::AwaitingRegions => "awaiting_regions",
            SessionState::PlacingObjects => "placing_objects",
            SessionState::SteppingPhysics => "stepping_physics",
            SessionState::Done => "done",
        }
    }
}

/// A decoded reply from the host, reduced to what the session cares about.
#[derive(Debug, Clone)]
pub enum HostReply {
    Regions(RegionReport),
    StepDone(StepAck),
    Heartbeat,
}

/// One scene-generation exchange with the host.
pub struct Session<'a> {
    catalog: &'a Catalog,
    seed: u64,
    state: SessionState,
    seq: u64,
    region_override: Option<Region>,
    region: Option<Region>,
}

impl<'a> Session<'a> {
    pub fn new(catalog: &'a Catalog, seed: u64) -> Self {
        Self {
            catalog,
            seed,
            state: SessionState::Start,
            seq: 0,
            region_override: None,
            region: None,
        }
    }

    /// Use a fixed region instead of querying the host for one.
    pub fn with_region(mut self, region: Region) -> Self {
        self.region_override = Some(region);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == SessionState::Done
    }

    /// The region the scene was generated for, once known.
    pub fn region(&self) -> Option<Region> {
        self.region
    }

    fn next_batch(&mut self, commands: Vec<Value>) -> CommandBatch {
        self.seq += 1;
        CommandBatch {
            seq: self.seq,
            commands,
        }
    }

    fn placement_batch(&mut self, region: Region) -> Result<CommandBatch, GenError> {
        self.state = SessionState::PlacingObjects;
        self.region = Some(region);
        let plan = compose_kitchen(self.catalog, region, self.seed)?;
        log::info!(
            "composed {} commands for region {:.1}x{:.1} (seed {})",
            plan.len(),
            region.width(),
            region.depth(),
            self.seed
        );
        let mut commands = plan
            .to_values()
            .map_err(|err| GenError::MalformedInput(err.to_string()))?;
        commands.push(
            serde_json::to_value(Command::StepPhysics {
                frames: SETTLE_FRAMES,
            })
            .map_err(|err| GenError::MalformedInput(err.to_string()))?,
        );
        self.state = SessionState::SteppingPhysics;
        Ok(self.next_batch(commands))
    }

    /// Produce the first outgoing batch.
    ///
    /// With a region override the plan goes out immediately; otherwise the
    /// first batch asks the host for its scene regions.
    pub fn begin(&mut self) -> Result<CommandBatch, GenError> {
        if self.state != SessionState::Start {
            return Err(GenError::UnexpectedReply {
                state: self.state.name(),
            });
        }
        match self.region_override {
            Some(region) => self.placement_batch(region),
            None => {
                let query = serde_json::to_value(Command::SendSceneRegions)
                    .map_err(|err| GenError::MalformedInput(err.to_string()))?;
                self.state = SessionState::AwaitingRegions;
                Ok(self.next_batch(vec![query]))
            }
        }
    }

    /// Feed one host reply in; returns the next batch to send, if any.
    pub fn on_reply(&mut self, reply: HostReply) -> Result<Option<CommandBatch>, GenError> {
        match (self.state, reply) {
            (_, HostReply::Heartbeat) => Ok(None),
            (SessionState::AwaitingRegions, HostReply::Regions(report)) => {
                // The largest region hosts the kitchen.
                let record = report
                    .regions
                    .iter()
                    .max_by(|a, b| {
                        let area_a = (a.x_max - a.x_min) * (a.z_max - a.z_min);
                        let area_b = (b.x_max - b.x_min) * (b.z_max - b.z_min);
                        area_a.total_cmp(&area_b)
                    })
                    .ok_or_else(|| {
                        GenError::MalformedInput("host reported no scene regions".to_string())
                    })?;
                let region = Region::from_record(record);
                if region.width() <= 0.0 || region.depth() <= 0.0 {
                    return Err(GenError::MalformedInput(format!(
                        "degenerate region {} reported by host",
                        record.id
                    )));
                }
                self.placement_batch(region).map(Some)
            }
            (SessionState::SteppingPhysics, HostReply::StepDone(ack)) => {
                log::info!("host settled {} frames", ack.frames);
                self.state = SessionState::Done;
                Ok(None)
            }
            (state, _) => Err(GenError::UnexpectedReply { state: state.name() }),
        }
    }
}
