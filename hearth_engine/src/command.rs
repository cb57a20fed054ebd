//! The opaque instruction records consumed by the simulation host.
//!
//! Every geometric decision is made before a command is appended; this module
//! is pure serialization. Plan order is load-bearing: root creation precedes
//! children, parenting precedes the pivot rotation, unparenting follows it.
//! The host executes the batch strictly in order.

use hearth_formats::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rotation axis for [`Command::RotateObjectBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Pitch,
    Yaw,
    Roll,
}

/// One instruction record, serialized as a `{"$type": ...}` dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type", rename_all = "snake_case")]
pub enum Command {
    AddObject {
        name: String,
        id: u64,
        position: Vec3,
        rotation: Vec3,
        #[serde(skip_serializing_if = "Option::is_none")]
        scale_factor: Option<Vec3>,
    },
    ObjectLookAtPosition {
        id: u64,
        position: Vec3,
    },
    ParentObjectToObject {
        id: u64,
        parent_id: u64,
    },
    RotateObjectBy {
        angle: f32,
        id: u64,
        axis: Axis,
        is_world: bool,
        use_centroid: bool,
    },
    UnparentObject {
        id: u64,
    },
    SetKinematicState {
        id: u64,
        is_kinematic: bool,
    },
    SendSceneRegions,
    StepPhysics {
        frames: u32,
    },
}

/// An ordered, append-only list of commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandPlan {
    commands: Vec<Command>,
}

impl CommandPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn extend(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.commands.extend(commands);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Serialize every command to the wire dictionaries the host consumes.
    pub fn to_values(&self) -> serde_json::Result<Vec<Value>> {
        self.commands.iter().map(serde_json::to_value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_with_type_tags() {
        let command = Command::RotateObjectBy {
            angle: 90.0,
            id: 3,
            axis: Axis::Yaw,
            is_world: true,
            use_centroid: false,
        };
        let value = serde_json::to_value(&command).expect("serializes");
        assert_eq!(value["$type"], "rotate_object_by");
        assert_eq!(value["axis"], "yaw");
        assert_eq!(value["angle"], 90.0);
    }

    #[test]
    fn unit_commands_are_bare_tags() {
        let value = serde_json::to_value(Command::SendSceneRegions).expect("serializes");
        assert_eq!(value, serde_json::json!({"$type": "send_scene_regions"}));
    }

    #[test]
    fn kinematic_state_is_a_standalone_toggle() {
        let command = Command::SetKinematicState {
            id: 4,
            is_kinematic: true,
        };
        let value = serde_json::to_value(&command).expect("serializes");
        assert_eq!(
            value,
            serde_json::json!({"$type": "set_kinematic_state", "id": 4, "is_kinematic": true})
        );
    }

    #[test]
    fn absent_scale_factor_is_omitted() {
        let command = Command::AddObject {
            name: "plate06".to_string(),
            id: 1,
            position: Vec3::default(),
            rotation: Vec3::default(),
            scale_factor: None,
        };
        let value = serde_json::to_value(&command).expect("serializes");
        assert!(value.get("scale_factor").is_none());
    }
}
