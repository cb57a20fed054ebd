//! Shared HearthStream protocol helpers.
//!
//! The protocol sends a fixed-size header followed by a MessagePack payload.
//! This crate keeps the framing logic in one place so the generation client
//! and the simulation host stay interoperable.

use std::convert::TryFrom;

use bytes::Buf;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};
use thiserror::Error;

/// Bytes that prefix every HearthStream message ("HRTH").
pub const HEADER_MAGIC: [u8; 4] = *b"HRTH";

/// Protocol revision understood by this crate.
pub const PROTOCOL_VERSION: u16 = 0x0001;

/// Length of the binary header in bytes.
pub const HEADER_LEN: usize = 4 + 2 + 2 + 4;

/// Message kinds understood by HearthStream v1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, Hash)]
#[repr(u16)]
pub enum MessageKind {
    Hello = 0x0001,
    CommandBatch = 0x0002,
    RegionReport = 0x0003,
    StepAck = 0x0004,
    Heartbeat = 0x0005,
}

/// Envelope describing the upcoming payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub version: u16,
    pub kind: MessageKind,
    pub length: u32,
}

impl MessageHeader {
    /// Encode the header as big-endian bytes.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&HEADER_MAGIC);
        out[4..6].copy_from_slice(&self.version.to_be_bytes());
        out[6..8].copy_from_slice(&(self.kind as u16).to_be_bytes());
        out[8..12].copy_from_slice(&self.length.to_be_bytes());
        out
    }

    /// Decode a header from raw bytes.
    pub fn decode(input: &[u8]) -> Result<Self, ProtocolError> {
        if input.len() < HEADER_LEN {
            return Err(ProtocolError::TruncatedHeader);
        }
        if &input[..4] != HEADER_MAGIC {
            return Err(ProtocolError::BadMagic);
        }
        let mut version_bytes = &input[4..6];
        let version = version_bytes.get_u16();
        let mut kind_bytes = &input[6..8];
        let kind_raw = kind_bytes.get_u16();
        let kind = MessageKind::try_from(kind_raw)
            .map_err(|_| ProtocolError::UnknownMessageKind(kind_raw))?;
        let mut len_bytes = &input[8..12];
        let length = len_bytes.get_u32();
        Ok(Self {
            version,
            kind,
            length,
        })
    }
}

impl TryFrom<u16> for MessageKind {
    type Error = ();

    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(Self::Hello),
            0x0002 => Ok(Self::CommandBatch),
            0x0003 => Ok(Self::RegionReport),
            0x0004 => Ok(Self::StepAck),
            0x0005 => Ok(Self::Heartbeat),
            _ => Err(()),
        }
    }
}

/// Minimal handshake message that opens a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hello {
    pub protocol: String,
    pub producer: String,
    pub build: Option<String>,
}

impl Hello {
    pub fn new(producer: impl Into<String>, build: Option<String>) -> Self {
        Self {
            protocol: "HearthStream".to_string(),
            producer: producer.into(),
            build,
        }
    }
}

/// One ordered batch of opaque instruction records for the host.
///
/// Each command is a tagged dictionary the host executes verbatim, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandBatch {
    pub seq: u64,
    pub commands: Vec<Value>,
}

/// Axis-aligned bounds of one scene region (room), as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub id: u32,
    pub x_min: f32,
    pub x_max: f32,
    pub z_min: f32,
    pub z_max: f32,
}

/// Reply to a `send_scene_regions` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionReport {
    pub seq: u64,
    pub regions: Vec<RegionRecord>,
}

/// Acknowledgement that the host advanced its physics simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepAck {
    pub seq: u64,
    pub frames: u32,
}

/// Error conditions returned by the protocol helpers.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("header smaller than {HEADER_LEN} bytes")]
    TruncatedHeader,
    #[error("header magic mismatch")]
    BadMagic,
    #[error("message kind {0:#06x} is unknown")]
    UnknownMessageKind(u16),
    #[error("payload length mismatch: header declared {expected} bytes but read {actual}")]
    LengthMismatch { expected: u32, actual: usize },
    #[error("payload decode error: {0}")]
    PayloadDecode(#[from] rmp_serde::decode::Error),
    #[error("payload encode error: {0}")]
    PayloadEncode(#[from] rmp_serde::encode::Error),
}

/// Wraps a payload with framing suitable for the wire.
pub fn encode_message<T>(kind: MessageKind, payload: &T) -> Result<Vec<u8>, ProtocolError>
where
    T: Serialize,
{
    let payload_bytes = rmp_serde::to_vec_named(payload)?;
    let header = MessageHeader {
        version: PROTOCOL_VERSION,
        kind,
        length: u32::try_from(payload_bytes.len()).map_err(|_| ProtocolError::LengthMismatch {
            expected: u32::MAX,
            actual: payload_bytes.len(),
        })?,
    };
    let mut out = Vec::with_capacity(HEADER_LEN + payload_bytes.len());
    out.extend_from_slice(&header.encode());
    out.extend_from_slice(&payload_bytes);
    Ok(out)
}

/// Decodes a framed message returning both header and payload bytes.
pub fn decode_envelope(bytes: &[u8]) -> std::result::Result<(MessageHeader, &[u8]), ProtocolError> {
    if bytes.len() < HEADER_LEN {
        return Err(ProtocolError::TruncatedHeader);
    }
    let header = MessageHeader::decode(&bytes[..HEADER_LEN])?;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() != header.length as usize {
        return Err(ProtocolError::LengthMismatch {
            expected: header.length,
            actual: payload.len(),
        });
    }
    Ok((header, payload))
}

/// Decode a payload straight into the requested type.
pub fn decode_payload<T>(payload: &[u8]) -> std::result::Result<T, ProtocolError>
where
    T: for<'de> Deserialize<'de>,
{
    let value = rmp_serde::from_slice(payload)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_round_trip() {
        let header = MessageHeader {
            version: PROTOCOL_VERSION,
            kind: MessageKind::CommandBatch,
            length: 42,
        };
        let decoded = MessageHeader::decode(&header.encode()).expect("decodes");
        assert_eq!(decoded, header);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = MessageHeader {
            version: PROTOCOL_VERSION,
            kind: MessageKind::Hello,
            length: 0,
        }
        .encode();
        bytes[0] = b'X';
        assert!(matches!(
            MessageHeader::decode(&bytes),
            Err(ProtocolError::BadMagic)
        ));
    }

    #[test]
    fn command_batch_round_trip() {
        let batch = CommandBatch {
            seq: 7,
            commands: vec![
                json!({"$type": "send_scene_regions"}),
                json!({"$type": "step_physics", "frames": 100}),
            ],
        };
        let framed = encode_message(MessageKind::CommandBatch, &batch).expect("encodes");
        let (header, payload) = decode_envelope(&framed).expect("envelope");
        assert_eq!(header.kind, MessageKind::CommandBatch);
        let decoded: CommandBatch = decode_payload(payload).expect("payload");
        assert_eq!(decoded.seq, 7);
        assert_eq!(decoded.commands, batch.commands);
    }

    #[test]
    fn region_report_round_trip() {
        let report = RegionReport {
            seq: 1,
            regions: vec![RegionRecord {
                id: 0,
                x_min: -2.0,
                x_max: 2.0,
                z_min: -1.5,
                z_max: 1.5,
            }],
        };
        let framed = encode_message(MessageKind::RegionReport, &report).expect("encodes");
        let (header, payload) = decode_envelope(&framed).expect("envelope");
        assert_eq!(header.kind, MessageKind::RegionReport);
        let decoded: RegionReport = decode_payload(payload).expect("payload");
        assert_eq!(decoded.regions, report.regions);
    }
}
