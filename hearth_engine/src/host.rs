//! Blocking TCP connection to the simulation host.
//!
//! One request is in flight at a time, matching the session state machine.
//! The client owns the handshake; everything after that is framed
//! request/reply traffic.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use anyhow::{bail, Context};
use hearth_stream::{
    decode_payload, encode_message, CommandBatch, Hello, MessageHeader, MessageKind, HEADER_LEN,
};

use crate::session::{HostReply, Session};

/// A connected simulation host.
pub struct HostClient {
    stream: TcpStream,
}

impl HostClient {
    /// Connect and exchange hellos.
    pub fn connect<A: ToSocketAddrs + std::fmt::Debug>(
        addr: A,
        build: Option<String>,
    ) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(&addr).with_context(|| format!("connecting to {addr:?}"))?;
        stream.set_nodelay(true).context("setting TCP_NODELAY")?;
        let mut client = Self { stream };
        let hello = Hello::new("hearth_engine", build);
        client
            .send(MessageKind::Hello, &hello)
            .context("sending hello")?;
        let (kind, payload) = client.read_message().context("awaiting host hello")?;
        if kind != MessageKind::Hello {
            bail!("host sent {kind:?} before hello");
        }
        let host_hello: Hello = decode_payload(&payload).context("decoding host hello")?;
        log::info!(
            "connected to {} ({})",
            host_hello.producer,
            host_hello.build.as_deref().unwrap_or("unknown build")
        );
        Ok(client)
    }

    fn send<T: serde::Serialize>(&mut self, kind: MessageKind, payload: &T) -> anyhow::Result<()> {
        let bytes = encode_message(kind, payload).context("encoding message")?;
        self.stream.write_all(&bytes).context("writing message")?;
        self.stream.flush().context("flushing stream")?;
        Ok(())
    }

    fn read_message(&mut self) -> anyhow::Result<(MessageKind, Vec<u8>)> {
        let mut header_bytes = [0u8; HEADER_LEN];
        self.stream
            .read_exact(&mut header_bytes)
            .context("reading message header")?;
        let header = MessageHeader::decode(&header_bytes).context("decoding message header")?;
        let mut payload = vec![0u8; header.length as usize];
        self.stream
            .read_exact(&mut payload)
            .context("reading message payload")?;
        Ok((header.kind, payload))
    }

    pub fn send_batch(&mut self, batch: &CommandBatch) -> anyhow::Result<()> {
        log::debug!("sending batch {} ({} commands)", batch.seq, batch.commands.len());
        self.send(MessageKind::CommandBatch, batch)
    }

    pub fn recv_reply(&mut self) -> anyhow::Result<HostReply> {
        let (kind, payload) = self.read_message()?;
        let reply = match kind {
            MessageKind::RegionReport => {
                HostReply::Regions(decode_payload(&payload).context("decoding region report")?)
            }
            MessageKind::StepAck => {
                HostReply::StepDone(decode_payload(&payload).context("decoding step ack")?)
            }
            MessageKind::Heartbeat => HostReply::Heartbeat,
            other => bail!("unexpected {other:?} message from host"),
        };
        Ok(reply)
    }

    /// Drive a session to completion over this connection.
    pub fn run(&mut self, session: &mut Session<'_>) -> anyhow::Result<()> {
        let first = session.begin().context("starting session")?;
        self.send_batch(&first)?;
        while !session.is_done() {
            let reply = self.recv_reply()?;
            if let Some(batch) = session.on_reply(reply).context("advancing session")? {
                self.send_batch(&batch)?;
            } else if session.is_done() {
                break;
            }
        }
        Ok(())
    }
}
