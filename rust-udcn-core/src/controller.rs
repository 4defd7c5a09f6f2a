//! The control plane: receives FIB-update commands over UDP and fans
//! each one out to every worker.
//!
//! Grounded on `original_source/src/main/control_plane.c`, which runs a
//! single blocking `recvfrom` loop on its own core and mutates every
//! lcore's FIB directly from that thread. Direct mutation is a data
//! race once the FIB lives behind no lock; this implementation instead
//! sends each parsed command down a bounded MPSC channel per worker,
//! drained at the top of that worker's own loop (see
//! [`crate::worker::Worker::run`]). The wire protocol and validation
//! rules (unknown verb, unknown face) are unchanged from the original.

use crate::worker::FibUpdate;
use rust_udcn_common::control::FibCommand;
use rust_udcn_common::error::Error;
use rust_udcn_common::wire::{self, PacketType};
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::time::Duration;

pub struct Controller {
    socket: UdpSocket,
    worker_senders: Vec<SyncSender<FibUpdate>>,
    /// Face id paired with its configured MAC, if any. A face with no MAC
    /// (`None`) or the all-zero MAC is rejected by the control plane the
    /// same way an entirely unknown face id is.
    known_faces: Vec<(u8, Option<[u8; 6]>)>,
}

impl Controller {
    pub fn bind(
        port: u16,
        worker_senders: Vec<SyncSender<FibUpdate>>,
        known_faces: Vec<(u8, Option<[u8; 6]>)>,
    ) -> Result<Self, Error> {
        let socket = UdpSocket::bind(("127.0.0.1", port))?;
        // A read timeout lets the loop observe `shutdown` periodically
        // while still behaving like a blocking receive the rest of the time.
        socket.set_read_timeout(Some(Duration::from_millis(200)))?;
        Ok(Self {
            socket,
            worker_senders,
            known_faces,
        })
    }

    pub fn run(&self, shutdown: &AtomicBool) -> Result<(), Error> {
        let mut buf = [0u8; 1500];
        while !shutdown.load(Ordering::Relaxed) {
            match self.socket.recv_from(&mut buf) {
                Ok((n, _src)) => self.handle_datagram(&buf[..n]),
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    continue
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn handle_datagram(&self, buf: &[u8]) {
        let parsed = match wire::parse(buf) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("control: malformed packet: {}", e);
                return;
            }
        };
        if parsed.packet_type() != Some(PacketType::Control) {
            log::warn!(
                "control: unexpected packet type {}",
                parsed.header.packet_type
            );
            return;
        }
        let cmd = match FibCommand::parse(parsed.name) {
            Ok(c) => c,
            // An unrecognized VERB is ignored silently, matching the
            // original control plane, which has no log line for it.
            Err(Error::UnknownVerb(_)) => return,
            Err(e) => {
                log::warn!("control: {}", e);
                return;
            }
        };
        match self.known_faces.iter().find(|(id, _)| *id == cmd.face) {
            None => {
                log::warn!("control: unknown or disabled face {}", cmd.face);
                return;
            }
            Some((_, mac)) if mac.is_none() || *mac == Some([0u8; 6]) => {
                log::warn!("control: face {} has no configured MAC", cmd.face);
                return;
            }
            Some(_) => {}
        }

        let update = FibUpdate::from_wire(cmd);
        for tx in &self.worker_senders {
            let _ = tx.send(update);
        }
    }
}
