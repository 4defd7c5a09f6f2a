//! Sends a FIB-update command to a running router's control socket.
//!
//! Grounded on `original_source/src/util/fib_control.c`, which builds the
//! same `VERB:prefix:face` command and sends it as a single UDP datagram.

use anyhow::{Context, Result};
use log::info;
use rust_udcn_common::control::{FibCommand, Verb};
use rust_udcn_common::name::Name;
use rust_udcn_common::wire;
use std::net::UdpSocket;

pub fn add(controller: &str, prefix: &str, face: u8) -> Result<()> {
    send(controller, Verb::Add, prefix, face)
}

pub fn del(controller: &str, prefix: &str, face: u8) -> Result<()> {
    send(controller, Verb::Del, prefix, face)
}

fn send(controller: &str, verb: Verb, prefix: &str, face: u8) -> Result<()> {
    let prefix = Name::parse(prefix).context("invalid name prefix")?;
    let cmd = FibCommand { verb, prefix, face };
    let wire = wire::encode_control(64, &cmd.encode());

    let socket = UdpSocket::bind("0.0.0.0:0").context("failed to open control socket")?;
    socket
        .send_to(&wire, controller)
        .with_context(|| format!("failed to send to controller at {}", controller))?;
    info!("sent {} {} -> face {} to {}", verb, prefix, face, controller);
    Ok(())
}
