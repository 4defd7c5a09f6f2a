//! FIB, PIT, content store, the forwarding engine and the control plane
//! that mutates the FIB at runtime.

pub mod bucket;
pub mod config;
pub mod controller;
pub mod cs;
pub mod fib;
pub mod packet;
pub mod pit;
pub mod ring;
pub mod stats;
pub mod worker;
