//! Chunk streaming and block-change sync between a host and its clients.
#![forbid(unsafe_code)]

pub mod sync;
pub mod tracker;
pub mod wire;

pub use sync::{ClientSync, HostSync, Reliability, Transport};
pub use tracker::{PlayerId, SendTracker};
pub use wire::{BlockChanged, BlockEdit, ChunkPacket, ClientMessage, HostMessage};
