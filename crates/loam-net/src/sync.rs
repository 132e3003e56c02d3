use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use loam_blocks::{BlockId, Direction};
use loam_chunk::ChunkGrid;
use loam_store::{BlockChange, BlockChangeListener, ChangeOrigin, ChunkStore, Generate};
use loam_world::{BlockPos, ChunkCoord, WorldId};

use crate::tracker::{PlayerId, SendTracker};
use crate::wire::{BlockChanged, BlockEdit, ChunkPacket, ClientMessage, HostMessage};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reliability {
    Reliable,
    Unreliable,
}

/// Message delivery. Implementations own peer addressing and encoding.
pub trait Transport: Send + Sync {
    fn send_to_client(&self, peer: PlayerId, msg: HostMessage, reliability: Reliability);
    fn send_to_host(&self, msg: ClientMessage, reliability: Reliability);
}

/// Host side: streams chunks to peers, applies their edit requests, and
/// fans out every local change to the peers that hold the chunk.
pub struct HostSync {
    store: Arc<ChunkStore>,
    transport: Arc<dyn Transport>,
    tracker: Mutex<SendTracker>,
}

impl HostSync {
    /// Builds the sync and subscribes it to `store`.
    pub fn new(store: Arc<ChunkStore>, transport: Arc<dyn Transport>) -> Arc<Self> {
        let host = Arc::new(Self {
            store: Arc::clone(&store),
            transport,
            tracker: Mutex::new(SendTracker::new()),
        });
        store.subscribe(&host);
        host
    }

    fn tracker(&self) -> MutexGuard<'_, SendTracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Tracker lock is held across snapshot and send so a concurrent edit's
    // broadcast cannot slip in between them.
    fn push_locked(&self, tracker: &mut SendTracker, peer: PlayerId, world: WorldId, coord: ChunkCoord, grid: &ChunkGrid) {
        let packet = ChunkPacket::from_grid(world, coord, grid);
        self.transport
            .send_to_client(peer, HostMessage::Chunk(packet), Reliability::Reliable);
        tracker.mark_sent(peer, world, coord);
    }

    /// Pushes every ready, unsent chunk around `center`; the rest are queued
    /// for background generation and picked up on a later call. Returns the
    /// number of chunks pushed.
    pub fn stream_around(
        &self,
        peer: PlayerId,
        world: WorldId,
        center: ChunkCoord,
        radius_xz: i32,
        radius_y: i32,
    ) -> usize {
        let mut pushed = 0;
        for coord in center.neighborhood(radius_xz, radius_y) {
            let mut tracker = self.tracker();
            if tracker.was_sent(peer, world, coord) {
                continue;
            }
            if let Some(grid) = self.store.get_block_data(world, coord, Generate::Background) {
                self.push_locked(&mut tracker, peer, world, coord, &grid);
                pushed += 1;
            }
        }
        if pushed > 0 {
            log::debug!(target: "net", "peer {}: pushed {} chunk(s) around {:?}", peer, pushed, center);
        }
        pushed
    }

    pub fn handle_client(&self, peer: PlayerId, msg: ClientMessage) {
        match msg {
            ClientMessage::RequestChunk { world, coord } => {
                let mut tracker = self.tracker();
                tracker.forget(peer, world, coord);
                match self.store.get_block_data(world, coord, Generate::Inline) {
                    Some(grid) => self.push_locked(&mut tracker, peer, world, coord, &grid),
                    None => log::debug!(target: "net", "peer {}: {:?} not ready, will stream later", peer, coord),
                }
            }
            ClientMessage::SetBlock(edit) => {
                if !self.store.set_block(edit.world, edit.pos, edit.id, edit.direction) {
                    log::warn!(target: "net", "peer {}: edit at {:?} rejected", peer, edit.pos);
                }
            }
        }
    }

    pub fn player_left(&self, peer: PlayerId) {
        let dropped = self.tracker().remove_player(peer);
        log::info!(target: "net", "peer {} left ({} chunk(s) forgotten)", peer, dropped);
    }

    pub fn sent_count(&self, peer: PlayerId) -> usize {
        self.tracker().sent_count(peer)
    }
}

impl BlockChangeListener for HostSync {
    fn on_block_changed(&self, change: &BlockChange) {
        if change.origin == ChangeOrigin::Remote {
            return;
        }
        let msg = BlockChanged {
            world: change.world,
            pos: change.pos,
            id: change.id,
            direction: change.direction,
        };
        let tracker = self.tracker();
        for peer in tracker.players_with(change.world, change.pos.chunk()) {
            self.transport
                .send_to_client(peer, HostMessage::BlockChanged(msg), Reliability::Reliable);
        }
    }
}

/// Client side: never predicts. Edits go to the host and come back as
/// confirmed changes.
pub struct ClientSync {
    store: Arc<ChunkStore>,
    transport: Arc<dyn Transport>,
}

impl ClientSync {
    pub fn new(store: Arc<ChunkStore>, transport: Arc<dyn Transport>) -> Self {
        Self { store, transport }
    }

    pub fn request_set_block(&self, world: WorldId, pos: BlockPos, id: BlockId, direction: Direction) {
        let edit = BlockEdit {
            world,
            pos,
            id,
            direction,
        };
        self.transport
            .send_to_host(ClientMessage::SetBlock(edit), Reliability::Reliable);
    }

    pub fn request_chunk(&self, world: WorldId, coord: ChunkCoord) {
        self.transport
            .send_to_host(ClientMessage::RequestChunk { world, coord }, Reliability::Reliable);
    }

    /// Returns false when the message could not be applied locally.
    pub fn handle_host(&self, msg: HostMessage) -> bool {
        match msg {
            HostMessage::Chunk(packet) => match packet.to_grid() {
                Some(grid) => {
                    self.store.overwrite_block_data(packet.world, packet.coord, grid);
                    true
                }
                None => {
                    log::warn!(target: "net", "malformed chunk packet for {:?}; dropped", packet.coord);
                    false
                }
            },
            HostMessage::BlockChanged(c) => self.store.apply_remote_block(c.world, c.pos, c.data()),
        }
    }
}
