use std::error::Error;
use std::sync::Arc;

use loam_blocks::{BlockCatalog, BlockRegistry, BlocksConfig, ItemCatalog, ItemDef, ItemRegistry, TypeCatalog};
use loam_gen::TerrainGenerator;
use loam_io::WorldArchive;
use loam_net::{ClientMessage, HostSync, PlayerId, Transport};
use loam_store::{ArchiveReport, ChunkStore, Generate};
use loam_world::{BlockPos, WorldGenConfig, WorldId};

use super::config::HostConfig;

/// Every block is also an item that places it.
fn item_catalog(blocks: &BlocksConfig) -> ItemCatalog {
    let mut catalog: ItemCatalog = TypeCatalog::new();
    for def in &blocks.blocks {
        catalog.register_value(def.name.clone(), ItemDef::placing(&def.name, &def.name));
    }
    catalog
}

/// Headless host: owns the store and drives it from an external loop via
/// [`init`](Self::init), [`tick`](Self::tick) and [`shutdown`](Self::shutdown).
pub struct HostSession {
    cfg: HostConfig,
    archive: WorldArchive,
    blocks: Arc<BlockRegistry>,
    items: ItemRegistry,
    store: Arc<ChunkStore>,
    spawns: Vec<(WorldId, BlockPos)>,
    sync: Option<Arc<HostSync>>,
    players: Vec<(PlayerId, WorldId, BlockPos)>,
    since_save: f32,
    ticks: u64,
}

impl HostSession {
    pub fn init(cfg: HostConfig, worldgen: &WorldGenConfig, blocks_cfg: &BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let archive = WorldArchive::new(&cfg.world_dir);

        let catalog = BlockCatalog::from_config(blocks_cfg);
        let mut blocks = BlockRegistry::new();
        match archive.load_block_registry(&catalog, &mut blocks) {
            Ok(Some(report)) if !report.skipped.is_empty() => {
                log::warn!("{} saved block type(s) are unknown to this build", report.skipped.len());
            }
            Ok(_) => {}
            Err(e) => log::warn!("block registry unreadable, starting fresh: {}", e),
        }
        let added = blocks.register_missing(&catalog)?;
        if !added.is_empty() {
            log::info!("registered {} new block type(s)", added.len());
        }

        let item_catalog = item_catalog(blocks_cfg);
        let mut items = ItemRegistry::new();
        if let Err(e) = archive.load_item_registry(&item_catalog, &mut items) {
            log::warn!("item registry unreadable, starting fresh: {}", e);
        }
        for tag in item_catalog.tags() {
            if items.resolve(tag).is_none() {
                if let Some(def) = item_catalog.create(tag) {
                    items.register(def)?;
                }
            }
        }

        let blocks = Arc::new(blocks);
        let generator = TerrainGenerator::from_config(worldgen, Arc::clone(&blocks))?;
        let store = Arc::new(ChunkStore::new(
            Arc::new(generator),
            Some(archive.clone()),
            cfg.workers,
        )?);

        let mut spawns = Vec::with_capacity(cfg.spawns.len());
        for sp in &cfg.spawns {
            let probe = BlockPos::new(sp.x, 0, sp.z);
            let y = match store.get_nearest_land(sp.world, probe) {
                Some(y) => y,
                None => {
                    log::warn!("no free space near {:?} in world {}; spawning at y=0", probe, sp.world);
                    0
                }
            };
            log::info!("world {} spawn at ({}, {}, {})", sp.world, sp.x, y, sp.z);
            spawns.push((sp.world, probe.with_y(y)));
        }

        log::info!(
            "host ready: {} block type(s), {} item type(s), {} worker(s), archive at {}",
            blocks.len(),
            items.len(),
            cfg.workers,
            cfg.world_dir.display()
        );
        Ok(Self {
            cfg,
            archive,
            blocks,
            items,
            store,
            spawns,
            sync: None,
            players: Vec::new(),
            since_save: 0.0,
            ticks: 0,
        })
    }

    #[inline]
    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.store
    }

    #[inline]
    pub fn blocks(&self) -> &Arc<BlockRegistry> {
        &self.blocks
    }

    #[inline]
    pub fn items(&self) -> &ItemRegistry {
        &self.items
    }

    pub fn spawns(&self) -> &[(WorldId, BlockPos)] {
        &self.spawns
    }

    /// Starts serving clients over `transport`; changes to the store are
    /// broadcast from here on.
    pub fn serve(&mut self, transport: Arc<dyn Transport>) -> Arc<HostSync> {
        let sync = HostSync::new(Arc::clone(&self.store), transport);
        self.sync = Some(Arc::clone(&sync));
        sync
    }

    /// Registers or moves a player; chunks around them are streamed on tick.
    pub fn update_player(&mut self, peer: PlayerId, world: WorldId, pos: BlockPos) {
        match self.players.iter_mut().find(|(p, _, _)| *p == peer) {
            Some(entry) => *entry = (peer, world, pos),
            None => {
                log::info!("peer {} joined world {} at {:?}", peer, world, pos);
                self.players.push((peer, world, pos));
            }
        }
    }

    pub fn player_left(&mut self, peer: PlayerId) {
        self.players.retain(|(p, _, _)| *p != peer);
        if let Some(sync) = &self.sync {
            sync.player_left(peer);
        }
    }

    pub fn handle_client(&self, peer: PlayerId, msg: ClientMessage) {
        match &self.sync {
            Some(sync) => sync.handle_client(peer, msg),
            None => log::warn!("message from peer {} before serving; dropped", peer),
        }
    }

    /// Keeps the area around each spawn requested and autosaves on schedule.
    /// Returns the autosave report when one ran this tick.
    pub fn tick(&mut self, dt: f32) -> Option<ArchiveReport> {
        self.ticks += 1;
        for &(world, pos) in &self.spawns {
            let center = pos.chunk();
            for coord in center.neighborhood(self.cfg.view_radius, self.cfg.vertical_radius) {
                self.store.get_block_data(world, coord, Generate::Background);
            }
        }
        if let Some(sync) = &self.sync {
            for &(peer, world, pos) in &self.players {
                sync.stream_around(peer, world, pos.chunk(), self.cfg.view_radius, self.cfg.vertical_radius);
            }
        }
        if self.ticks % 20 == 0 {
            let (queued, inflight) = self.store.queue_counts();
            log::debug!("tick {}: {} chunk(s), gen q={} inflight={}, dirty={}",
                self.ticks, self.store.chunk_count(), queued, inflight, self.store.dirty_count());
        }

        self.since_save += dt.max(0.0);
        if self.cfg.autosave_secs > 0.0 && self.since_save >= self.cfg.autosave_secs {
            self.since_save = 0.0;
            return Some(self.store.archive());
        }
        None
    }

    /// Lets generation drain, then writes every dirty chunk and both registries.
    pub fn shutdown(self) -> Result<ArchiveReport, Box<dyn Error>> {
        self.store.wait_idle();
        let report = self.store.archive();
        self.archive.save_block_registry(&self.blocks)?;
        self.archive.save_item_registry(&self.items)?;
        log::info!("shutdown after {} tick(s): {} chunk(s) archived, {} failed",
            self.ticks, report.written, report.failed);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use loam_world::{ChunkCoord, GeneratorKind};
    use loam_world::worldgen::WorldEntry;

    use super::*;

    fn flat_worldgen() -> WorldGenConfig {
        WorldGenConfig {
            worlds: vec![WorldEntry {
                id: 0,
                generator: GeneratorKind::Flat,
            }],
            ..WorldGenConfig::default()
        }
    }

    fn config(dir: &std::path::Path) -> HostConfig {
        HostConfig {
            world_dir: dir.to_path_buf(),
            workers: 2,
            autosave_secs: 1.0,
            view_radius: 1,
            vertical_radius: 0,
            ..HostConfig::default()
        }
    }

    #[test]
    fn flat_spawn_lands_on_top_of_the_slab() {
        let dir = tempfile::tempdir().unwrap();
        let session = HostSession::init(config(dir.path()), &flat_worldgen(), &BlocksConfig::builtin()).unwrap();
        assert_eq!(session.spawns(), &[(0, BlockPos::new(0, 2, 0))]);
    }

    #[test]
    fn ticks_stream_chunks_and_autosave() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = HostSession::init(config(dir.path()), &flat_worldgen(), &BlocksConfig::builtin()).unwrap();
        assert!(session.tick(0.5).is_none());
        session.store().wait_idle();
        let report = session.tick(0.6).unwrap();
        assert!(report.written >= 9);
        assert_eq!(session.store().dirty_count(), 0);
        let report = session.shutdown().unwrap();
        assert_eq!(report.failed, 0);
        assert!(WorldArchive::new(dir.path()).chunk_path(0, ChunkCoord::new(1, 0, 1)).exists());
    }

    #[derive(Default)]
    struct Recorder(std::sync::Mutex<Vec<(PlayerId, loam_net::HostMessage)>>);

    impl Transport for Recorder {
        fn send_to_client(&self, peer: PlayerId, msg: loam_net::HostMessage, _: loam_net::Reliability) {
            self.0.lock().unwrap().push((peer, msg));
        }

        fn send_to_host(&self, _: ClientMessage, _: loam_net::Reliability) {}
    }

    #[test]
    fn players_are_streamed_and_hear_edits() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = HostSession::init(config(dir.path()), &flat_worldgen(), &BlocksConfig::builtin()).unwrap();
        let net = Arc::new(Recorder::default());
        session.serve(net.clone());
        session.update_player(7, 0, BlockPos::new(0, 2, 0));
        session.tick(0.0);
        session.store().wait_idle();
        session.tick(0.0);
        let pushed = std::mem::take(&mut *net.0.lock().unwrap());
        assert_eq!(pushed.len(), 9);

        let edit = loam_net::BlockEdit {
            world: 0,
            pos: BlockPos::new(1, 4, 1),
            id: 1,
            direction: loam_blocks::Direction::None,
        };
        session.handle_client(7, ClientMessage::SetBlock(edit));
        let sent = std::mem::take(&mut *net.0.lock().unwrap());
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], (7, loam_net::HostMessage::BlockChanged(_))));

        session.player_left(7);
        session.store().set_block(0, BlockPos::new(1, 5, 1), 1, loam_blocks::Direction::None);
        assert!(net.0.lock().unwrap().is_empty());
    }

    #[test]
    fn corrupt_block_breakpoint_does_not_abort_startup() {
        let dir = tempfile::tempdir().unwrap();
        let record = loam_io::TypeTableRecord {
            next_id: 70_000,
            entries: vec![(1, "stone".into())],
        };
        std::fs::write(dir.path().join(loam_io::BLOCK_REGISTRY_FILE), loam_io::serialize_types(&record)).unwrap();
        let session = HostSession::init(config(dir.path()), &flat_worldgen(), &BlocksConfig::builtin()).unwrap();
        assert_eq!(session.blocks().resolve_block_id("stone"), Some(1));
        assert!(session.blocks().resolve_block_id("glass").is_some());
    }

    #[test]
    fn registries_and_edits_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let pos = BlockPos::new(7, 5, -3);
        let (stone, glass, pick) = {
            let session = HostSession::init(config(dir.path()), &flat_worldgen(), &BlocksConfig::builtin()).unwrap();
            let glass = session.blocks().resolve_block_id("glass").unwrap();
            assert!(session.store().set_block(0, pos, glass, loam_blocks::Direction::Up));
            let stone = session.blocks().resolve_block_id("stone").unwrap();
            let pick = session.items().resolve("glass").unwrap();
            session.shutdown().unwrap();
            (stone, glass, pick)
        };

        // a catalog listing blocks in another order must not reshuffle saved ids
        let mut reordered = BlocksConfig::builtin();
        reordered.blocks.reverse();
        let session = HostSession::init(config(dir.path()), &flat_worldgen(), &reordered).unwrap();
        assert_eq!(session.blocks().resolve_block_id("stone"), Some(stone));
        assert_eq!(session.blocks().resolve_block_id("glass"), Some(glass));
        assert_eq!(session.items().resolve("glass"), Some(pick));
        let grid = session.store().get_block_data(0, pos.chunk(), Generate::Inline).unwrap();
        assert_eq!(grid.get_local(pos.local()).id, glass);
    }
}
