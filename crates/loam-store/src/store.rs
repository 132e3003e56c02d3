use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use hashbrown::{HashMap, HashSet};
use loam_blocks::{BlockData, BlockId, Direction};
use loam_chunk::ChunkGrid;
use loam_gen::TerrainGenerator;
use loam_io::WorldArchive;
use loam_runtime::{ThreadPoolBuildError, WorkerPool};
use loam_world::{BlockPos, CHUNK_SIZE, ChunkCoord, WorldId};

use crate::listener::{BlockChange, BlockChangeListener, ChangeOrigin};

pub type ChunkKey = (WorldId, ChunkCoord);

/// How `get_block_data` treats an absent chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Generate {
    /// Report "no data" and leave the chunk absent.
    Never,
    /// Queue generation on the worker pool and report "no data" for now.
    Background,
    /// Generate on the calling thread and return the result.
    Inline,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    Absent,
    Pending,
    Present,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    pub written: usize,
    pub failed: usize,
}

#[derive(Default)]
struct StoreState {
    chunks: HashMap<ChunkKey, Arc<ChunkGrid>>,
    pending: HashSet<ChunkKey>,
    dirty: HashSet<ChunkKey>,
    // bumped by clear(); passes started under an older epoch are discarded
    epoch: u64,
}

struct GenJob {
    world: WorldId,
    coord: ChunkCoord,
    epoch: u64,
}

struct Shared {
    generator: Arc<TerrainGenerator>,
    archive: Option<WorldArchive>,
    state: Mutex<StoreState>,
    settled: Condvar,
    listeners: RwLock<Vec<Weak<dyn BlockChangeListener>>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Archive first, procedural second. Runs without the store lock.
    fn produce(&self, world: WorldId, coord: ChunkCoord) -> Option<ChunkGrid> {
        if let Some(archive) = &self.archive {
            match archive.read_chunk(world, coord) {
                Ok(Some(grid)) => {
                    log::trace!(target: "store", "world {} {:?}: recovered from archive", world, coord);
                    return Some(grid);
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!(target: "store", "{}: {}; regenerating",
                        archive.chunk_path(world, coord).display(), e);
                }
            }
        }
        self.generator.generate_terrain(world, coord)
    }

    /// Finishes a pass for a key the caller already marked pending.
    fn complete(&self, world: WorldId, coord: ChunkCoord, epoch: u64) -> Option<Arc<ChunkGrid>> {
        let produced = match catch_unwind(AssertUnwindSafe(|| self.produce(world, coord))) {
            Ok(grid) => grid,
            Err(payload) => {
                log::error!(target: "store", "world {} {:?}: generation panicked: {}",
                    world, coord, panic_message(payload.as_ref()));
                None
            }
        };
        let key = (world, coord);
        let mut st = self.lock();
        let out = if st.epoch != epoch {
            None
        } else {
            st.pending.remove(&key);
            match produced {
                // pushed by overwrite while this pass ran; the pushed grid wins
                Some(_) if st.chunks.contains_key(&key) => st.chunks.get(&key).cloned(),
                Some(grid) => {
                    let grid = Arc::new(grid);
                    st.chunks.insert(key, Arc::clone(&grid));
                    st.dirty.insert(key);
                    Some(grid)
                }
                None => {
                    log::debug!(target: "store", "world {} {:?}: no data, back to absent", world, coord);
                    st.chunks.get(&key).cloned()
                }
            }
        };
        drop(st);
        self.settled.notify_all();
        out
    }

    fn notify(&self, change: BlockChange) {
        let live: Vec<Arc<dyn BlockChangeListener>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for listener in live {
            listener.on_block_changed(&change);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic"
    }
}

/// Authoritative `(world, chunk) -> grid` map with deduplicated generation
/// and dirty tracking. One coarse lock guards the map and both key sets;
/// generation and archive I/O always run outside it.
pub struct ChunkStore {
    shared: Arc<Shared>,
    pool: WorkerPool<GenJob>,
}

impl ChunkStore {
    pub fn new(
        generator: Arc<TerrainGenerator>,
        archive: Option<WorldArchive>,
        workers: usize,
    ) -> Result<Self, ThreadPoolBuildError> {
        let shared = Arc::new(Shared {
            generator,
            archive,
            state: Mutex::new(StoreState::default()),
            settled: Condvar::new(),
            listeners: RwLock::new(Vec::new()),
        });
        let worker_shared = Arc::clone(&shared);
        let pool = WorkerPool::new("loam-gen", workers, move |job: GenJob| {
            worker_shared.complete(job.world, job.coord, job.epoch);
        })?;
        Ok(Self { shared, pool })
    }

    #[inline]
    pub fn generator(&self) -> &Arc<TerrainGenerator> {
        &self.shared.generator
    }

    #[inline]
    pub fn archive_target(&self) -> Option<&WorldArchive> {
        self.shared.archive.as_ref()
    }

    /// Registers a listener without keeping it alive; dropped listeners are pruned here.
    pub fn subscribe<L: BlockChangeListener + 'static>(&self, listener: &Arc<L>) {
        let weak: Weak<L> = Arc::downgrade(listener);
        let weak: Weak<dyn BlockChangeListener> = weak;
        let mut listeners = self.shared.listeners.write().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|l| l.strong_count() > 0);
        listeners.push(weak);
    }

    pub fn get_block_data(&self, world: WorldId, coord: ChunkCoord, mode: Generate) -> Option<Arc<ChunkGrid>> {
        let key = (world, coord);
        let epoch = {
            let mut st = self.shared.lock();
            if let Some(grid) = st.chunks.get(&key) {
                return Some(Arc::clone(grid));
            }
            if mode == Generate::Never || st.pending.contains(&key) {
                return None;
            }
            st.pending.insert(key);
            st.epoch
        };
        match mode {
            Generate::Inline => self.shared.complete(world, coord, epoch),
            _ => {
                if !self.pool.submit(GenJob { world, coord, epoch }) {
                    log::error!(target: "store", "world {} {:?}: worker pool gone; request dropped", world, coord);
                    let mut st = self.shared.lock();
                    if st.epoch == epoch {
                        st.pending.remove(&key);
                    }
                    drop(st);
                    self.shared.settled.notify_all();
                }
                None
            }
        }
    }

    /// Present grid for `coord`, generating inline if absent and waiting out
    /// any pass already in flight.
    fn materialize(&self, world: WorldId, coord: ChunkCoord) -> Option<Arc<ChunkGrid>> {
        let key = (world, coord);
        let mut st = self.shared.lock();
        loop {
            if let Some(grid) = st.chunks.get(&key) {
                return Some(Arc::clone(grid));
            }
            if !st.pending.contains(&key) {
                break;
            }
            st = self.shared.settled.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
        st.pending.insert(key);
        let epoch = st.epoch;
        drop(st);
        self.shared.complete(world, coord, epoch)
    }

    /// Writes one cell, materializing the chunk first if needed. Returns
    /// false only when the chunk cannot be produced at all.
    pub fn set_block(&self, world: WorldId, pos: BlockPos, id: BlockId, direction: Direction) -> bool {
        let (coord, local) = pos.split();
        let key = (world, coord);
        let data = BlockData::new(id, direction);
        loop {
            let mut guard = self.shared.lock();
            let st = &mut *guard;
            if let Some(grid) = st.chunks.get_mut(&key) {
                Arc::make_mut(grid).set_local(local, data);
                st.dirty.insert(key);
                drop(guard);
                self.shared.notify(BlockChange {
                    world,
                    pos,
                    id,
                    direction,
                    origin: ChangeOrigin::Local,
                });
                return true;
            }
            drop(guard);
            if self.materialize(world, coord).is_none() {
                log::warn!(target: "store", "world {} {:?}: edit at {:?} dropped, chunk unavailable",
                    world, coord, pos);
                return false;
            }
        }
    }

    /// Replaces a whole chunk with data pushed by the host. Not dirtied, not announced.
    pub fn overwrite_block_data(&self, world: WorldId, coord: ChunkCoord, grid: ChunkGrid) {
        let mut st = self.shared.lock();
        st.chunks.insert((world, coord), Arc::new(grid));
        drop(st);
        self.shared.settled.notify_all();
    }

    /// Applies a host-confirmed single-cell change to a chunk this process
    /// already holds. Listeners see it as [`ChangeOrigin::Remote`].
    pub fn apply_remote_block(&self, world: WorldId, pos: BlockPos, data: BlockData) -> bool {
        let (coord, local) = pos.split();
        {
            let mut st = self.shared.lock();
            let Some(grid) = st.chunks.get_mut(&(world, coord)) else {
                return false;
            };
            Arc::make_mut(grid).set_local(local, data);
        }
        self.shared.notify(BlockChange {
            world,
            pos,
            id: data.id,
            direction: data.direction,
            origin: ChangeOrigin::Remote,
        });
        true
    }

    /// Never generates.
    pub fn get_block(&self, world: WorldId, pos: BlockPos) -> Option<BlockData> {
        let (coord, local) = pos.split();
        let st = self.shared.lock();
        st.chunks.get(&(world, coord)).map(|g| g.get_local(local))
    }

    pub fn get_block_id_by_position(&self, world: WorldId, pos: BlockPos) -> Option<BlockId> {
        self.get_block(world, pos).map(|b| b.id)
    }

    fn is_free(&self, world: WorldId, pos: BlockPos) -> bool {
        let air_at = |p: BlockPos| {
            let (coord, local) = p.split();
            self.materialize(world, coord)
                .is_some_and(|g| g.get_local(local).is_air())
        };
        pos.y < i32::MAX && air_at(pos) && air_at(pos.up())
    }

    /// Closest y (checking y, y-1, y+1, y-2, ...) where the cell and the one
    /// above are both air. Chunks on the way are generated inline.
    pub fn get_nearest_land(&self, world: WorldId, pos: BlockPos) -> Option<i32> {
        if self.is_free(world, pos) {
            return Some(pos.y);
        }
        let steps = 2 * CHUNK_SIZE as i32;
        for d in 1..=steps {
            for y in [pos.y.checked_sub(d), pos.y.checked_add(d)].into_iter().flatten() {
                if self.is_free(world, pos.with_y(y)) {
                    return Some(y);
                }
            }
        }
        None
    }

    /// Writes every dirty chunk to the archive. The dirty set is drained
    /// under the lock; writes happen outside it and failures are re-queued.
    pub fn archive(&self) -> ArchiveReport {
        let batch: Vec<(ChunkKey, Arc<ChunkGrid>)> = {
            let mut guard = self.shared.lock();
            let st = &mut *guard;
            let chunks = &st.chunks;
            st.dirty
                .drain()
                .filter_map(|k| chunks.get(&k).map(|g| (k, Arc::clone(g))))
                .collect()
        };
        let Some(archive) = &self.shared.archive else {
            if !batch.is_empty() {
                log::debug!(target: "store", "no archive configured; {} dirty chunk(s) discarded", batch.len());
            }
            return ArchiveReport::default();
        };

        let mut report = ArchiveReport::default();
        let mut failed = Vec::new();
        for ((world, coord), grid) in batch {
            match archive.write_chunk(world, coord, &grid) {
                Ok(()) => report.written += 1,
                Err(e) => {
                    log::warn!(target: "store", "{}: {}", archive.chunk_path(world, coord).display(), e);
                    failed.push((world, coord));
                }
            }
        }
        report.failed = failed.len();
        if !failed.is_empty() {
            let mut st = self.shared.lock();
            for key in failed {
                if st.chunks.contains_key(&key) {
                    st.dirty.insert(key);
                }
            }
        }
        if report.written > 0 || report.failed > 0 {
            log::info!(target: "store", "archived {} chunk(s), {} failed", report.written, report.failed);
        }
        report
    }

    pub fn state(&self, world: WorldId, coord: ChunkCoord) -> ChunkState {
        let key = (world, coord);
        let st = self.shared.lock();
        if st.chunks.contains_key(&key) {
            ChunkState::Present
        } else if st.pending.contains(&key) {
            ChunkState::Pending
        } else {
            ChunkState::Absent
        }
    }

    pub fn is_dirty(&self, world: WorldId, coord: ChunkCoord) -> bool {
        self.shared.lock().dirty.contains(&(world, coord))
    }

    pub fn chunk_count(&self) -> usize {
        self.shared.lock().chunks.len()
    }

    pub fn pending_count(&self) -> usize {
        self.shared.lock().pending.len()
    }

    pub fn dirty_count(&self) -> usize {
        self.shared.lock().dirty.len()
    }

    /// Session reset. Passes still in flight finish into the void.
    pub fn clear(&self) {
        let mut st = self.shared.lock();
        st.chunks.clear();
        st.pending.clear();
        st.dirty.clear();
        st.epoch = st.epoch.wrapping_add(1);
        drop(st);
        self.shared.settled.notify_all();
    }

    /// `(queued, inflight)` background generation jobs.
    pub fn queue_counts(&self) -> (usize, usize) {
        self.pool.queue_counts()
    }

    pub fn wait_idle(&self) {
        self.pool.wait_idle();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use loam_blocks::{BlockDef, BlockRegistry};
    use loam_world::{GeneratorKind, NoiseParams};

    use super::*;

    fn flat_store() -> ChunkStore {
        let mut reg = BlockRegistry::new();
        reg.register(&BlockDef::solid("stone")).unwrap();
        let generator = TerrainGenerator::new(7, Arc::new(reg), NoiseParams::default());
        generator.register_generator(0, GeneratorKind::Flat).unwrap();
        ChunkStore::new(Arc::new(generator), None, 2).unwrap()
    }

    #[test]
    fn never_mode_leaves_chunk_absent() {
        let store = flat_store();
        let c = ChunkCoord::new(0, 0, 0);
        assert!(store.get_block_data(0, c, Generate::Never).is_none());
        assert_eq!(store.state(0, c), ChunkState::Absent);
    }

    #[test]
    fn inline_generation_is_present_and_dirty() {
        let store = flat_store();
        let c = ChunkCoord::new(1, 0, -1);
        let grid = store.get_block_data(0, c, Generate::Inline).unwrap();
        assert!(!grid.get(0, 0, 0).is_air());
        assert_eq!(store.state(0, c), ChunkState::Present);
        assert!(store.is_dirty(0, c));
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn unknown_world_rolls_back_to_absent() {
        let store = flat_store();
        let c = ChunkCoord::new(0, 0, 0);
        assert!(store.get_block_data(9, c, Generate::Inline).is_none());
        assert_eq!(store.state(9, c), ChunkState::Absent);
        assert!(!store.set_block(9, BlockPos::new(0, 0, 0), 1, Direction::None));
    }

    #[test]
    fn readers_keep_their_snapshot_across_edits() {
        let store = flat_store();
        let c = ChunkCoord::new(0, 0, 0);
        let before = store.get_block_data(0, c, Generate::Inline).unwrap();
        assert!(store.set_block(0, BlockPos::new(3, 5, 3), 1, Direction::Up));
        assert!(before.get(3, 5, 3).is_air());
        assert_eq!(
            store.get_block(0, BlockPos::new(3, 5, 3)),
            Some(BlockData::new(1, Direction::Up))
        );
    }

    #[test]
    fn dropped_listeners_are_not_called() {
        let store = flat_store();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let listener = Arc::new(move |_: &BlockChange| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        store.subscribe(&listener);
        store.set_block(0, BlockPos::new(0, 4, 0), 1, Direction::None);
        drop(listener);
        store.set_block(0, BlockPos::new(0, 5, 0), 1, Direction::None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_resets_everything() {
        let store = flat_store();
        store.get_block_data(0, ChunkCoord::new(0, 0, 0), Generate::Inline);
        store.clear();
        assert_eq!(store.chunk_count(), 0);
        assert_eq!(store.dirty_count(), 0);
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn panic_text_is_extracted() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(3u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic");
    }
}
