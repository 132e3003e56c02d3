use hashbrown::{HashMap, HashSet};
use loam_world::{ChunkCoord, WorldId};

pub type PlayerId = u64;

/// Which chunks each player has already been sent.
#[derive(Debug, Default)]
pub struct SendTracker {
    sent: HashMap<PlayerId, HashSet<(WorldId, ChunkCoord)>>,
}

impl SendTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if this is the first time the chunk is recorded for `player`.
    pub fn mark_sent(&mut self, player: PlayerId, world: WorldId, coord: ChunkCoord) -> bool {
        self.sent.entry(player).or_default().insert((world, coord))
    }

    pub fn was_sent(&self, player: PlayerId, world: WorldId, coord: ChunkCoord) -> bool {
        self.sent
            .get(&player)
            .is_some_and(|s| s.contains(&(world, coord)))
    }

    /// Players holding the chunk, ascending.
    pub fn players_with(&self, world: WorldId, coord: ChunkCoord) -> Vec<PlayerId> {
        let key = (world, coord);
        let mut out: Vec<PlayerId> = self
            .sent
            .iter()
            .filter(|(_, s)| s.contains(&key))
            .map(|(p, _)| *p)
            .collect();
        out.sort_unstable();
        out
    }

    pub fn forget(&mut self, player: PlayerId, world: WorldId, coord: ChunkCoord) -> bool {
        self.sent
            .get_mut(&player)
            .is_some_and(|s| s.remove(&(world, coord)))
    }

    /// Forces a resend to everyone; returns how many players had it.
    pub fn forget_chunk(&mut self, world: WorldId, coord: ChunkCoord) -> usize {
        let key = (world, coord);
        self.sent.values_mut().map(|s| s.remove(&key)).filter(|hit| *hit).count()
    }

    /// Returns how many chunks the player had been sent.
    pub fn remove_player(&mut self, player: PlayerId) -> usize {
        self.sent.remove(&player).map_or(0, |s| s.len())
    }

    pub fn sent_count(&self, player: PlayerId) -> usize {
        self.sent.get(&player).map_or(0, |s| s.len())
    }

    pub fn player_count(&self) -> usize {
        self.sent.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forget_chunk_hits_every_holder() {
        let mut t = SendTracker::new();
        let c = ChunkCoord::new(1, 0, 1);
        assert!(t.mark_sent(1, 0, c));
        assert!(!t.mark_sent(1, 0, c));
        t.mark_sent(2, 0, c);
        t.mark_sent(2, 1, c);
        assert_eq!(t.players_with(0, c), vec![1, 2]);
        assert_eq!(t.forget_chunk(0, c), 2);
        assert!(t.players_with(0, c).is_empty());
        assert!(t.was_sent(2, 1, c));
    }

    #[test]
    fn removing_a_player_drops_its_history() {
        let mut t = SendTracker::new();
        t.mark_sent(9, 0, ChunkCoord::new(0, 0, 0));
        t.mark_sent(9, 0, ChunkCoord::new(0, 1, 0));
        assert_eq!(t.sent_count(9), 2);
        assert_eq!(t.remove_player(9), 2);
        assert_eq!(t.sent_count(9), 0);
        assert_eq!(t.player_count(), 0);
        assert!(!t.forget(9, 0, ChunkCoord::new(0, 0, 0)));
    }
}
