use loam_world::{BlockPos, CHUNK_SIZE, ChunkCoord};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = i32> {
    -1_000_000i32..=1_000_000
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Local coordinates always land in [0, CHUNK_SIZE) regardless of sign
    #[test]
    fn local_is_always_in_range(x in coord(), y in coord(), z in coord()) {
        let l = BlockPos::new(x, y, z).local();
        prop_assert!(l.x < CHUNK_SIZE);
        prop_assert!(l.y < CHUNK_SIZE);
        prop_assert!(l.z < CHUNK_SIZE);
    }

    // chunk * size + local reconstructs the global position exactly
    #[test]
    fn chunk_and_local_reconstruct(x in coord(), y in coord(), z in coord()) {
        let p = BlockPos::new(x, y, z);
        let (c, l) = p.split();
        let s = CHUNK_SIZE as i32;
        prop_assert_eq!(c.cx * s + l.x as i32, x);
        prop_assert_eq!(c.cy * s + l.y as i32, y);
        prop_assert_eq!(c.cz * s + l.z as i32, z);
        prop_assert_eq!(BlockPos::from_parts(c, l), p);
    }

    // Neighbouring positions across a chunk seam differ by exactly one chunk
    #[test]
    fn seam_crossing_steps_one_chunk(cx in -10_000i32..10_000) {
        let s = CHUNK_SIZE as i32;
        let last = BlockPos::new(cx * s + s - 1, 0, 0);
        let next = BlockPos::new(cx * s + s, 0, 0);
        prop_assert_eq!(last.chunk(), ChunkCoord::new(cx, 0, 0));
        prop_assert_eq!(next.chunk(), ChunkCoord::new(cx + 1, 0, 0));
        prop_assert_eq!(last.local().x, CHUNK_SIZE - 1);
        prop_assert_eq!(next.local().x, 0);
    }
}
