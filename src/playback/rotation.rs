//! Chunk arena and buffer-role rotation
//!
//! Six fixed-size chunks (2 input, 4 output) are allocated once at startup
//! and reused for the whole run. A 4-phase rotation index decides which
//! physical chunk plays which logical role each cycle:
//!
//! | phase | curr_in | prev_in | load | play | feedback |
//! |-------|---------|---------|------|------|----------|
//! |   0   |   I0    |   I1    |  O0  |  O2  |    O3    |
//! |   1   |   I1    |   I0    |  O1  |  O3  |    O0    |
//! |   2   |   I0    |   I1    |  O2  |  O0  |    O1    |
//! |   3   |   I1    |   I0    |  O3  |  O1  |    O2    |
//!
//! `remap` is the only place role-to-slot assignment is decided; roles are
//! re-resolved every phase change and never cached across one. The play
//! chunk was loaded two cycles ago and the feedback chunk one cycle ago, so
//! both are complete by the time they are read; load, play and feedback are
//! always three distinct chunks.

use crate::audio::types::Sample;

/// Physical input chunk slots.
pub const INPUT_SLOTS: usize = 2;

/// Physical output chunk slots.
pub const OUTPUT_SLOTS: usize = 4;

/// Rotation period in cycles.
pub const PHASES: usize = 4;

/// Role-to-slot assignment for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleMap {
    pub curr_in: usize,
    pub prev_in: usize,
    pub load_out: usize,
    pub play_out: usize,
    pub feedback_out: usize,
}

/// Resolve the role mapping for a rotation phase. Pure lookup.
pub fn remap(phase: usize) -> RoleMap {
    RoleMap {
        curr_in: phase % INPUT_SLOTS,
        prev_in: (phase + 1) % INPUT_SLOTS,
        load_out: phase % OUTPUT_SLOTS,
        play_out: (phase + 2) % OUTPUT_SLOTS,
        feedback_out: (phase + 3) % OUTPUT_SLOTS,
    }
}

/// The six chunks, split by role for one cycle.
///
/// Only the current input and the load chunk are writable; the history and
/// play chunks are read-only, so the borrow checker enforces that no chunk
/// is touched by two roles at once.
pub struct CycleRoles<'a> {
    pub curr_in: &'a mut [Sample],
    pub prev_in: &'a [Sample],
    pub load_out: &'a mut [Sample],
    pub play_out: &'a [Sample],
    pub feedback_out: &'a [Sample],
}

/// Owner of the six chunks and the rotation phase.
pub struct ChunkArena {
    inputs: [Box<[Sample]>; INPUT_SLOTS],
    outputs: [Box<[Sample]>; OUTPUT_SLOTS],
    phase: usize,
}

impl ChunkArena {
    /// Allocate all chunks, zero-initialized. `chunk_samples` counts
    /// interleaved samples (both channels).
    pub fn new(chunk_samples: usize) -> Self {
        let chunk = || vec![0 as Sample; chunk_samples].into_boxed_slice();
        Self {
            inputs: [chunk(), chunk()],
            outputs: [chunk(), chunk(), chunk(), chunk()],
            phase: 0,
        }
    }

    /// Current rotation phase.
    pub fn phase(&self) -> usize {
        self.phase
    }

    /// Advance the rotation by one cycle, wrapping at the period.
    pub fn advance(&mut self) {
        self.phase = (self.phase + 1) % PHASES;
    }

    /// Borrow the chunks in their current roles.
    pub fn roles(&mut self) -> CycleRoles<'_> {
        let map = remap(self.phase);

        let [curr_in, prev_in] = self
            .inputs
            .get_disjoint_mut([map.curr_in, map.prev_in])
            .expect("input role slots are distinct");
        let [load_out, play_out, feedback_out] = self
            .outputs
            .get_disjoint_mut([map.load_out, map.play_out, map.feedback_out])
            .expect("output role slots are distinct");

        CycleRoles {
            curr_in: &mut **curr_in,
            prev_in: &**prev_in,
            load_out: &mut **load_out,
            play_out: &**play_out,
            feedback_out: &**feedback_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_matches_rotation_table() {
        let expected = [
            (0, 1, 0, 2, 3),
            (1, 0, 1, 3, 0),
            (0, 1, 2, 0, 1),
            (1, 0, 3, 1, 2),
        ];
        for (phase, (curr, prev, load, play, feedback)) in expected.into_iter().enumerate() {
            let map = remap(phase);
            assert_eq!(map.curr_in, curr, "phase {phase}");
            assert_eq!(map.prev_in, prev, "phase {phase}");
            assert_eq!(map.load_out, load, "phase {phase}");
            assert_eq!(map.play_out, play, "phase {phase}");
            assert_eq!(map.feedback_out, feedback, "phase {phase}");
        }
    }

    #[test]
    fn output_roles_are_pairwise_distinct_in_every_phase() {
        for phase in 0..PHASES {
            let map = remap(phase);
            assert_ne!(map.load_out, map.play_out, "phase {phase}");
            assert_ne!(map.load_out, map.feedback_out, "phase {phase}");
            assert_ne!(map.play_out, map.feedback_out, "phase {phase}");
            assert_ne!(map.curr_in, map.prev_in, "phase {phase}");
        }
    }

    #[test]
    fn load_chunk_becomes_play_two_cycles_later_and_feedback_one() {
        for phase in 0..PHASES {
            let loaded = remap(phase).load_out;
            assert_eq!(remap((phase + 1) % PHASES).feedback_out, loaded);
            assert_eq!(remap((phase + 2) % PHASES).play_out, loaded);
        }
    }

    #[test]
    fn advance_wraps_at_period() {
        let mut arena = ChunkArena::new(16);
        assert_eq!(arena.phase(), 0);
        for expected in [1, 2, 3, 0, 1] {
            arena.advance();
            assert_eq!(arena.phase(), expected);
        }
    }

    #[test]
    fn chunks_start_zeroed_and_hold_their_role_sizes() {
        let mut arena = ChunkArena::new(16);
        let roles = arena.roles();
        assert_eq!(roles.curr_in.len(), 16);
        assert_eq!(roles.prev_in.len(), 16);
        assert_eq!(roles.load_out.len(), 16);
        assert_eq!(roles.play_out.len(), 16);
        assert_eq!(roles.feedback_out.len(), 16);
        assert!(roles.prev_in.iter().all(|&s| s == 0));
        assert!(roles.feedback_out.iter().all(|&s| s == 0));
    }

    #[test]
    fn writes_land_in_the_rotated_slot() {
        let mut arena = ChunkArena::new(4);

        // Write through the load role at phase 0 (slot O0).
        arena.roles().load_out[0] = 7;

        // Two cycles later O0 is the play chunk.
        arena.advance();
        arena.advance();
        assert_eq!(arena.phase(), 2);
        assert_eq!(arena.roles().play_out[0], 7);
    }
}
