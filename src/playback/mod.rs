//! Playback pipeline: chunk rotation, per-cycle tasks, and orchestration

pub mod engine;
pub mod loader;
pub mod player;
pub mod rotation;
pub mod state;

pub use engine::Pipeline;
pub use loader::ChunkLoader;
pub use player::ChunkPlayer;
pub use rotation::{remap, ChunkArena, CycleRoles, RoleMap};
pub use state::PipelineState;
