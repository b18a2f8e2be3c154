//! Decorative hero animation state
//!
//! The animation is randomized once per visitor and then kept stable across
//! page loads by persisting its seed through a [`KeyValueStore`].

pub mod state;
pub mod store;

pub use state::{
    load_for_page, load_or_create, seeded_random, AnimationState, AnimationTimings, GradientOffsets,
    LayerPhaseOffsets, ParticleData, Particles, STATE_KEY,
};
pub use store::{KeyValueStore, MemoryStore};
