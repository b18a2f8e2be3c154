//! Seeded animation parameters and their persistence

use crate::hero::store::KeyValueStore;
use crate::Result;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Store key the animation state lives under
pub const STATE_KEY: &str = "heroAnimationState";

/// Particles per animation layer
pub const PARTICLES_PER_LAYER: usize = 7;

/// Particle start delays spread over the 60s cycle, in ms. Negative delays
/// start particles part-way through the cycle so the layer is never empty.
pub const PARTICLE_DELAYS_MS: [i64; PARTICLES_PER_LAYER] =
    [-51429, -34286, -17142, 0, 8571, 25714, 42857];

/// Seeds are drawn from `0..SEED_RANGE`
pub const SEED_RANGE: u32 = 1_000_000;

const BEFORE_LAYER_SEED_INDEX: u32 = 21;
const AFTER_LAYER_SEED_INDEX: u32 = 25;
const LEGACY_AFTER_PHASE_MS: f64 = -30000.0;

/// Deterministic pseudo-random value in `[0, 1)` for a seed and index
pub fn seeded_random(seed: u32, index: u32) -> f64 {
    let x = ((seed as f64 + index as f64) * 12.9898).sin() * 43758.5453;
    x - x.floor()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleData {
    /// Vertical offset in vmin
    pub y_offset: f64,
    /// Background x offset in percent
    pub bg_x_offset: f64,
    /// Hue rotation in degrees
    pub hue_rotation: f64,
    /// Start delay in ms
    pub delay: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientOffsets {
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerPhaseOffsets {
    pub before: f64,
    pub after: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particles {
    pub before: Vec<ParticleData>,
    pub after: Vec<ParticleData>,
}

impl Particles {
    fn from_seed(seed: u32) -> Self {
        Self {
            before: generate_particles(seed, BEFORE_LAYER_SEED_INDEX),
            after: generate_particles(seed, AFTER_LAYER_SEED_INDEX),
        }
    }
}

/// Persisted animation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationState {
    /// Epoch ms the animation was first shown
    pub start_time: i64,
    pub seed: u32,
    pub gradient_offsets: GradientOffsets,
    pub layer_phase_offsets: LayerPhaseOffsets,
    pub particles: Particles,
}

/// Shape of a stored state; older versions lack some fields
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredState {
    start_time: i64,
    seed: u32,
    gradient_offsets: GradientOffsets,
    #[serde(default)]
    layer_phase_offsets: Option<StoredPhaseOffsets>,
}

#[derive(Debug, Deserialize)]
struct StoredPhaseOffsets {
    before: Option<f64>,
    after: f64,
}

impl AnimationState {
    /// Build a fresh state for `seed` first shown at `now_ms`
    pub fn generate(seed: u32, now_ms: i64) -> Self {
        Self {
            start_time: now_ms,
            seed,
            gradient_offsets: GradientOffsets {
                c0: seeded_random(seed, 37) * 8.0 - 4.0,
                c1: seeded_random(seed, 38) * 10.0 - 5.0,
                c2: seeded_random(seed, 39) * 6.0 - 3.0,
            },
            layer_phase_offsets: LayerPhaseOffsets {
                before: 0.0,
                after: jittered_after_phase(seed),
            },
            particles: Particles::from_seed(seed),
        }
    }

    /// Rebuild a stored state. Returns the state and whether it was migrated
    /// and so needs persisting again.
    fn restore(stored: StoredState) -> (Self, bool) {
        let offsets = stored.layer_phase_offsets.unwrap_or(StoredPhaseOffsets {
            before: Some(0.0),
            after: LEGACY_AFTER_PHASE_MS,
        });
        // Early versions stored a positive phase for the second layer
        let needs_migration = offsets.after > 0.0;
        let after = if needs_migration {
            jittered_after_phase(stored.seed)
        } else {
            offsets.after
        };

        let state = Self {
            start_time: stored.start_time,
            seed: stored.seed,
            gradient_offsets: stored.gradient_offsets,
            layer_phase_offsets: LayerPhaseOffsets {
                before: offsets.before.unwrap_or(0.0),
                after,
            },
            particles: Particles::from_seed(stored.seed),
        };
        (state, needs_migration)
    }
}

fn jittered_after_phase(seed: u32) -> f64 {
    -36000.0 + (seeded_random(seed, 40) - 0.5) * 10000.0
}

fn generate_particles(seed: u32, start_index: u32) -> Vec<ParticleData> {
    PARTICLE_DELAYS_MS
        .iter()
        .enumerate()
        .map(|(i, &delay)| {
            let i = i as u32;
            ParticleData {
                y_offset: seeded_random(seed, start_index + i) * 70.0 - 35.0,
                bg_x_offset: seeded_random(seed, start_index + 10 + i) * 10.0 - 5.0,
                hue_rotation: seeded_random(seed, start_index + 20 + i) * 60.0 - 30.0,
                delay,
            }
        })
        .collect()
}

/// Load the stored animation state or create and persist a new one.
///
/// Unreadable stored state is replaced rather than reported.
pub fn load_or_create<R: Rng>(
    store: &dyn KeyValueStore,
    now_ms: i64,
    rng: &mut R,
) -> Result<AnimationState> {
    let restored = store.get(STATE_KEY).and_then(|raw| {
        match serde_json::from_str::<StoredState>(&raw) {
            Ok(stored) => Some(AnimationState::restore(stored)),
            Err(e) => {
                warn!("Discarding unreadable hero animation state: {}", e);
                None
            }
        }
    });

    let (state, persist) = match restored {
        Some((state, migrated)) => {
            debug!("Restored hero animation seed {}", state.seed);
            (state, migrated)
        }
        None => {
            let seed = rng.gen_range(0..SEED_RANGE);
            debug!("Generated hero animation seed {}", seed);
            (AnimationState::generate(seed, now_ms), true)
        }
    };

    if persist {
        store.set(STATE_KEY, serde_json::to_string(&state)?)?;
    }

    Ok(state)
}

/// Load or create the state for a page shown now, with its timings
pub fn load_for_page(store: &dyn KeyValueStore) -> Result<(AnimationState, AnimationTimings)> {
    let now_ms = Utc::now().timestamp_millis();
    let state = load_or_create(store, now_ms, &mut rand::thread_rng())?;
    let timings = AnimationTimings::compute(&state, now_ms);
    Ok((state, timings))
}

/// Delays and averages derived from a state at page load
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationTimings {
    /// Shared animation delay, negative elapsed time since first view
    pub base_delay_ms: f64,
    pub before_layer_delay_ms: f64,
    pub after_layer_delay_ms: f64,
    pub before_hue_avg: f64,
    pub after_hue_avg: f64,
}

impl AnimationTimings {
    pub fn compute(state: &AnimationState, now_ms: i64) -> Self {
        let base_delay_ms = -((now_ms - state.start_time) as f64);
        let timings = Self {
            base_delay_ms,
            before_layer_delay_ms: base_delay_ms + state.layer_phase_offsets.before,
            after_layer_delay_ms: base_delay_ms + state.layer_phase_offsets.after,
            before_hue_avg: hue_average(&state.particles.before),
            after_hue_avg: hue_average(&state.particles.after),
        };
        debug!(
            "Hero animation delays: before {}ms, after {}ms",
            timings.before_layer_delay_ms, timings.after_layer_delay_ms
        );
        timings
    }
}

fn hue_average(particles: &[ParticleData]) -> f64 {
    if particles.is_empty() {
        return 0.0;
    }
    particles.iter().map(|p| p.hue_rotation).sum::<f64>() / particles.len() as f64
}
