//! # quality-unwrap
//!
//! Quality-guided phase unwrapping over dense N-dimensional grids.
//!
//! Given a wrapped phase field (known only modulo 2π) and a per-sample quality
//! map, the unwrapper grows a resolved region outward from a seed, always
//! extending from the most reliable boundary sample first. Each new sample is
//! shifted by the multiple of 2π that brings it closest to an already-resolved
//! neighbor.
//!
//! ## Features
//!
//! - **Any dimensionality**: 1-D profiles, 2-D images, 3-D volumes
//! - **Deterministic**: ties in quality are broken by sample index
//! - **Configurable ordering**: variance-like (lower is better) or
//!   reliability-like (higher is better) quality maps
//! - **Connectivity rules**: validity masks or custom link predicates
//! - **Progress and cancellation**: per-sample hooks, polled once per iteration
//!
//! ## Basic Usage
//!
//! ```rust
//! use quality_unwrap::{unwrap_phase, Grid};
//!
//! # fn main() -> quality_unwrap::Result<()> {
//! let phase = Grid::from_vec(&[5], vec![0.1, 6.2, 0.0, 6.1, 0.2])?;
//! let quality = Grid::from_vec(&[5], vec![0.0; 5])?;
//!
//! let outcome = unwrap_phase(&phase, &quality, &[0])?;
//! assert!(outcome.is_complete());
//!
//! let r = outcome.resolved.as_slice();
//! for pair in r.windows(2) {
//!     assert!((pair[1] - pair[0]).abs() <= std::f64::consts::PI);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Progress Tracking
//!
//! ```rust
//! use quality_unwrap::{unwrap_phase_with, FnProgress, FullConnectivity, Grid, UnwrapConfig};
//!
//! # fn main() -> quality_unwrap::Result<()> {
//! let phase = Grid::from_vec(&[4, 4], vec![0.5; 16])?;
//! let quality = Grid::from_vec(&[4, 4], (0..16).map(f64::from).collect())?;
//!
//! let mut progress = FnProgress::new(|done| {
//!     if done % 4 == 0 {
//!         println!("{done}/16 samples resolved");
//!     }
//! });
//! let outcome = unwrap_phase_with(
//!     &phase,
//!     &quality,
//!     &[0, 0],
//!     &UnwrapConfig::default(),
//!     FullConnectivity,
//!     &mut progress,
//! )?;
//! assert_eq!(outcome.resolved_count, 16);
//! # Ok(())
//! # }
//! ```

pub use crate::core::config::UnwrapConfig;
pub use crate::core::connectivity::{Connectivity, FullConnectivity, MaskConnectivity};
pub use crate::core::engine::{
    EngineState, GrowOptions, RegionGrower, RunStatus, UnwrapOutcome,
};
pub use crate::core::error::{Error, Result};
pub use crate::core::field::{PhaseField, UnwrappedField};
pub use crate::core::frontier::{Candidate, Frontier, QualityOrder};
pub use crate::core::grid::{Extent, Grid, Neighbors};
pub use crate::core::phase::{resolve, wrap_positive, wrap_positive_grid, TWO_PI};
pub use crate::core::progress::{
    CancelFlag, Cancellable, CountingProgress, FnProgress, NoProgress, Progress,
};

// Internal modules
mod core;

/// Unwrap a fully connected grid with default options
///
/// # Arguments
/// * `phase` - Wrapped phase samples
/// * `quality` - Quality map with the same extent; lower is better by default
/// * `seed` - Coordinates of the starting sample, one per dimension
pub fn unwrap_phase(
    phase: &Grid<f64>,
    quality: &Grid<f64>,
    seed: &[usize],
) -> Result<UnwrapOutcome> {
    unwrap_phase_with(
        phase,
        quality,
        seed,
        &UnwrapConfig::default(),
        FullConnectivity,
        &mut NoProgress,
    )
}

/// Unwrap with explicit configuration, link rule and progress sink
///
/// Applies `wrap_input` before growing and `wrap_output` afterwards when the
/// config asks for them.
pub fn unwrap_phase_with<C, P>(
    phase: &Grid<f64>,
    quality: &Grid<f64>,
    seed: &[usize],
    config: &UnwrapConfig,
    connectivity: C,
    progress: &mut P,
) -> Result<UnwrapOutcome>
where
    C: Connectivity,
    P: Progress + ?Sized,
{
    let wrapped;
    let input = if config.wrap_input {
        wrapped = wrap_positive_grid(phase);
        &wrapped
    } else {
        phase
    };

    let grower = RegionGrower::with_connectivity(
        input,
        quality,
        seed,
        config.grow_options(),
        connectivity,
    )?;
    let mut outcome = grower.run(progress)?;

    if config.wrap_output {
        outcome.resolved = wrap_positive_grid(&outcome.resolved);
    }
    Ok(outcome)
}

/// Unwrap a field document
///
/// `seed` overrides the seed stored in the document; one of the two must be
/// present. A mask in the document restricts growth to valid samples.
pub fn unwrap_field<P: Progress + ?Sized>(
    field: PhaseField,
    seed: Option<&[usize]>,
    config: &UnwrapConfig,
    progress: &mut P,
) -> Result<UnwrapOutcome> {
    let seed = match (seed, field.seed.as_deref()) {
        (Some(seed), _) => seed.to_vec(),
        (None, Some(seed)) => seed.to_vec(),
        (None, None) => {
            return Err(Error::Config(
                "no seed given on the command line or in the field".to_string(),
            ))
        }
    };
    let (phase, quality, mask) = field.into_masked_grids()?;
    match &mask {
        Some(mask) => unwrap_phase_with(
            &phase,
            &quality,
            &seed,
            config,
            MaskConnectivity::new(mask),
            progress,
        ),
        None => unwrap_phase_with(&phase, &quality, &seed, config, FullConnectivity, progress),
    }
}
