//! Quality-guided region growing
//!
//! Pipeline per run:
//! 1. Validate extents and seed
//! 2. Mark the seed resolved, push its linked neighbors onto the frontier
//! 3. Repeatedly pop the most reliable candidate, align it to its first
//!    resolved neighbor by a multiple of 2π, mark it, push its unresolved
//!    neighbors
//! 4. Stop when the frontier drains or the progress sink asks to cancel

use log::{debug, error, trace, warn};
use serde::{Deserialize, Serialize};

use crate::core::connectivity::{Connectivity, FullConnectivity};
use crate::core::error::{Error, Result};
use crate::core::frontier::{Frontier, QualityOrder};
use crate::core::grid::{Extent, Grid};
use crate::core::phase::resolve;
use crate::core::progress::Progress;

/// Options that change how the engine orders and records growth
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrowOptions {
    pub quality_order: QualityOrder,
    /// Keep the sequence of extracted indices in the outcome
    pub record_order: bool,
}

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Seeded,
    Growing,
    Done,
    Cancelled,
    /// An internal invariant broke; the run cannot continue
    Failed,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Frontier drained; everything reachable from the seed is resolved
    Completed,
    /// Stopped early by the progress sink; the grid is partially resolved
    Cancelled,
    /// Stopped by an invariant violation; the grid is partially resolved
    Failed,
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct UnwrapOutcome {
    /// Unwrapped phase; unreached samples keep their input value
    pub resolved: Grid<f64>,
    pub resolved_mask: Grid<bool>,
    pub status: RunStatus,
    /// Resolved samples, seed included
    pub resolved_count: usize,
    /// Extraction order when [`GrowOptions::record_order`] is set; the seed is
    /// not part of it
    pub visit_order: Option<Vec<usize>>,
}

impl UnwrapOutcome {
    /// True when every sample of the grid was resolved
    pub fn is_complete(&self) -> bool {
        self.resolved_count == self.resolved.len()
    }

    pub fn unresolved_count(&self) -> usize {
        self.resolved.len() - self.resolved_count
    }
}

/// Region-growing unwrapper over one phase/quality pair
pub struct RegionGrower<'a, C = FullConnectivity> {
    quality: &'a Grid<f64>,
    connectivity: C,
    resolved: Grid<f64>,
    mask: Grid<bool>,
    frontier: Frontier,
    state: EngineState,
    seed: usize,
    seed_reported: bool,
    resolved_count: usize,
    visit_order: Option<Vec<usize>>,
    failure: Option<String>,
}

impl<'a> RegionGrower<'a, FullConnectivity> {
    /// Engine over a fully connected grid
    pub fn new(
        phase: &Grid<f64>,
        quality: &'a Grid<f64>,
        seed: &[usize],
        options: GrowOptions,
    ) -> Result<Self> {
        Self::with_connectivity(phase, quality, seed, options, FullConnectivity)
    }
}

impl<'a, C: Connectivity> RegionGrower<'a, C> {
    /// Engine whose growth only crosses links allowed by `connectivity`
    ///
    /// Fails before allocating anything when the grids disagree on extent or
    /// the seed is outside the grid.
    pub fn with_connectivity(
        phase: &Grid<f64>,
        quality: &'a Grid<f64>,
        seed: &[usize],
        options: GrowOptions,
        connectivity: C,
    ) -> Result<Self> {
        phase.ensure_same_extent(quality, "phase and quality")?;
        connectivity.validate(phase.extent())?;

        let extent = phase.extent();
        if seed.len() != extent.rank() {
            return Err(Error::SeedRankMismatch {
                seed: seed.to_vec(),
                rank: extent.rank(),
            });
        }
        let seed_index = extent
            .linear_index(seed)
            .ok_or_else(|| Error::SeedOutOfBounds {
                seed: seed.to_vec(),
                dims: extent.dims().to_vec(),
            })?;

        let mut grower = Self {
            quality,
            connectivity,
            resolved: phase.clone(),
            mask: Grid::filled(extent.clone(), false),
            frontier: Frontier::new(options.quality_order),
            state: EngineState::Seeded,
            seed: seed_index,
            seed_reported: false,
            resolved_count: 0,
            visit_order: options.record_order.then(Vec::new),
            failure: None,
        };
        grower.plant_seed();

        debug!(
            "Region grower ready: extent {:?}, seed {:?}, order {}, {} initial candidates",
            extent.dims(),
            seed,
            options.quality_order,
            grower.frontier.len()
        );
        Ok(grower)
    }

    fn plant_seed(&mut self) {
        self.mask[self.seed] = true;
        self.resolved_count = 1;
        self.push_unresolved_neighbors(self.seed);
        self.state = if self.frontier.is_empty() {
            EngineState::Done
        } else {
            EngineState::Growing
        };
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn extent(&self) -> &Extent {
        self.resolved.extent()
    }

    /// Linear index of the seed
    pub fn seed(&self) -> usize {
        self.seed
    }

    pub fn resolved(&self) -> &Grid<f64> {
        &self.resolved
    }

    pub fn resolved_mask(&self) -> &Grid<bool> {
        &self.mask
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved_count
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Run one iteration of the growth loop
    ///
    /// Returns the linear index resolved by this call, or `None` once the run
    /// is over (drained or cancelled). The seed's progress unit is reported
    /// on the first call, so a caller that skips `step` and `run` and goes
    /// straight to [`into_outcome`](Self::into_outcome) sees no signals.
    ///
    /// An invariant violation is terminal: this call and every later one
    /// return the same [`Error::Invariant`].
    pub fn step<P: Progress + ?Sized>(&mut self, progress: &mut P) -> Result<Option<usize>> {
        if !self.seed_reported {
            self.seed_reported = true;
            progress.on_unit_complete();
        }

        match self.state {
            EngineState::Done | EngineState::Cancelled => return Ok(None),
            EngineState::Failed => {
                let reason = self.failure.clone().unwrap_or_default();
                return Err(Error::Invariant(reason));
            }
            EngineState::Seeded | EngineState::Growing => {}
        }

        if progress.is_cancelled() {
            trace!(
                "Cancellation requested with {} candidates pending",
                self.frontier.len()
            );
            self.state = EngineState::Cancelled;
            return Ok(None);
        }

        let candidate = match self.frontier.extract_best() {
            Some(candidate) => candidate,
            None => {
                self.state = EngineState::Done;
                return Ok(None);
            }
        };
        let index = candidate.index;

        if self.mask[index] {
            return Err(self.fail(format!(
                "sample {index} was extracted after it was already resolved"
            )));
        }
        let reference = match self.first_resolved_neighbor(index) {
            Some(reference) => reference,
            None => {
                return Err(self.fail(format!(
                    "sample {index} left the frontier without a resolved neighbour"
                )))
            }
        };

        self.resolved[index] = resolve(self.resolved[index], self.resolved[reference]);
        self.mask[index] = true;
        self.resolved_count += 1;
        if let Some(order) = self.visit_order.as_mut() {
            order.push(index);
        }
        progress.on_unit_complete();

        self.push_unresolved_neighbors(index);
        if self.frontier.is_empty() {
            self.state = EngineState::Done;
        }

        Ok(Some(index))
    }

    fn fail(&mut self, reason: String) -> Error {
        error!("Region growing stopped: {reason}");
        self.state = EngineState::Failed;
        self.failure = Some(reason.clone());
        Error::Invariant(reason)
    }

    /// Grow until the frontier drains or the sink cancels
    pub fn run<P: Progress + ?Sized>(mut self, progress: &mut P) -> Result<UnwrapOutcome> {
        while self.step(progress)?.is_some() {}
        Ok(self.into_outcome())
    }

    /// Hand the owned grids to the caller
    pub fn into_outcome(self) -> UnwrapOutcome {
        let status = match self.state {
            EngineState::Cancelled => RunStatus::Cancelled,
            EngineState::Failed => RunStatus::Failed,
            EngineState::Seeded | EngineState::Growing | EngineState::Done => {
                RunStatus::Completed
            }
        };
        let outcome = UnwrapOutcome {
            resolved: self.resolved,
            resolved_mask: self.mask,
            status,
            resolved_count: self.resolved_count,
            visit_order: self.visit_order,
        };

        debug!(
            "Region growing finished ({:?}): {}/{} samples resolved",
            outcome.status,
            outcome.resolved_count,
            outcome.resolved.len()
        );
        if outcome.status == RunStatus::Completed && !outcome.is_complete() {
            warn!(
                "{} samples are not reachable from the seed and keep their wrapped value",
                outcome.unresolved_count()
            );
        }
        outcome
    }

    /// First resolved, linked neighbor in traversal order
    fn first_resolved_neighbor(&self, index: usize) -> Option<usize> {
        self.resolved
            .extent()
            .neighbors(index)
            .find(|&n| self.mask[n] && self.connectivity.is_linked(n, index))
    }

    fn push_unresolved_neighbors(&mut self, index: usize) {
        let extent = self.resolved.extent();
        for n in extent.neighbors(index) {
            if !self.mask[n] && self.connectivity.is_linked(index, n) {
                self.frontier.insert_or_ignore(n, self.quality[n]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phase::TWO_PI;
    use crate::core::progress::{CancelFlag, Cancellable, CountingProgress, NoProgress};
    use std::f64::consts::PI;

    fn grid(dims: &[usize], data: Vec<f64>) -> Grid<f64> {
        Grid::from_vec(dims, data).unwrap()
    }

    fn recorded(order: QualityOrder) -> GrowOptions {
        GrowOptions {
            quality_order: order,
            record_order: true,
        }
    }

    #[test]
    fn test_ramp_1d_adjacent_differences_within_pi() {
        let phase = grid(&[5], vec![0.1, 6.2, 0.0, 6.1, 0.2]);
        let quality = grid(&[5], vec![0.0; 5]);
        let grower = RegionGrower::new(&phase, &quality, &[0], GrowOptions::default()).unwrap();
        let outcome = grower.run(&mut NoProgress).unwrap();

        let r = outcome.resolved.as_slice();
        assert_eq!(outcome.status, RunStatus::Completed);
        assert!(outcome.is_complete());
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] - (6.2 - TWO_PI)).abs() < 1e-12);
        for i in 0..4 {
            assert!((r[i + 1] - r[i]).abs() <= PI, "step {i}: {} -> {}", r[i], r[i + 1]);
        }
    }

    #[test]
    fn test_single_sample_grid() {
        let phase = grid(&[1], vec![2.5]);
        let quality = grid(&[1], vec![1.0]);
        let grower = RegionGrower::new(&phase, &quality, &[0], GrowOptions::default()).unwrap();
        assert_eq!(grower.state(), EngineState::Done);
        assert_eq!(grower.frontier_len(), 0);

        let mut counter = CountingProgress::new();
        let outcome = grower.run(&mut counter).unwrap();
        assert_eq!(outcome.resolved.as_slice(), &[2.5]);
        assert_eq!(outcome.resolved_mask.as_slice(), &[true]);
        // Only the seed's own unit
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_seed_out_of_bounds_rejected() {
        let phase = grid(&[5], vec![0.0; 5]);
        let quality = grid(&[5], vec![0.0; 5]);
        let err = RegionGrower::new(&phase, &quality, &[5], GrowOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::SeedOutOfBounds { .. }));
        assert!(err.is_precondition());
    }

    #[test]
    fn test_seed_rank_mismatch_rejected() {
        let phase = grid(&[2, 2], vec![0.0; 4]);
        let quality = grid(&[2, 2], vec![0.0; 4]);
        let err = RegionGrower::new(&phase, &quality, &[0], GrowOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::SeedRankMismatch { rank: 2, .. }));
    }

    #[test]
    fn test_extent_mismatch_rejected() {
        let phase = grid(&[2, 3], vec![0.0; 6]);
        let quality = grid(&[3, 2], vec![0.0; 6]);
        let err = RegionGrower::new(&phase, &quality, &[0, 0], GrowOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::ExtentMismatch { .. }));
    }

    #[test]
    fn test_mask_extent_mismatch_rejected() {
        let phase = grid(&[2, 2], vec![0.0; 4]);
        let quality = grid(&[2, 2], vec![0.0; 4]);
        let mask = Grid::from_vec(&[4], vec![true; 4]).unwrap();
        let rule = crate::core::connectivity::MaskConnectivity::new(&mask);
        let err = RegionGrower::with_connectivity(
            &phase,
            &quality,
            &[0, 0],
            GrowOptions::default(),
            rule,
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::ExtentMismatch { what: "phase and mask", .. }));
    }

    #[test]
    fn test_disconnected_halves_stay_unresolved() {
        // 4x2 grid, columns 0-1 form A, columns 2-3 form B; no links across
        let dims = [4, 2];
        let phase = grid(&dims, vec![0.0, 6.0, 0.3, 6.2, 6.1, 0.2, 6.0, 0.1]);
        let quality = grid(&dims, vec![0.0; 8]);
        let extent = phase.extent().clone();
        let side = move |i: usize| extent.coords(i)[0] < 2;
        let rule = move |from: usize, to: usize| side(from) == side(to);

        let grower = RegionGrower::with_connectivity(
            &phase,
            &quality,
            &[0, 0],
            recorded(QualityOrder::Lower),
            rule,
        )
        .unwrap();
        let outcome = grower.run(&mut NoProgress).unwrap();

        let a = [0, 1, 4, 5];
        let b = [2, 3, 6, 7];
        for &i in &a {
            assert!(outcome.resolved_mask[i]);
        }
        for &i in &b {
            assert!(!outcome.resolved_mask[i]);
            assert_eq!(outcome.resolved[i], phase[i]);
        }
        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.resolved_count, 4);
        assert!(!outcome.is_complete());
        assert_eq!(outcome.unresolved_count(), 4);
    }

    #[test]
    fn test_all_ties_follow_index_order() {
        // 3x3, seed at the centre; equal quality everywhere
        let phase = grid(&[3, 3], vec![0.0; 9]);
        let quality = grid(&[3, 3], vec![1.0; 9]);
        let run = || {
            RegionGrower::new(&phase, &quality, &[1, 1], recorded(QualityOrder::Lower))
                .unwrap()
                .run(&mut NoProgress)
                .unwrap()
                .visit_order
                .unwrap()
        };
        let first = run();
        // Neighbors of 4 are 1,3,5,7; 1 goes first, then 0 and 2 join with
        // smaller indices than 3
        assert_eq!(first, vec![1, 0, 2, 3, 5, 6, 7, 8]);
        assert_eq!(first, run());
    }

    #[test]
    fn test_growth_prefers_homogeneous_region() {
        // Seed in the middle of a 1-D line. Left side is smooth (good quality),
        // right side is ragged (poor quality). The whole smooth side must be
        // resolved before any ragged sample.
        let n = 9;
        let seed = 4;
        let phase = grid(&[n], vec![0.0; n]);
        let variance: Vec<f64> = (0..n).map(|i| if i < seed { 0.01 } else { 0.8 }).collect();
        let reliability: Vec<f64> = variance.iter().map(|v| 1.0 - v).collect();

        for (order, scores) in [
            (QualityOrder::Lower, variance),
            (QualityOrder::Higher, reliability),
        ] {
            let quality = grid(&[n], scores);
            let visit = RegionGrower::new(&phase, &quality, &[seed], recorded(order))
                .unwrap()
                .run(&mut NoProgress)
                .unwrap()
                .visit_order
                .unwrap();
            assert_eq!(&visit[..4], &[3, 2, 1, 0], "order {order}");
            assert_eq!(&visit[4..], &[5, 6, 7, 8], "order {order}");
        }
    }

    #[test]
    fn test_step_mask_is_monotonic() {
        let dims = [4, 3];
        let phase = grid(&dims, (0..12).map(|i| (i as f64 * 1.7) % TWO_PI).collect());
        let quality = grid(&dims, (0..12).map(|i| ((i * 7) % 5) as f64).collect());
        let mut grower =
            RegionGrower::new(&phase, &quality, &[2, 1], GrowOptions::default()).unwrap();

        let mut previous = grower.resolved_mask().clone();
        let mut progress = NoProgress;
        while let Some(index) = grower.step(&mut progress).unwrap() {
            let current = grower.resolved_mask();
            for i in 0..current.len() {
                assert!(!previous[i] || current[i], "sample {i} reverted");
            }
            assert!(!previous[index] && current[index]);
            previous = current.clone();
        }
        assert_eq!(grower.state(), EngineState::Done);
        assert!(grower.resolved_mask().as_slice().iter().all(|&m| m));
    }

    #[test]
    fn test_congruence_and_local_consistency_2d() {
        let dims = [6, 5];
        // Tilted plane wrapped into [0, 2π)
        let truth: Vec<f64> = (0..30)
            .map(|i| {
                let (x, y) = ((i % 6) as f64, (i / 6) as f64);
                0.9 * x + 1.3 * y
            })
            .collect();
        let wrapped: Vec<f64> = truth.iter().map(|v| v.rem_euclid(TWO_PI)).collect();
        let phase = grid(&dims, wrapped.clone());
        let quality = grid(&dims, (0..30).map(|i| ((i * 13) % 7) as f64).collect());

        let outcome = RegionGrower::new(&phase, &quality, &[0, 0], GrowOptions::default())
            .unwrap()
            .run(&mut NoProgress)
            .unwrap();

        for i in 0..30 {
            let k = (outcome.resolved[i] - wrapped[i]) / TWO_PI;
            assert!((k - k.round()).abs() < 1e-9);
            // Gradient below π everywhere, so the plane is recovered exactly
            assert!((outcome.resolved[i] - truth[i]).abs() < 1e-9, "sample {i}");
        }
    }

    #[test]
    fn test_progress_accounting_matches_resolved_count() {
        let dims = [3, 3, 2];
        let phase = grid(&dims, vec![1.0; 18]);
        let quality = grid(&dims, (0..18).map(|i| i as f64).collect());
        let mut counter = CountingProgress::new();
        let outcome = RegionGrower::new(&phase, &quality, &[1, 1, 1], GrowOptions::default())
            .unwrap()
            .run(&mut counter)
            .unwrap();
        assert_eq!(counter.count() as usize, outcome.resolved_count);
        assert_eq!(outcome.resolved_count, 18);
    }

    #[test]
    fn test_cancellation_leaves_partial_grid() {
        let phase = grid(&[10], vec![0.0; 10]);
        let quality = grid(&[10], vec![0.0; 10]);
        let flag = CancelFlag::new();
        let mut grower = RegionGrower::new(&phase, &quality, &[0], GrowOptions::default()).unwrap();
        let mut sink = Cancellable::new(CountingProgress::new(), flag.clone());

        assert_eq!(grower.step(&mut sink).unwrap(), Some(1));
        assert_eq!(grower.step(&mut sink).unwrap(), Some(2));
        flag.cancel();
        assert_eq!(grower.step(&mut sink).unwrap(), None);
        assert_eq!(grower.state(), EngineState::Cancelled);
        // Further steps stay terminal
        assert_eq!(grower.step(&mut sink).unwrap(), None);

        let outcome = grower.into_outcome();
        assert_eq!(outcome.status, RunStatus::Cancelled);
        assert_eq!(outcome.resolved_count, 3);
        assert_eq!(
            outcome.resolved_mask.as_slice()[..4],
            [true, true, true, false]
        );
        assert_eq!(sink.into_inner().count(), 3);
    }

    #[test]
    fn test_runs_are_deterministic() {
        let dims = [7, 6];
        let phase = grid(&dims, (0..42).map(|i| ((i * 37) % 11) as f64 * 0.55).collect());
        let quality = grid(&dims, (0..42).map(|i| ((i * 5) % 4) as f64).collect());
        let go = || {
            RegionGrower::new(&phase, &quality, &[3, 2], recorded(QualityOrder::Higher))
                .unwrap()
                .run(&mut NoProgress)
                .unwrap()
        };
        let a = go();
        let b = go();
        let bits = |g: &Grid<f64>| g.as_slice().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.resolved), bits(&b.resolved));
        assert_eq!(a.visit_order, b.visit_order);
    }

    #[test]
    fn test_mask_connectivity_blocks_invalid_samples() {
        let dims = [5];
        let phase = grid(&dims, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        let quality = grid(&dims, vec![0.0; 5]);
        let valid = Grid::from_vec(&dims, vec![true, true, false, true, true]).unwrap();
        let rule = crate::core::connectivity::MaskConnectivity::new(&valid);
        let outcome =
            RegionGrower::with_connectivity(&phase, &quality, &[0], GrowOptions::default(), rule)
                .unwrap()
                .run(&mut NoProgress)
                .unwrap();
        assert_eq!(
            outcome.resolved_mask.as_slice(),
            &[true, true, false, false, false]
        );
    }

    #[test]
    fn test_invariant_failure_is_terminal() {
        let phase = grid(&[3], vec![0.0, 0.1, 0.2]);
        let quality = grid(&[3], vec![0.0; 3]);
        let links = std::cell::Cell::new(true);
        let rule = |_: usize, _: usize| links.get();
        let mut grower =
            RegionGrower::with_connectivity(&phase, &quality, &[1], GrowOptions::default(), rule)
                .unwrap();
        assert_eq!(grower.frontier_len(), 2);

        // Cut every link after the frontier was seeded
        links.set(false);
        let err = grower.step(&mut NoProgress).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
        assert!(!err.is_precondition());
        assert_eq!(grower.state(), EngineState::Failed);

        // Restoring the links does not resume the run
        links.set(true);
        let again = grower.step(&mut NoProgress).unwrap_err();
        assert_eq!(again.to_string(), err.to_string());
        assert_eq!(grower.state(), EngineState::Failed);

        let outcome = grower.into_outcome();
        assert_eq!(outcome.status, RunStatus::Failed);
        assert_eq!(outcome.resolved_mask.as_slice(), &[false, true, false]);
        assert_eq!(outcome.resolved_count, 1);
    }

    #[test]
    fn test_seed_signalled_once_by_step() {
        let phase = grid(&[1], vec![0.7]);
        let quality = grid(&[1], vec![0.0]);
        let mut grower =
            RegionGrower::new(&phase, &quality, &[0], GrowOptions::default()).unwrap();
        let mut counter = CountingProgress::new();
        assert_eq!(grower.step(&mut counter).unwrap(), None);
        assert_eq!(grower.step(&mut counter).unwrap(), None);
        assert_eq!(counter.count(), 1);
        assert_eq!(grower.into_outcome().resolved_count as u64, counter.count());
    }
}
