//! Link rules between adjacent samples
//!
//! The engine only grows across a pair of direct neighbors when the rule
//! links them. Unlinked regions are left unresolved rather than failing.

use crate::core::error::{Error, Result};
use crate::core::grid::{Extent, Grid};

/// Decides whether growth may cross from one sample to an adjacent one
pub trait Connectivity {
    /// `from` and `to` are linear indices of direct neighbors
    fn is_linked(&self, from: usize, to: usize) -> bool;

    /// Checked once before a run against the phase grid's extent
    fn validate(&self, _extent: &Extent) -> Result<()> {
        Ok(())
    }
}

/// Every pair of direct neighbors is linked
#[derive(Debug, Clone, Copy, Default)]
pub struct FullConnectivity;

impl Connectivity for FullConnectivity {
    fn is_linked(&self, _from: usize, _to: usize) -> bool {
        true
    }
}

/// Links two samples only when both are set in a validity mask
#[derive(Debug, Clone, Copy)]
pub struct MaskConnectivity<'a> {
    mask: &'a Grid<bool>,
}

impl<'a> MaskConnectivity<'a> {
    pub fn new(mask: &'a Grid<bool>) -> Self {
        Self { mask }
    }

    pub fn mask(&self) -> &Grid<bool> {
        self.mask
    }
}

impl Connectivity for MaskConnectivity<'_> {
    fn is_linked(&self, from: usize, to: usize) -> bool {
        self.mask[from] && self.mask[to]
    }

    fn validate(&self, extent: &Extent) -> Result<()> {
        if self.mask.extent().dims() != extent.dims() {
            return Err(Error::ExtentMismatch {
                what: "phase and mask",
                left: extent.dims().to_vec(),
                right: self.mask.extent().dims().to_vec(),
            });
        }
        Ok(())
    }
}

impl<F> Connectivity for F
where
    F: Fn(usize, usize) -> bool,
{
    fn is_linked(&self, from: usize, to: usize) -> bool {
        self(from, to)
    }
}
