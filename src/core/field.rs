//! JSON documents for phase fields
//!
//! Input:
//! `{"extent": [nx, ny], "phase": [...], "quality": [...], "seed": [x, y]}`
//! with samples in axis-0-fastest order. `seed` is optional, as is a boolean
//! `mask` of valid samples.
//!
//! Output:
//! `{"extent": [...], "phase": [...], "resolved": [...], "status": "completed"}`

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::engine::{RunStatus, UnwrapOutcome};
use crate::core::error::Result;
use crate::core::grid::{Extent, Grid};

/// Wrapped phase plus quality, as read from disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseField {
    pub extent: Vec<usize>,
    pub phase: Vec<f64>,
    pub quality: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<bool>>,
}

impl PhaseField {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Validate lengths and build the phase and quality grids
    pub fn into_grids(self) -> Result<(Grid<f64>, Grid<f64>)> {
        let (phase, quality, _) = self.into_masked_grids()?;
        Ok((phase, quality))
    }

    /// Like [`PhaseField::into_grids`], also building the mask if present
    pub fn into_masked_grids(self) -> Result<(Grid<f64>, Grid<f64>, Option<Grid<bool>>)> {
        let extent = Extent::new(&self.extent)?;
        let mask = self
            .mask
            .map(|mask| Grid::new(extent.clone(), mask))
            .transpose()?;
        let phase = Grid::new(extent.clone(), self.phase)?;
        let quality = Grid::new(extent, self.quality)?;
        Ok((phase, quality, mask))
    }
}

/// Unwrapped result, as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnwrappedField {
    pub extent: Vec<usize>,
    pub phase: Vec<f64>,
    pub resolved: Vec<bool>,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_order: Option<Vec<usize>>,
}

impl From<UnwrapOutcome> for UnwrappedField {
    fn from(outcome: UnwrapOutcome) -> Self {
        Self {
            extent: outcome.resolved.extent().dims().to_vec(),
            phase: outcome.resolved.into_vec(),
            resolved: outcome.resolved_mask.into_vec(),
            status: outcome.status,
            visit_order: outcome.visit_order,
        }
    }
}

impl UnwrappedField {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        self.write(File::create(path)?)
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.iter().filter(|&&r| r).count()
    }
}
