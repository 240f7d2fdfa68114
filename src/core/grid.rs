//! Dense N-dimensional grids
//!
//! Samples live in one flat buffer with axis 0 varying fastest. The stride
//! table is computed once per extent, so neighbor enumeration is plain index
//! arithmetic.

use std::ops::{Index, IndexMut};

use crate::core::error::{Error, Result};

/// Shape of an N-dimensional grid plus its precomputed strides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extent {
    dims: Vec<usize>,
    strides: Vec<usize>,
    len: usize,
}

impl Extent {
    /// Create an extent from per-axis sizes
    ///
    /// Rejects zero dimensions, zero-length axes, and sample counts that do
    /// not fit in `usize`.
    pub fn new(dims: &[usize]) -> Result<Self> {
        if dims.is_empty() {
            return Err(Error::InvalidExtent {
                dims: dims.to_vec(),
                reason: "at least one dimension is required",
            });
        }
        if dims.contains(&0) {
            return Err(Error::InvalidExtent {
                dims: dims.to_vec(),
                reason: "every dimension must be at least 1",
            });
        }

        let mut strides = Vec::with_capacity(dims.len());
        let mut len: usize = 1;
        for &d in dims {
            strides.push(len);
            len = len.checked_mul(d).ok_or_else(|| Error::InvalidExtent {
                dims: dims.to_vec(),
                reason: "sample count overflows usize",
            })?;
        }

        Ok(Self {
            dims: dims.to_vec(),
            strides,
            len,
        })
    }

    /// Per-axis sizes
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of samples
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a valid extent holds at least one sample
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Linear index of `coords`, or `None` when outside the extent
    pub fn linear_index(&self, coords: &[usize]) -> Option<usize> {
        if coords.len() != self.dims.len() {
            return None;
        }
        let mut index = 0;
        for ((&c, &d), &s) in coords.iter().zip(&self.dims).zip(&self.strides) {
            if c >= d {
                return None;
            }
            index += c * s;
        }
        Some(index)
    }

    /// Coordinates of a linear index
    pub fn coords(&self, index: usize) -> Vec<usize> {
        self.dims
            .iter()
            .zip(&self.strides)
            .map(|(&d, &s)| (index / s) % d)
            .collect()
    }

    /// Direct axis-aligned neighbors of `index`
    ///
    /// Yields at most `2 * rank` linear indices: ascending axis, the negative
    /// step before the positive one. Steps that leave the extent are skipped.
    pub fn neighbors(&self, index: usize) -> Neighbors<'_> {
        Neighbors {
            extent: self,
            center: index,
            step: 0,
        }
    }
}

/// Lazy iterator over the in-extent direct neighbors of one sample
#[derive(Debug, Clone)]
pub struct Neighbors<'a> {
    extent: &'a Extent,
    center: usize,
    step: usize,
}

impl Iterator for Neighbors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.step < 2 * self.extent.rank() {
            let axis = self.step / 2;
            let positive = self.step % 2 == 1;
            self.step += 1;

            let stride = self.extent.strides[axis];
            let coord = (self.center / stride) % self.extent.dims[axis];

            if positive {
                if coord + 1 < self.extent.dims[axis] {
                    return Some(self.center + stride);
                }
            } else if coord > 0 {
                return Some(self.center - stride);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(2 * self.extent.rank() - self.step.min(2 * self.extent.rank())))
    }
}

/// Owned dense grid of samples
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    extent: Extent,
    data: Vec<T>,
}

impl<T> Grid<T> {
    /// Wrap a flat buffer; its length must equal the extent's sample count
    pub fn new(extent: Extent, data: Vec<T>) -> Result<Self> {
        if data.len() != extent.len() {
            return Err(Error::DataLengthMismatch {
                expected: extent.len(),
                actual: data.len(),
            });
        }
        Ok(Self { extent, data })
    }

    /// Build a grid from per-axis sizes and a flat buffer
    pub fn from_vec(dims: &[usize], data: Vec<T>) -> Result<Self> {
        Self::new(Extent::new(dims)?, data)
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `coords`, or `None` when outside the extent
    pub fn get(&self, coords: &[usize]) -> Option<&T> {
        self.extent.linear_index(coords).map(|i| &self.data[i])
    }

    pub fn get_mut(&mut self, coords: &[usize]) -> Option<&mut T> {
        self.extent.linear_index(coords).map(move |i| &mut self.data[i])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Apply `f` to every sample, keeping the extent
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Grid<U> {
        Grid {
            extent: self.extent.clone(),
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Fail unless `other` has exactly this grid's extent
    pub fn ensure_same_extent<U>(&self, other: &Grid<U>, what: &'static str) -> Result<()> {
        if self.extent.dims() != other.extent.dims() {
            return Err(Error::ExtentMismatch {
                what,
                left: self.extent.dims().to_vec(),
                right: other.extent.dims().to_vec(),
            });
        }
        Ok(())
    }
}

impl<T: Clone> Grid<T> {
    /// Grid with every sample set to `value`
    pub fn filled(extent: Extent, value: T) -> Self {
        let data = vec![value; extent.len()];
        Self { extent, data }
    }
}

impl<T> Index<usize> for Grid<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for Grid<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}
