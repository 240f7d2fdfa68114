//! Boundary frontier for region growing
//!
//! A priority set of candidate samples keyed by linear index. Each index is
//! present at most once, and its score is fixed by the first insertion.
//! Extraction order is total: better quality first, then smaller index.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use priority_queue::PriorityQueue;
use serde::{Deserialize, Serialize};

use crate::core::error::Error;

/// Which direction of the quality scale is more reliable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityOrder {
    /// Variance-like scores: the smallest value is resolved first
    #[default]
    #[serde(alias = "lower-is-better")]
    Lower,
    /// Reliability scores: the largest value is resolved first
    #[serde(alias = "higher-is-better")]
    Higher,
}

impl fmt::Display for QualityOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityOrder::Lower => write!(f, "lower"),
            QualityOrder::Higher => write!(f, "higher"),
        }
    }
}

impl FromStr for QualityOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lower" | "lower-is-better" | "variance" => Ok(QualityOrder::Lower),
            "higher" | "higher-is-better" | "score" => Ok(QualityOrder::Higher),
            other => Err(Error::Config(format!(
                "unknown quality order '{other}', expected 'lower' or 'higher'"
            ))),
        }
    }
}

/// A sample waiting on the boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub quality: f64,
}

/// Heap key: larger compares as "resolve sooner"
#[derive(Debug, Clone, Copy)]
struct Priority {
    /// NaN scores are never preferred over real ones
    valid: bool,
    /// Quality oriented so that larger is better
    rank: f64,
    index: usize,
    /// Score as inserted; not part of the ordering
    quality: f64,
}

impl Priority {
    fn new(index: usize, quality: f64, order: QualityOrder) -> Self {
        if quality.is_nan() {
            return Self {
                valid: false,
                rank: 0.0,
                index,
                quality,
            };
        }
        let rank = match order {
            QualityOrder::Lower => -quality,
            QualityOrder::Higher => quality,
        };
        // -0.0 and 0.0 are the same score
        let rank = if rank == 0.0 { 0.0 } else { rank };
        Self {
            valid: true,
            rank,
            index,
            quality,
        }
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.valid
            .cmp(&other.valid)
            .then_with(|| self.rank.total_cmp(&other.rank))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Priority {}

/// Priority set of boundary candidates, deduplicated by index
pub struct Frontier {
    queue: PriorityQueue<usize, Priority>,
    order: QualityOrder,
}

impl Frontier {
    pub fn new(order: QualityOrder) -> Self {
        Self {
            queue: PriorityQueue::new(),
            order,
        }
    }

    pub fn with_capacity(order: QualityOrder, capacity: usize) -> Self {
        Self {
            queue: PriorityQueue::with_capacity(capacity),
            order,
        }
    }

    pub fn order(&self) -> QualityOrder {
        self.order
    }

    /// Insert `index` unless it is already waiting
    ///
    /// Returns `true` when the candidate was inserted. A present index keeps
    /// its original score.
    pub fn insert_or_ignore(&mut self, index: usize, quality: f64) -> bool {
        if self.queue.get_priority(&index).is_some() {
            return false;
        }
        self.queue.push(index, Priority::new(index, quality, self.order));
        true
    }

    /// Remove and return the most reliable candidate
    pub fn extract_best(&mut self) -> Option<Candidate> {
        self.queue.pop().map(|(index, priority)| Candidate {
            index,
            quality: priority.quality,
        })
    }

    /// The candidate [`extract_best`](Self::extract_best) would return
    pub fn peek_best(&self) -> Option<usize> {
        self.queue.peek().map(|(&index, _)| index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.queue.get_priority(&index).is_some()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
