//! The measure dispatcher: one entry point that erases the metric-bucket
//! distinction for calling code.
//!
//! Every metric is constructed through a factory taking an options value;
//! the options are unit-like for the parameterless buckets and carry
//! alignment configuration for macromolecule metrics. The result is a
//! distance function bound to a column of data, indexed by item position —
//! the representation the embedding layer consumes.

use serde::{Deserialize, Serialize};

use crate::bit_vector::BitVector;
use crate::error::{Result, SimError};
use crate::metrics::macromolecule::{
    mm_hamming_distance, mm_levenshtein_distance, needleman_wunsch_distance,
    NeedlemanWunschOptions,
};
use crate::metrics::{DataType, MacroMoleculeMetric, MetricName};

/// A column of same-typed items, the unit of input to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ColumnData {
    BitVectors(Vec<BitVector>),
    Vectors(Vec<Vec<f32>>),
    Strings(Vec<String>),
    Numbers(Vec<f32>),
}

impl ColumnData {
    /// Number of items in the column.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::BitVectors(v) => v.len(),
            ColumnData::Vectors(v) => v.len(),
            ColumnData::Strings(v) => v.len(),
            ColumnData::Numbers(v) => v.len(),
        }
    }

    /// Whether the column holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> &'static str {
        match self {
            ColumnData::BitVectors(_) => "BitVectors",
            ColumnData::Vectors(_) => "Vectors",
            ColumnData::Strings(_) => "Strings",
            ColumnData::Numbers(_) => "Numbers",
        }
    }
}

/// Construction-time options threaded through metric factories.
/// Empty for every bucket except MacroMolecule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricOptions {
    /// Alignment options for the Needleman-Wunsch metric; defaults apply
    /// when absent.
    pub needleman_wunsch: Option<NeedlemanWunschOptions>,
}

/// A distance function bound to one column, indexed by item position.
pub type PairDistanceFn<'a> = Box<dyn Fn(usize, usize) -> f32 + Send + Sync + 'a>;

/// Unified dispatcher over the metric buckets.
#[derive(Debug, Clone, Copy)]
pub struct Measure {
    metric: MetricName,
}

impl Measure {
    /// Create a dispatcher for the given metric.
    pub fn new(metric: MetricName) -> Self {
        Self { metric }
    }

    /// The metric this measure dispatches to.
    pub fn metric(&self) -> MetricName {
        self.metric
    }

    /// The data-type bucket the metric belongs to.
    pub fn data_type(&self) -> DataType {
        self.metric.data_type()
    }

    /// Bind the metric to a column, validating data-type compatibility and
    /// per-bucket invariants (equal bit-vector/vector lengths) before any
    /// computation starts.
    pub fn bind<'a>(
        &self,
        data: &'a ColumnData,
        opts: &MetricOptions,
    ) -> Result<PairDistanceFn<'a>> {
        match (self.metric, data) {
            (MetricName::BitArray(m), ColumnData::BitVectors(items)) => {
                check_equal_lengths(items.iter().map(|v| v.len()))?;
                Ok(Box::new(move |i, j| m.distance(&items[i], &items[j])))
            }
            (MetricName::Vector(m), ColumnData::Vectors(items)) => {
                check_equal_lengths(items.iter().map(|v| v.len()))?;
                Ok(Box::new(move |i, j| m.distance(&items[i], &items[j])))
            }
            (MetricName::String(m), ColumnData::Strings(items)) => {
                Ok(Box::new(move |i, j| m.distance(&items[i], &items[j])))
            }
            (MetricName::Number(m), ColumnData::Numbers(items)) => {
                Ok(Box::new(move |i, j| m.distance(items[i], items[j])))
            }
            (MetricName::MacroMolecule(m), ColumnData::Strings(items)) => {
                let f = match m {
                    MacroMoleculeMetric::Hamming => mm_hamming_distance(),
                    MacroMoleculeMetric::Levenshtein => mm_levenshtein_distance(),
                    MacroMoleculeMetric::NeedlemanWunsch => needleman_wunsch_distance(
                        opts.needleman_wunsch.clone().unwrap_or_default(),
                    ),
                };
                Ok(Box::new(move |i, j| f(&items[i], &items[j])))
            }
            (metric, data) => Err(SimError::not_found(format!(
                "unknown measure {} for data type {} (column holds {})",
                metric.name(),
                metric.data_type(),
                data.kind(),
            ))),
        }
    }
}

fn check_equal_lengths(lengths: impl Iterator<Item = usize>) -> Result<()> {
    let mut expected = None;
    for (i, len) in lengths.enumerate() {
        match expected {
            None => expected = Some(len),
            Some(first) if first != len => {
                return Err(SimError::invalid_argument(format!(
                    "items must have equal length: item 0 has {first}, item {i} has {len}"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
