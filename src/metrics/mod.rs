//! Typed distance metrics, partitioned by the data type they accept.
//!
//! Metric identity is an exhaustive enum per bucket; the flat string-name
//! registry exists only at the public boundary (worker messages, UI lists)
//! and resolves to the internal tags immediately. Each name belongs to
//! exactly one bucket — the table is validated once at startup and a
//! duplicate name across buckets is a construction-time error, never
//! last-write-wins.

pub mod bit_array;
pub mod macromolecule;
pub mod measure;
pub mod string;
pub mod vector;

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bit_vector::BitVector;
use crate::error::{Result, SimError};

/// The data-type buckets metrics are partitioned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Vector,
    String,
    BitArray,
    MacroMolecule,
    Number,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Vector => "Vector",
            DataType::String => "String",
            DataType::BitArray => "BitArray",
            DataType::MacroMolecule => "MacroMolecule",
            DataType::Number => "Number",
        };
        write!(f, "{name}")
    }
}

/// Metrics over pairs of equal-length bit vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitArrayMetric {
    Tanimoto,
    Dice,
    Cosine,
    Asymmetric,
    BraunBlanquet,
    Russel,
    Sokal,
    Kulczynski,
    McConnaughey,
    RogotGoldberg,
    Hamming,
    Euclidean,
}

impl BitArrayMetric {
    /// The complete closed set of bit-array coefficients.
    pub fn all() -> [BitArrayMetric; 12] {
        [
            BitArrayMetric::Tanimoto,
            BitArrayMetric::Dice,
            BitArrayMetric::Cosine,
            BitArrayMetric::Asymmetric,
            BitArrayMetric::BraunBlanquet,
            BitArrayMetric::Russel,
            BitArrayMetric::Sokal,
            BitArrayMetric::Kulczynski,
            BitArrayMetric::McConnaughey,
            BitArrayMetric::RogotGoldberg,
            BitArrayMetric::Hamming,
            BitArrayMetric::Euclidean,
        ]
    }

    /// The subset registered for named dispatch. Hamming and Euclidean stay
    /// out of the name table (their names belong to other buckets there)
    /// and remain reachable through the typed similarity/distance calls.
    pub fn registered() -> [BitArrayMetric; 10] {
        [
            BitArrayMetric::Tanimoto,
            BitArrayMetric::Dice,
            BitArrayMetric::Cosine,
            BitArrayMetric::Asymmetric,
            BitArrayMetric::BraunBlanquet,
            BitArrayMetric::Russel,
            BitArrayMetric::Sokal,
            BitArrayMetric::Kulczynski,
            BitArrayMetric::McConnaughey,
            BitArrayMetric::RogotGoldberg,
        ]
    }

    /// Wire/UI name of this metric.
    pub fn name(&self) -> &'static str {
        match self {
            BitArrayMetric::Tanimoto => "Tanimoto",
            BitArrayMetric::Dice => "Dice",
            BitArrayMetric::Cosine => "Cosine",
            BitArrayMetric::Asymmetric => "Asymmetric",
            BitArrayMetric::BraunBlanquet => "BraunBlanquet",
            BitArrayMetric::Russel => "Russel",
            BitArrayMetric::Sokal => "Sokal",
            BitArrayMetric::Kulczynski => "Kulczynski",
            BitArrayMetric::McConnaughey => "McConnaughey",
            BitArrayMetric::RogotGoldberg => "RogotGoldberg",
            BitArrayMetric::Hamming => "Hamming",
            BitArrayMetric::Euclidean => "Euclidean",
        }
    }

    /// Similarity under this coefficient.
    pub fn similarity(&self, x: &BitVector, y: &BitVector) -> f32 {
        match self {
            BitArrayMetric::Tanimoto => bit_array::tanimoto_similarity(x, y),
            BitArrayMetric::Dice => bit_array::dice_similarity(x, y),
            BitArrayMetric::Cosine => bit_array::cosine_similarity(x, y),
            BitArrayMetric::Asymmetric => bit_array::asymmetric_similarity(x, y),
            BitArrayMetric::BraunBlanquet => bit_array::braun_blanquet_similarity(x, y),
            BitArrayMetric::Russel => bit_array::russel_similarity(x, y),
            BitArrayMetric::Sokal => bit_array::sokal_similarity(x, y),
            BitArrayMetric::Kulczynski => bit_array::kulczynski_similarity(x, y),
            BitArrayMetric::McConnaughey => bit_array::mcconnaughey_similarity(x, y),
            BitArrayMetric::RogotGoldberg => bit_array::rogot_goldberg_similarity(x, y),
            BitArrayMetric::Hamming => bit_array::hamming_similarity(x, y),
            BitArrayMetric::Euclidean => bit_array::euclidean_similarity(x, y),
        }
    }

    /// Distance under this coefficient (the dual of `similarity`).
    pub fn distance(&self, x: &BitVector, y: &BitVector) -> f32 {
        match self {
            BitArrayMetric::Tanimoto => bit_array::tanimoto_distance(x, y),
            BitArrayMetric::Dice => bit_array::dice_distance(x, y),
            BitArrayMetric::Cosine => bit_array::cosine_distance(x, y),
            BitArrayMetric::Asymmetric => bit_array::asymmetric_distance(x, y),
            BitArrayMetric::BraunBlanquet => bit_array::braun_blanquet_distance(x, y),
            BitArrayMetric::Russel => bit_array::russel_distance(x, y),
            BitArrayMetric::Sokal => bit_array::sokal_distance(x, y),
            BitArrayMetric::Kulczynski => bit_array::kulczynski_distance(x, y),
            BitArrayMetric::McConnaughey => bit_array::mcconnaughey_distance(x, y),
            BitArrayMetric::RogotGoldberg => bit_array::rogot_goldberg_distance(x, y),
            BitArrayMetric::Hamming => bit_array::hamming_distance(x, y),
            BitArrayMetric::Euclidean => bit_array::euclidean_distance(x, y),
        }
    }
}

/// Default similarity shortlist for chemical fingerprint comparison.
pub const CHEM_SIMILARITY_METRICS: [BitArrayMetric; 3] = [
    BitArrayMetric::Tanimoto,
    BitArrayMetric::Dice,
    BitArrayMetric::Cosine,
];

/// Default similarity shortlist for sequence-space analysis.
pub const SEQ_SPACE_SIMILARITY_METRICS: [BitArrayMetric; 4] = [
    BitArrayMetric::Tanimoto,
    BitArrayMetric::Asymmetric,
    BitArrayMetric::Cosine,
    BitArrayMetric::Sokal,
];

/// Metrics over pairs of strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringMetric {
    Levenshtein,
    JaroWinkler,
    Manhattan,
}

impl StringMetric {
    pub fn all() -> [StringMetric; 3] {
        [
            StringMetric::Levenshtein,
            StringMetric::JaroWinkler,
            StringMetric::Manhattan,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            StringMetric::Levenshtein => "Levenshtein",
            StringMetric::JaroWinkler => "Jaro-Winkler",
            StringMetric::Manhattan => "Manhattan",
        }
    }

    pub fn distance(&self, a: &str, b: &str) -> f32 {
        match self {
            StringMetric::Levenshtein => string::levenshtein_distance(a, b),
            StringMetric::JaroWinkler => string::jaro_winkler(a, b),
            StringMetric::Manhattan => string::manhattan_distance(a, b),
        }
    }
}

/// Metrics over pairs of real-valued vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorMetric {
    Euclidean,
}

impl VectorMetric {
    pub fn all() -> [VectorMetric; 1] {
        [VectorMetric::Euclidean]
    }

    pub fn name(&self) -> &'static str {
        match self {
            VectorMetric::Euclidean => "Euclidean",
        }
    }

    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            VectorMetric::Euclidean => vector::euclidean_distance_f32(a, b),
        }
    }
}

/// Metrics over pairs of scalar numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberMetric {
    NumericDistance,
}

impl NumberMetric {
    pub fn all() -> [NumberMetric; 1] {
        [NumberMetric::NumericDistance]
    }

    pub fn name(&self) -> &'static str {
        match self {
            NumberMetric::NumericDistance => "NumericDistance",
        }
    }

    pub fn distance(&self, a: f32, b: f32) -> f32 {
        match self {
            NumberMetric::NumericDistance => (a - b).abs(),
        }
    }
}

/// Metrics over macromolecule sequences; factories requiring options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroMoleculeMetric {
    Hamming,
    Levenshtein,
    NeedlemanWunsch,
}

impl MacroMoleculeMetric {
    pub fn all() -> [MacroMoleculeMetric; 3] {
        [
            MacroMoleculeMetric::Hamming,
            MacroMoleculeMetric::Levenshtein,
            MacroMoleculeMetric::NeedlemanWunsch,
        ]
    }

    /// Wire/UI names; the monomer-level Hamming and Levenshtein carry a
    /// prefix so the name table stays one-bucket-per-name.
    pub fn name(&self) -> &'static str {
        match self {
            MacroMoleculeMetric::Hamming => "Monomer Hamming",
            MacroMoleculeMetric::Levenshtein => "Monomer Levenshtein",
            MacroMoleculeMetric::NeedlemanWunsch => "Needleman-Wunsch",
        }
    }
}

/// A metric tagged with the bucket it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    BitArray(BitArrayMetric),
    String(StringMetric),
    Vector(VectorMetric),
    MacroMolecule(MacroMoleculeMetric),
    Number(NumberMetric),
}

impl MetricName {
    /// The data-type bucket this metric belongs to.
    pub fn data_type(&self) -> DataType {
        match self {
            MetricName::BitArray(_) => DataType::BitArray,
            MetricName::String(_) => DataType::String,
            MetricName::Vector(_) => DataType::Vector,
            MetricName::MacroMolecule(_) => DataType::MacroMolecule,
            MetricName::Number(_) => DataType::Number,
        }
    }

    /// Wire/UI name of this metric.
    pub fn name(&self) -> &'static str {
        match self {
            MetricName::BitArray(m) => m.name(),
            MetricName::String(m) => m.name(),
            MetricName::Vector(m) => m.name(),
            MetricName::MacroMolecule(m) => m.name(),
            MetricName::Number(m) => m.name(),
        }
    }

    /// Resolve a wire name through the validated registry.
    pub fn parse(name: &str) -> Option<MetricName> {
        registry().lookup(name)
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// String names are the boundary representation; tags are internal.
impl Serialize for MetricName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for MetricName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        MetricName::parse(&name)
            .ok_or_else(|| D::Error::custom(format!("unknown metric name '{name}'")))
    }
}

/// Validated one-to-one name→metric table across all buckets.
pub struct MetricRegistry {
    by_name: HashMap<&'static str, MetricName>,
    ordered: Vec<MetricName>,
}

impl MetricRegistry {
    /// Build and validate the table. A name appearing in more than one
    /// bucket is rejected here rather than silently overwritten.
    pub fn build() -> Result<Self> {
        let mut by_name: HashMap<&'static str, MetricName> = HashMap::new();
        let mut ordered = Vec::new();

        let mut insert = |metric: MetricName| -> Result<()> {
            if let Some(existing) = by_name.insert(metric.name(), metric) {
                return Err(SimError::invalid_argument(format!(
                    "metric name '{}' registered for both {} and {}",
                    metric.name(),
                    existing.data_type(),
                    metric.data_type(),
                )));
            }
            ordered.push(metric);
            Ok(())
        };

        for m in VectorMetric::all() {
            insert(MetricName::Vector(m))?;
        }
        for m in StringMetric::all() {
            insert(MetricName::String(m))?;
        }
        for m in BitArrayMetric::registered() {
            insert(MetricName::BitArray(m))?;
        }
        for m in MacroMoleculeMetric::all() {
            insert(MetricName::MacroMolecule(m))?;
        }
        for m in NumberMetric::all() {
            insert(MetricName::Number(m))?;
        }

        Ok(Self { by_name, ordered })
    }

    /// Look up a metric by wire name.
    pub fn lookup(&self, name: &str) -> Option<MetricName> {
        self.by_name.get(name).copied()
    }

    /// All registered metrics, in registration order.
    pub fn all(&self) -> &[MetricName] {
        &self.ordered
    }

    /// Registered metric names for one data-type bucket.
    pub fn metrics_by_data_type(&self, data_type: DataType) -> Vec<MetricName> {
        self.ordered
            .iter()
            .copied()
            .filter(|m| m.data_type() == data_type)
            .collect()
    }
}

/// The process-wide registry. The metric set is closed at compile time,
/// so construction cannot fail unless a name collision is introduced;
/// that is a programming error and panics at first use.
pub fn registry() -> &'static MetricRegistry {
    static REGISTRY: OnceLock<MetricRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        MetricRegistry::build().expect("metric name table must be collision-free")
    })
}

/// Flattened list of every registered metric name (UI contract).
pub fn available_metrics() -> Vec<&'static str> {
    registry().all().iter().map(|m| m.name()).collect()
}

/// Whether `name` resolves to a String-bucket metric.
pub fn is_string_metric(metric: MetricName) -> bool {
    metric.data_type() == DataType::String
}

/// Whether `name` resolves to a BitArray-bucket metric.
pub fn is_bit_array_metric(metric: MetricName) -> bool {
    metric.data_type() == DataType::BitArray
}

/// Whether `name` resolves to a Vector-bucket metric.
pub fn is_vector_metric(metric: MetricName) -> bool {
    metric.data_type() == DataType::Vector
}

/// Whether `name` resolves to a MacroMolecule-bucket metric.
pub fn is_macro_molecule_metric(metric: MetricName) -> bool {
    metric.data_type() == DataType::MacroMolecule
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builds_without_conflicts() {
        let reg = MetricRegistry::build().unwrap();
        // 1 vector + 3 string + 10 bit-array + 3 macromolecule + 1 number
        assert_eq!(reg.all().len(), 18);
    }

    #[test]
    fn test_every_name_maps_to_one_bucket() {
        let reg = registry();
        for metric in reg.all() {
            let resolved = reg.lookup(metric.name()).unwrap();
            assert_eq!(resolved.data_type(), metric.data_type());
        }
    }

    #[test]
    fn test_parse_known_names() {
        assert_eq!(
            MetricName::parse("Tanimoto"),
            Some(MetricName::BitArray(BitArrayMetric::Tanimoto))
        );
        assert_eq!(
            MetricName::parse("Euclidean"),
            Some(MetricName::Vector(VectorMetric::Euclidean))
        );
        assert_eq!(
            MetricName::parse("Needleman-Wunsch"),
            Some(MetricName::MacroMolecule(MacroMoleculeMetric::NeedlemanWunsch))
        );
        assert_eq!(MetricName::parse("NoSuchMetric"), None);
    }

    #[test]
    fn test_unregistered_bit_array_names() {
        // Hamming/Euclidean bit-array coefficients stay out of the table
        let reg = registry();
        assert_eq!(
            reg.lookup("Hamming"),
            None
        );
        assert_eq!(
            reg.lookup("Euclidean"),
            Some(MetricName::Vector(VectorMetric::Euclidean))
        );
    }

    #[test]
    fn test_metrics_by_data_type() {
        let bit = registry().metrics_by_data_type(DataType::BitArray);
        assert_eq!(bit.len(), 10);
        assert!(bit.iter().all(|m| m.data_type() == DataType::BitArray));
    }

    #[test]
    fn test_bucket_predicates() {
        assert!(is_bit_array_metric(MetricName::BitArray(BitArrayMetric::Dice)));
        assert!(is_string_metric(MetricName::String(StringMetric::Manhattan)));
        assert!(is_vector_metric(MetricName::Vector(VectorMetric::Euclidean)));
        assert!(is_macro_molecule_metric(MetricName::MacroMolecule(
            MacroMoleculeMetric::Hamming
        )));
    }

    #[test]
    fn test_metric_name_serde_roundtrip() {
        let metric = MetricName::BitArray(BitArrayMetric::Tanimoto);
        let json = serde_json::to_string(&metric).unwrap();
        assert_eq!(json, "\"Tanimoto\"");
        let back: MetricName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metric);
    }

    #[test]
    fn test_metric_name_deserialize_unknown_fails() {
        let res: std::result::Result<MetricName, _> = serde_json::from_str("\"Bogus\"");
        assert!(res.is_err());
    }

    #[test]
    fn test_shortlists() {
        assert_eq!(CHEM_SIMILARITY_METRICS.len(), 3);
        assert_eq!(SEQ_SPACE_SIMILARITY_METRICS.len(), 4);
        assert!(SEQ_SPACE_SIMILARITY_METRICS.contains(&BitArrayMetric::Sokal));
    }

    #[test]
    fn test_closed_coefficient_set() {
        let names: Vec<&str> = BitArrayMetric::all().iter().map(|m| m.name()).collect();
        assert_eq!(names.len(), 12);
        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 12);
        // the registered subset is the closed set minus Hamming/Euclidean
        assert!(BitArrayMetric::all().contains(&BitArrayMetric::Hamming));
        assert!(!BitArrayMetric::registered().contains(&BitArrayMetric::Hamming));
    }

    #[test]
    fn test_scalar_metric() {
        assert_eq!(NumberMetric::NumericDistance.distance(3.0, 7.5), 4.5);
        assert_eq!(NumberMetric::NumericDistance.distance(7.5, 3.0), 4.5);
    }
}
