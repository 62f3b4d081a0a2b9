//! Feature Vector - Core data structure for packet model input
//!
//! Versioned vector tied to the layout in `layout.rs`, so a vector logged or
//! exported today can be checked against the layout a model expects.

use serde::{Deserialize, Serialize};

use super::layout::{feature_index, layout_hash, validate_layout, FEATURE_COUNT, FEATURE_VERSION};
use crate::CoreResult;

/// Trait for anything that writes its slots into a [`FeatureVector`]
pub trait FeatureExtractor {
    fn extract(&self, vector: &mut FeatureVector);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout (for mismatch detection)
    pub layout_hash: u32,
    /// Slot values in layout order
    #[serde(with = "slots")]
    pub values: [f32; FEATURE_COUNT],
}

impl FeatureVector {
    /// Zeroed vector with the current layout
    pub fn new() -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values: [0.0; FEATURE_COUNT],
        }
    }

    pub fn from_values(values: [f32; FEATURE_COUNT]) -> Self {
        Self { values, ..Self::new() }
    }

    /// Create from a Vec<f32> (truncates or pads if wrong size)
    pub fn from_vec(values: Vec<f32>) -> Self {
        let mut array = [0.0; FEATURE_COUNT];
        for (slot, v) in array.iter_mut().zip(values) {
            *slot = v;
        }
        Self::from_values(array)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        feature_index(name).and_then(|i| self.get(i))
    }

    /// Out-of-range indices are ignored
    pub fn set(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }

    pub fn set_by_name(&mut self, name: &str, value: f32) -> bool {
        match feature_index(name) {
            Some(index) => {
                self.set(index, value);
                true
            }
            None => false,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        validate_layout(self.version, self.layout_hash)
    }

    pub fn is_compatible(&self) -> bool {
        self.validate().is_ok()
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

/// serde only derives arrays up to 32 elements; slots travel as a plain sequence
mod slots {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::FEATURE_COUNT;

    pub fn serialize<S: Serializer>(values: &[f32; FEATURE_COUNT], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[f32; FEATURE_COUNT], D::Error> {
        let values = Vec::<f32>::deserialize(deserializer)?;
        let len = values.len();
        values
            .try_into()
            .map_err(|_| D::Error::invalid_length(len, &"one value per feature slot"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vector_is_zeroed_and_compatible() {
        let v = FeatureVector::new();
        assert_eq!(v.values.len(), FEATURE_COUNT);
        assert!(v.values.iter().all(|&x| x == 0.0));
        assert!(v.is_compatible());
    }

    #[test]
    fn test_from_vec_pads_and_truncates() {
        let short = FeatureVector::from_vec(vec![1.0, 2.0]);
        assert_eq!(short.values.len(), FEATURE_COUNT);
        assert_eq!(short.get(1), Some(2.0));
        assert_eq!(short.get(2), Some(0.0));

        let long = FeatureVector::from_vec(vec![5.0; FEATURE_COUNT + 10]);
        assert_eq!(long.get(FEATURE_COUNT - 1), Some(5.0));
    }

    #[test]
    fn test_serde_keeps_every_slot() {
        let mut v = FeatureVector::new();
        v.set_by_name("dst_port", 22.0);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["values"].as_array().unwrap().len(), FEATURE_COUNT);

        let back: FeatureVector = serde_json::from_value(json).unwrap();
        assert_eq!(back.get_by_name("dst_port"), Some(22.0));
        assert!(back.is_compatible());

        let short = serde_json::json!({ "version": 1, "layout_hash": v.layout_hash, "values": [1.0, 2.0] });
        assert!(serde_json::from_value::<FeatureVector>(short).is_err());
    }

    #[test]
    fn test_set_by_name() {
        let mut v = FeatureVector::new();
        assert!(v.set_by_name("dst_port", 443.0));
        assert!(!v.set_by_name("bogus", 1.0));
        assert_eq!(v.get_by_name("dst_port"), Some(443.0));

        v.set(500, 1.0);
        assert_eq!(v.get(500), None);
    }
}
