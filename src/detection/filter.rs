use std::collections::BTreeMap;

use crate::error::{FusionError, FusionResult};
use crate::models::RawDetection;

/// Per-model allow-list: raw class id → output label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedClasses {
    labels: BTreeMap<u32, String>,
}

impl AllowedClasses {
    /// Build an allow-list, rejecting empty labels.
    pub fn new<I, S>(entries: I) -> FusionResult<Self>
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        let mut labels = BTreeMap::new();
        for (class_id, label) in entries {
            let label = label.into();
            if label.trim().is_empty() {
                return Err(FusionError::Config(format!(
                    "class {class_id} has an empty label"
                )));
            }
            labels.insert(class_id, label);
        }
        Ok(Self { labels })
    }

    pub fn label(&self, class_id: u32) -> Option<&str> {
        self.labels.get(&class_id).map(String::as_str)
    }

    pub fn contains(&self, class_id: u32) -> bool {
        self.labels.contains_key(&class_id)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.values().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A raw detection that passed the filter, paired with its allow-list label.
#[derive(Debug, Clone, PartialEq)]
pub struct KeptDetection<'a> {
    pub raw: RawDetection,
    pub label: &'a str,
}

/// Keep detections at or above `threshold` whose class is allow-listed.
///
/// Input order is preserved. A confidence exactly equal to the threshold is kept.
pub fn filter_detections<'a>(
    raw: &[RawDetection],
    allowed: &'a AllowedClasses,
    threshold: f32,
) -> Vec<KeptDetection<'a>> {
    raw.iter()
        .filter(|d| d.confidence >= threshold)
        .filter_map(|d| {
            allowed
                .label(d.class_id)
                .map(|label| KeptDetection { raw: *d, label })
        })
        .collect()
}
