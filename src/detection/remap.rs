use std::collections::BTreeMap;

use crate::error::{FusionError, FusionResult};

/// Label → class id written to the persisted output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputIdMap {
    ids: BTreeMap<String, u32>,
}

impl OutputIdMap {
    pub fn new<I, S>(entries: I) -> FusionResult<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut ids = BTreeMap::new();
        for (label, id) in entries {
            let label = label.into();
            if label.trim().is_empty() {
                return Err(FusionError::Config(
                    "output id map contains an empty label".to_string(),
                ));
            }
            ids.insert(label, id);
        }
        Ok(Self { ids })
    }

    /// Mapped id for `label`, or `raw_class_id` when the label has no entry.
    pub fn remap(&self, label: &str, raw_class_id: u32) -> u32 {
        self.ids.get(label).copied().unwrap_or(raw_class_id)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.ids.keys().map(String::as_str)
    }
}
