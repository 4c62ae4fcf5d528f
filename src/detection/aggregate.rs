use crate::models::{Detection, ResultSet};

/// Accumulates detections pass by pass into one [`ResultSet`].
///
/// Detections are appended as they arrive. Two passes reporting the same
/// physical object produce two entries; nothing is merged.
#[derive(Debug)]
pub struct ResultAggregator {
    results: ResultSet,
    passes: usize,
}

impl ResultAggregator {
    pub fn new(image_name: impl Into<String>) -> Self {
        Self {
            results: ResultSet::new(image_name),
            passes: 0,
        }
    }

    /// Append one pass worth of detections after everything already collected.
    pub fn push_pass(&mut self, detections: impl IntoIterator<Item = Detection>) {
        self.results.objects.extend(detections);
        self.passes += 1;
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn len(&self) -> usize {
        self.results.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.objects.is_empty()
    }

    pub fn finish(self) -> ResultSet {
        self.results
    }
}

/// Concatenate per-pass detections in pass order.
pub fn aggregate(image_name: &str, passes: impl IntoIterator<Item = Vec<Detection>>) -> ResultSet {
    let mut aggregator = ResultAggregator::new(image_name);
    for pass in passes {
        aggregator.push_pass(pass);
    }
    aggregator.finish()
}
