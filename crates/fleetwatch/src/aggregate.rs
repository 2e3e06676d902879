//! Cross-aircraft merge of flight records.

use serde::Serialize;

use crate::record::FlightRecord;

/// Flight records from every aircraft, newest departure first.
///
/// Records with equal `first_seen` keep the order they arrived in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AggregatedView {
    records: Vec<FlightRecord>,
}

impl AggregatedView {
    /// An empty view.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The records, newest first.
    #[must_use]
    pub fn records(&self) -> &[FlightRecord] {
        &self.records
    }

    /// Iterate over the records, newest first.
    pub fn iter(&self) -> std::slice::Iter<'_, FlightRecord> {
        self.records.iter()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the view has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check the descending `first_seen` ordering.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.records
            .windows(2)
            .all(|w| w[0].first_seen >= w[1].first_seen)
    }
}

impl<'a> IntoIterator for &'a AggregatedView {
    type Item = &'a FlightRecord;
    type IntoIter = std::slice::Iter<'a, FlightRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Merge per-aircraft results into one view.
///
/// The inputs are concatenated in the order given (registry order), then
/// stable-sorted by `first_seen` descending. Nothing is deduplicated.
#[must_use]
pub fn merge<I>(per_aircraft: I) -> AggregatedView
where
    I: IntoIterator<Item = Vec<FlightRecord>>,
{
    let mut records: Vec<FlightRecord> = per_aircraft.into_iter().flatten().collect();
    // `sort_by` is stable.
    records.sort_by(|a, b| b.first_seen.cmp(&a.first_seen));
    AggregatedView { records }
}
