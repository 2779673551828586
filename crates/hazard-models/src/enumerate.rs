//! Batch item enumeration.

use std::collections::HashSet;

use hazard_common::BatchItem;

/// Cross product of gcms × scenarios × central years.
///
/// Order is gcm-major, then scenario, then year, following the order of the
/// input lists. Repeated entries are collapsed to their first occurrence so
/// that every item (and therefore every storage path) is distinct. Any empty
/// list yields an empty sequence.
pub fn enumerate_items<G, S>(gcms: &[G], scenarios: &[S], central_years: &[i32]) -> Vec<BatchItem>
where
    G: AsRef<str>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(gcms.len() * scenarios.len() * central_years.len());
    for gcm in gcms {
        for scenario in scenarios {
            for &year in central_years {
                let item = BatchItem::new(gcm.as_ref(), scenario.as_ref(), year);
                if seen.insert(item.clone()) {
                    items.push(item);
                }
            }
        }
    }
    items
}

/// Remove repeated items, keeping the first occurrence of each.
pub fn dedup_items(items: &[BatchItem]) -> Vec<BatchItem> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert((*item).clone()))
        .cloned()
        .collect()
}
