//! Projection of jagged collections into fixed-width per-event fields
//!
//! The objects of each event are ranked by decreasing value of a key
//! attribute, and the first N of them are exposed as flat per-event fields
//! named `<prefix>_<rank>_<attribute>` (ranks start at 1). Ranks beyond the
//! event's actual number of objects are filled with the dummy value, so the
//! output always has exactly N slots per event.

use crate::{
    error::Result,
    event::{Column, EventTable, ObjectCollection},
    jagged::Jagged,
    numeric::{Float, DUMMY_VALUE},
};

/// Per-event object order by decreasing key value
///
/// The sort is stable: objects with equal keys keep their original relative
/// order, which makes the ranking deterministic.
///
pub fn argsort_descending(objects: &ObjectCollection, key: &str) -> Result<Jagged<usize>> {
    let keys = objects.attribute(key)?;
    let mut order = Vec::with_capacity(keys.len());
    for range in objects.offsets().ranges() {
        let start = range.start;
        let mut local: Vec<usize> = (0..range.len()).collect();
        local.sort_by(|&a, &b| keys[start + b].total_cmp(&keys[start + a]));
        order.extend(local);
    }
    Ok(Jagged::new(objects.offsets().clone(), order))
}

/// Sort the objects of each event by decreasing key value
pub fn sort_descending(objects: &ObjectCollection, key: &str) -> Result<ObjectCollection> {
    Ok(objects.reorder(&argsort_descending(objects, key)?))
}

/// Value of an attribute for the object of a given rank (0-based) in each
/// event, or `dummy` where the event has fewer objects
pub fn padded_column(
    objects: &ObjectCollection,
    attribute: &str,
    rank: usize,
    dummy: Float,
) -> Result<Vec<Float>> {
    let values = objects.attribute(attribute)?;
    Ok(objects
        .offsets()
        .ranges()
        .map(|range| {
            if rank < range.len() {
                values[range.start + rank]
            } else {
                dummy
            }
        })
        .collect())
}

/// Expose the first `width` objects of each event as flat fields
///
/// Every attribute of the collection gets one field per rank. Objects are
/// taken in the order in which they appear in the collection.
///
pub fn add_object_fields(
    events: &mut EventTable,
    prefix: &str,
    objects: &ObjectCollection,
    width: usize,
    dummy: Float,
) -> Result<()> {
    let attributes: Vec<String> = objects.attributes().map(str::to_owned).collect();
    for rank in 0..width {
        for attribute in &attributes {
            let column = padded_column(objects, attribute, rank, dummy)?;
            let name = format!("{prefix}_{}_{attribute}", rank + 1);
            events.add_field(&name, Column::Float(column))?;
        }
    }
    Ok(())
}

/// Rank objects by decreasing key, then expose the first `width` of them
pub fn rank_and_pad(
    events: &mut EventTable,
    prefix: &str,
    objects: &ObjectCollection,
    key: &str,
    width: usize,
) -> Result<()> {
    let ranked = sort_descending(objects, key)?;
    add_object_fields(events, prefix, &ranked, width, DUMMY_VALUE)
}
