//! Contiguous per-partition ordinals.
//!
//! Records are grouped by partition (the artwork year). After every append or bulk
//! reorder the ordinals of each partition are exactly `1..=N`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An item carrying an ordinal within a partition
pub trait Ordered {
    fn ordinal_id(&self) -> &str;
    fn partition(&self) -> i32;
    fn ordinal(&self) -> u32;
    fn set_ordinal(&mut self, ordinal: u32);
}

impl<T: Ordered + ?Sized> Ordered for &mut T {
    fn ordinal_id(&self) -> &str {
        (**self).ordinal_id()
    }

    fn partition(&self) -> i32 {
        (**self).partition()
    }

    fn ordinal(&self) -> u32 {
        (**self).ordinal()
    }

    fn set_ordinal(&mut self, ordinal: u32) {
        (**self).set_ordinal(ordinal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    /// Towards ordinal 1
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Swapped ordinals with the named neighbour
    Moved { from: u32, to: u32 },
    /// Already first (or last) in its partition; nothing changed
    AtBoundary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdinalAssignment {
    pub id: String,
    pub ordinal: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderReport {
    /// Assignments matched to an existing id
    pub applied: usize,
    /// Ids not present in the collection. These are skipped, not rejected.
    pub ignored: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOrdinalId(pub String);

/// Renumber one partition to `1..=N`, keeping the current relative order.
/// Ties keep document order.
pub fn normalize_partition<T: Ordered>(items: &mut [T], partition: i32) {
    let mut indices: Vec<usize> = (0..items.len())
        .filter(|&i| items[i].partition() == partition)
        .collect();
    indices.sort_by_key(|&i| items[i].ordinal());
    for (position, idx) in indices.into_iter().enumerate() {
        items[idx].set_ordinal(position as u32 + 1);
    }
}

/// Renumber every partition to `1..=N`
pub fn normalize<T: Ordered>(items: &mut [T]) {
    let mut indices: Vec<usize> = (0..items.len()).collect();
    indices.sort_by_key(|&i| (items[i].partition(), items[i].ordinal()));

    let mut current: Option<i32> = None;
    let mut next = 1;
    for idx in indices {
        let partition = items[idx].partition();
        if current != Some(partition) {
            current = Some(partition);
            next = 1;
        }
        items[idx].set_ordinal(next);
        next += 1;
    }
}

/// Ordinal for a new item appended to `partition`: partition size + 1. The partition is
/// normalized first so the append cannot collide with a drifted ordinal.
pub fn append_ordinal<T: Ordered>(items: &mut [T], partition: i32) -> u32 {
    normalize_partition(items, partition);
    items.iter().filter(|i| i.partition() == partition).count() as u32 + 1
}

/// Swap the item's ordinal with its neighbour in the same partition
pub fn swap_move<T: Ordered>(
    items: &mut [T],
    id: &str,
    direction: MoveDirection,
) -> Result<MoveOutcome, UnknownOrdinalId> {
    let target = items
        .iter()
        .position(|i| i.ordinal_id() == id)
        .ok_or_else(|| UnknownOrdinalId(id.to_string()))?;
    let partition = items[target].partition();

    let mut siblings: Vec<usize> = (0..items.len())
        .filter(|&i| items[i].partition() == partition)
        .collect();
    siblings.sort_by_key(|&i| items[i].ordinal());

    let position = siblings
        .iter()
        .position(|&i| i == target)
        .ok_or_else(|| UnknownOrdinalId(id.to_string()))?;
    let neighbour = match direction {
        MoveDirection::Up if position > 0 => siblings[position - 1],
        MoveDirection::Down if position + 1 < siblings.len() => siblings[position + 1],
        _ => return Ok(MoveOutcome::AtBoundary),
    };

    let from = items[target].ordinal();
    let to = items[neighbour].ordinal();
    items[target].set_ordinal(to);
    items[neighbour].set_ordinal(from);
    Ok(MoveOutcome::Moved { from, to })
}

/// Apply caller-chosen ordinals, then renumber every partition of the collection.
///
/// Unknown ids are reported in [`ReorderReport::ignored`]. When several items end up
/// with the same ordinal they keep their document order.
pub fn bulk_reorder<T: Ordered>(items: &mut [T], assignments: &[OrdinalAssignment]) -> ReorderReport {
    let positions: HashMap<String, usize> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| (item.ordinal_id().to_string(), idx))
        .collect();

    let mut report = ReorderReport::default();
    for assignment in assignments {
        match positions.get(&assignment.id) {
            Some(&idx) => {
                items[idx].set_ordinal(assignment.ordinal);
                report.applied += 1;
            }
            None => report.ignored.push(assignment.id.clone()),
        }
    }

    normalize(items);
    report
}

/// True when every partition holds exactly `1..=N`
pub fn is_contiguous<T: Ordered>(items: &[T]) -> bool {
    let mut by_partition: HashMap<i32, Vec<u32>> = HashMap::new();
    for item in items {
        by_partition
            .entry(item.partition())
            .or_default()
            .push(item.ordinal());
    }
    by_partition.into_values().all(|mut ordinals| {
        ordinals.sort_unstable();
        ordinals
            .iter()
            .enumerate()
            .all(|(idx, &ordinal)| ordinal == idx as u32 + 1)
    })
}
