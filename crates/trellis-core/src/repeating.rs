//! Repeating-group state and realized row ranges.
//!
//! The caller keeps a [`RepeatingGroups`] index with the highest active row of
//! every repeating group. [`row_range`] turns that index, together with the
//! group's `edit.filter` overrides, into the inclusive [`RowRange`] that row
//! expansion materializes.

use std::collections::HashMap;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::component::GroupEdit;

/// Map from repeating group id to its current state.
pub type RepeatingGroups = HashMap<String, RepeatingGroupState>;

/// Current state of one repeating group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatingGroupState {
    /// Highest active row, `-1` when the group has no rows.
    pub index: i64,

    /// Row currently opened for editing, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_index: Option<i64>,

    /// Page currently shown by a multi-page group, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_page_index: Option<i64>,
}

impl RepeatingGroupState {
    /// State with the given highest active row.
    pub fn new(index: i64) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }
}

/// Inclusive row range `[start, stop]`. Empty when `stop < start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    start: i64,
    stop: i64,
}

impl RowRange {
    /// The empty range `0..=-1`.
    pub const EMPTY: RowRange = RowRange { start: 0, stop: -1 };

    pub fn new(start: i64, stop: i64) -> Self {
        Self { start, stop }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn stop(&self) -> i64 {
        self.stop
    }

    pub fn is_empty(&self) -> bool {
        self.stop < self.start
    }

    /// Number of rows in the range.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.stop - self.start + 1) as usize
        }
    }

    /// Row indices in ascending order. Negative indices are skipped.
    pub fn indices(&self) -> impl Iterator<Item = usize> + use<> {
        let start = self.start.max(0);
        (start..=self.stop).map(|index| index as usize)
    }
}

/// Realizes the row range of a repeating group.
///
/// Without a stored index the range is empty. A `start` filter applies when it
/// does not exceed `index + 1`, otherwise the range starts at 0. A `stop`
/// filter (exclusive in the layout) applies when `stop - 1 < index`, otherwise
/// the range ends at `index`. Filter values that are not integers are ignored.
///
/// # Examples
///
/// ```
/// # use trellis_core::component::{FilterEntry, GroupEdit};
/// # use trellis_core::repeating::{RowRange, row_range};
/// assert_eq!(row_range(None, None), RowRange::EMPTY);
/// assert_eq!(row_range(Some(2), None), RowRange::new(0, 2));
///
/// let edit = GroupEdit {
///     filter: vec![FilterEntry::new("start", "1"), FilterEntry::new("stop", "3")],
///     ..Default::default()
/// };
/// assert_eq!(row_range(Some(5), Some(&edit)), RowRange::new(1, 2));
/// ```
pub fn row_range(index: Option<i64>, edit: Option<&GroupEdit>) -> RowRange {
    let Some(index) = index else {
        return RowRange::EMPTY;
    };

    let filter = |key: &str| {
        edit.and_then(|edit| edit.filter_value(key))
            .and_then(|value| value.trim().parse::<i64>().ok())
    };

    let start = match filter("start") {
        Some(start) if start <= index + 1 => start,
        _ => 0,
    };
    let stop = match filter("stop") {
        Some(stop) if stop - 1 < index => stop - 1,
        _ => index,
    };

    trace!(index = index, start = start, stop = stop; "Row range realized");
    RowRange::new(start, stop)
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;
    use crate::component::FilterEntry;

    fn check_range_stays_within_rows(index: i64, start: Option<i64>, stop: Option<i64>) {
        let filter = start
            .map(|start| FilterEntry::new("start", start.to_string()))
            .into_iter()
            .chain(stop.map(|stop| FilterEntry::new("stop", stop.to_string())))
            .collect();
        let edit = GroupEdit {
            filter,
            ..Default::default()
        };

        let range = row_range(Some(index), Some(&edit));
        let indices: Vec<_> = range.indices().collect();

        assert!(indices.iter().all(|&row| row as i64 <= index));
        assert!(indices.windows(2).all(|pair| pair[0] + 1 == pair[1]));
        if start.is_none() && stop.is_none() {
            assert_eq!(indices.len(), (index + 1).max(0) as usize);
        }
    }

    proptest! {
        #[test]
        fn range_stays_within_rows(
            index in -1i64..50,
            start in proptest::option::of(0i64..60),
            stop in proptest::option::of(0i64..60),
        ) {
            check_range_stays_within_rows(index, start, stop);
        }
    }
}
