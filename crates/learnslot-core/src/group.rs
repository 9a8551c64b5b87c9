//! Per-day grouping of timed items.
//!
//! [`group_by_day`] partitions events into [`DayGroup`]s ordered by date,
//! each internally ordered by start instant. The same container carries the
//! buffers and slots derived from those events further down the pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::event::CalendarEvent;
use crate::time::ReferenceZone;

/// Anything with a start instant that can be ordered within a day.
pub trait Timed {
    /// The instant the item starts.
    fn start_instant(&self) -> DateTime<Utc>;
}

impl Timed for CalendarEvent {
    fn start_instant(&self) -> DateTime<Utc> {
        self.start()
    }
}

/// A calendar day with the items that belong to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayGroup<T> {
    /// The day, in the reference zone.
    pub date: NaiveDate,
    /// Items of that day, ascending by start instant.
    pub items: Vec<T>,
}

impl<T> DayGroup<T> {
    /// Creates a group.
    pub fn new(date: NaiveDate, items: Vec<T>) -> Self {
        Self { date, items }
    }

    /// Creates a group with no items.
    pub fn empty(date: NaiveDate) -> Self {
        Self::new(date, Vec::new())
    }

    /// Returns true if the group has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items in the group.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Maps every item, keeping the date.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> DayGroup<U> {
        DayGroup {
            date: self.date,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Groups events by the calendar day of their start instant.
///
/// Groups come out ascending by date. Within a group events are sorted by
/// start instant with a stable sort, so events starting together keep their
/// input order.
pub fn group_by_day(
    events: &[CalendarEvent],
    zone: &ReferenceZone,
) -> Vec<DayGroup<CalendarEvent>> {
    let mut days: BTreeMap<NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();
    for event in events {
        days.entry(zone.date_of(event.start()))
            .or_default()
            .push(event.clone());
    }

    days.into_iter()
        .map(|(date, mut items)| {
            items.sort_by_key(|event| event.start());
            trace!(%date, count = items.len(), "Grouped events for day");
            DayGroup::new(date, items)
        })
        .collect()
}

/// Returns the total number of items across all groups.
pub fn total_items<T>(groups: &[DayGroup<T>]) -> usize {
    groups.iter().map(DayGroup::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, d, h, min, 0).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn event(id: &str, d: u32, h: u32, min: u32, len: i64) -> CalendarEvent {
        let start = utc(d, h, min);
        CalendarEvent::new(id, id, start, start + chrono::Duration::minutes(len), "Work").unwrap()
    }

    fn ids(group: &DayGroup<CalendarEvent>) -> Vec<&str> {
        group.items.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn empty_input() {
        assert!(group_by_day(&[], &ReferenceZone::utc()).is_empty());
    }

    #[test]
    fn groups_sorted_by_date_and_start() {
        let events = vec![
            event("c", 18, 9, 0, 30),
            event("b", 16, 14, 0, 30),
            event("a", 16, 8, 30, 30),
            event("d", 17, 10, 0, 30),
        ];
        let groups = group_by_day(&events, &ReferenceZone::utc());

        let dates: Vec<_> = groups.iter().map(|g| g.date).collect();
        assert_eq!(dates, vec![date(16), date(17), date(18)]);
        assert_eq!(ids(&groups[0]), vec!["a", "b"]);
        assert_eq!(ids(&groups[1]), vec!["d"]);
        assert_eq!(ids(&groups[2]), vec!["c"]);
        assert_eq!(total_items(&groups), 4);
    }

    #[test]
    fn ties_keep_input_order() {
        let events = vec![
            event("first", 16, 9, 0, 30),
            event("early", 16, 8, 0, 30),
            event("second", 16, 9, 0, 45),
        ];
        let groups = group_by_day(&events, &ReferenceZone::utc());
        assert_eq!(ids(&groups[0]), vec!["early", "first", "second"]);
    }

    #[test]
    fn same_output_for_any_permutation() {
        let a = event("a", 16, 8, 30, 30);
        let b = event("b", 16, 9, 30, 30);
        let c = event("c", 17, 7, 0, 60);
        let d = event("d", 16, 12, 0, 15);

        let expected = group_by_day(
            &[a.clone(), b.clone(), c.clone(), d.clone()],
            &ReferenceZone::utc(),
        );
        let permutations = [
            vec![d.clone(), c.clone(), b.clone(), a.clone()],
            vec![c.clone(), a.clone(), d.clone(), b.clone()],
            vec![b.clone(), d.clone(), a.clone(), c.clone()],
        ];
        for events in permutations {
            assert_eq!(group_by_day(&events, &ReferenceZone::utc()), expected);
        }
    }

    #[test]
    fn day_follows_reference_zone() {
        // 23:30 UTC on the 16th is already the 17th two hours east.
        let events = vec![event("late", 16, 23, 30, 20)];
        let zone = ReferenceZone::from_offset_minutes(120).unwrap();
        let groups = group_by_day(&events, &zone);
        assert_eq!(groups[0].date, date(17));
    }

    #[test]
    fn map_keeps_date() {
        let group = DayGroup::new(date(16), vec![1, 2, 3]);
        let doubled = group.map(|n| n * 2);
        assert_eq!(doubled.date, date(16));
        assert_eq!(doubled.items, vec![2, 4, 6]);
    }
}
