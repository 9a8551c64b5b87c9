//! Slicing buffers into fixed-length candidate slots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::buffer::BufferInterval;
use crate::error::{CoreError, CoreResult};
use crate::group::{DayGroup, Timed};
use crate::time::{TimeInterval, add_minutes};

/// A selectable session of exactly the requested length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateSlot {
    /// Day the slot belongs to.
    pub date: NaiveDate,
    /// The slot span.
    pub interval: TimeInterval,
}

impl CandidateSlot {
    /// Start of the slot.
    pub fn start(&self) -> DateTime<Utc> {
        self.interval.start()
    }

    /// End of the slot.
    pub fn end(&self) -> DateTime<Utc> {
        self.interval.end()
    }

    /// Length of the slot in whole minutes.
    pub fn minutes(&self) -> i64 {
        self.interval.whole_minutes()
    }
}

impl Timed for CandidateSlot {
    fn start_instant(&self) -> DateTime<Utc> {
        self.start()
    }
}

/// Rejects non-positive session lengths.
pub fn validate_duration(duration_minutes: i64) -> CoreResult<()> {
    if duration_minutes <= 0 {
        return Err(CoreError::InvalidDuration {
            minutes: duration_minutes,
        });
    }
    Ok(())
}

/// Carves `buffer` into slots of `duration_minutes`, packed from its start.
///
/// Each next candidate starts one minute after the previous one ends;
/// carving stops once a candidate would end after the buffer. A trailing
/// remainder shorter than the duration is dropped. Candidates starting or
/// ending before `now` are skipped without affecting the ones after them.
///
/// The loop runs at most `buffer.duration_minutes / duration_minutes + 1`
/// times whatever the buffer's instants say, and always stops at the
/// buffer's end.
pub fn generate_slots(
    buffer: &BufferInterval,
    date: NaiveDate,
    duration_minutes: i64,
    now: DateTime<Utc>,
) -> CoreResult<Vec<CandidateSlot>> {
    validate_duration(duration_minutes)?;
    if buffer.duration_minutes < duration_minutes {
        return Ok(Vec::new());
    }

    let max_iterations = (buffer.duration_minutes / duration_minutes).saturating_add(1);
    let mut slots = Vec::new();
    let mut start = buffer.start();

    for _ in 0..max_iterations {
        let candidate = TimeInterval::from_start(start, duration_minutes)?;
        if candidate.end() > buffer.end() {
            break;
        }
        if candidate.is_at_or_after(now) {
            slots.push(CandidateSlot {
                date,
                interval: candidate,
            });
        } else {
            trace!(start = %candidate.start(), "Skipping past candidate");
        }
        start = add_minutes(candidate.end(), 1)?;
    }

    Ok(slots)
}

/// Generates the slots of every buffer of one day, in buffer order.
pub fn day_slots(
    group: &DayGroup<BufferInterval>,
    duration_minutes: i64,
    now: DateTime<Utc>,
) -> CoreResult<DayGroup<CandidateSlot>> {
    validate_duration(duration_minutes)?;
    let mut slots = Vec::new();
    for buffer in &group.items {
        slots.extend(generate_slots(buffer, group.date, duration_minutes, now)?);
    }
    debug!(
        date = %group.date,
        buffers = group.items.len(),
        slots = slots.len(),
        "Generated slots"
    );
    Ok(DayGroup::new(group.date, slots))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, h, min, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn buffer(start: (u32, u32), end: (u32, u32)) -> BufferInterval {
        BufferInterval::new(TimeInterval::new(utc(start.0, start.1), utc(end.0, end.1)).unwrap())
    }

    fn spans(slots: &[CandidateSlot]) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        slots.iter().map(|s| (s.start(), s.end())).collect()
    }

    fn early() -> DateTime<Utc> {
        utc(0, 0)
    }

    #[test]
    fn single_slot_when_second_would_overflow() {
        let slots = generate_slots(&buffer((9, 1), (9, 29)), date(), 15, early()).unwrap();
        assert_eq!(spans(&slots), vec![(utc(9, 1), utc(9, 16))]);
        assert_eq!(slots[0].date, date());
        assert_eq!(slots[0].minutes(), 15);
    }

    #[test]
    fn packs_slots_one_minute_apart() {
        let slots = generate_slots(&buffer((9, 1), (10, 59)), date(), 30, early()).unwrap();
        assert_eq!(
            spans(&slots),
            vec![
                (utc(9, 1), utc(9, 31)),
                (utc(9, 32), utc(10, 2)),
                (utc(10, 3), utc(10, 33)),
            ]
        );
    }

    #[test]
    fn slot_may_end_exactly_at_buffer_end() {
        let slots = generate_slots(&buffer((9, 1), (9, 29)), date(), 28, early()).unwrap();
        assert_eq!(spans(&slots), vec![(utc(9, 1), utc(9, 29))]);
    }

    #[test]
    fn short_buffer_yields_nothing() {
        let slots = generate_slots(&buffer((9, 1), (9, 29)), date(), 45, early()).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn zero_length_buffer_yields_nothing() {
        let slots = generate_slots(&buffer((9, 1), (9, 1)), date(), 15, early()).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        for minutes in [0, -15] {
            let err =
                generate_slots(&buffer((9, 1), (9, 29)), date(), minutes, early()).unwrap_err();
            assert_eq!(err, CoreError::InvalidDuration { minutes });
        }
    }

    #[test]
    fn past_candidates_are_dropped() {
        // now sits inside the second candidate.
        let now = utc(9, 40);
        let slots = generate_slots(&buffer((9, 1), (10, 59)), date(), 30, now).unwrap();
        assert_eq!(spans(&slots), vec![(utc(10, 3), utc(10, 33))]);
        assert!(slots.iter().all(|s| s.start() >= now && s.end() >= now));
    }

    #[test]
    fn candidate_starting_at_now_is_kept() {
        let slots = generate_slots(&buffer((9, 1), (9, 29)), date(), 15, utc(9, 1)).unwrap();
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn iteration_is_bounded_by_recorded_duration() {
        // A buffer whose recorded duration disagrees with its instants must
        // not be carved past the bound.
        let malformed = BufferInterval {
            interval: TimeInterval::new(utc(9, 0), utc(17, 0)).unwrap(),
            duration_minutes: 30,
        };
        let slots = generate_slots(&malformed, date(), 15, early()).unwrap();
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn oversized_recorded_duration_stops_at_buffer_end() {
        let malformed = BufferInterval {
            interval: TimeInterval::new(utc(9, 0), utc(10, 0)).unwrap(),
            duration_minutes: i64::MAX,
        };
        let slots = generate_slots(&malformed, date(), 1, early()).unwrap();
        // One-minute slots every two minutes: 09:00, 09:02, ..., 09:58.
        assert_eq!(slots.len(), 30);
        assert_eq!(slots.last().unwrap().end(), utc(9, 59));
    }

    #[test]
    fn day_slots_flattens_buffers_in_order() {
        let group = DayGroup::new(
            date(),
            vec![buffer((9, 1), (9, 29)), buffer((11, 1), (11, 40))],
        );
        let slots = day_slots(&group, 15, early()).unwrap();
        assert_eq!(
            spans(&slots.items),
            vec![
                (utc(9, 1), utc(9, 16)),
                (utc(11, 1), utc(11, 16)),
                (utc(11, 17), utc(11, 32)),
            ]
        );
    }

    #[test]
    fn day_slots_validates_even_without_buffers() {
        let group: DayGroup<BufferInterval> = DayGroup::empty(date());
        assert!(day_slots(&group, 0, early()).is_err());
    }
}
