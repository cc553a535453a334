//! Slot generation over a single work-schedule window.
//!
//! The walk keeps one cursor (minutes since midnight). At each position the
//! candidate `[cursor, cursor + duration)` is tested against breaks, then
//! appointments, then group activities, then the "already passed" cutoff.
//! [`advance`] decides what happens next; [`generate_slots`] only loops.

use crate::models::{MinuteWindow, SlotConflicts};
use crate::services::clock::{overlaps, round_up_to_next_slot};

/// Outcome of testing the candidate slot at one cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The candidate is free and in the future.
    Free,
    /// The candidate is blocked; retry from this cursor.
    SkipTo(u32),
}

/// Latest end among `windows` overlapping the candidate, if any overlaps.
fn latest_overlapping_end(windows: &[MinuteWindow], start: u32, end: u32) -> Option<u32> {
    windows
        .iter()
        .filter(|w| !w.is_empty() && overlaps(start, end, w.start, w.end))
        .map(|w| w.end)
        .max()
}

/// Tests the candidate at `cursor`.
///
/// `cutoff` is `Some(now + buffer)` when the day is today: candidates starting
/// at or before it have passed and are retried one minute later.
pub fn advance(cursor: u32, duration: u32, conflicts: &SlotConflicts, cutoff: Option<u32>) -> Advance {
    let end = cursor.saturating_add(duration);
    let next_minute = cursor.saturating_add(1);

    for blockers in [&conflicts.breaks, &conflicts.appointments, &conflicts.group_activities] {
        if let Some(blocked_until) = latest_overlapping_end(blockers, cursor, end) {
            return Advance::SkipTo(blocked_until.max(next_minute));
        }
    }

    match cutoff {
        Some(cutoff) if cursor <= cutoff => Advance::SkipTo(next_minute),
        _ => Advance::Free,
    }
}

/// Walks `window` in `duration`-sized steps and returns every free slot.
pub fn generate_slots(
    window: MinuteWindow,
    conflicts: &SlotConflicts,
    duration: u32,
    cutoff: Option<u32>,
) -> Vec<MinuteWindow> {
    let mut slots = Vec::new();
    if duration == 0 || window.is_empty() {
        return slots;
    }

    let mut cursor = window.start;
    if let Some(cutoff) = cutoff {
        let next_boundary = round_up_to_next_slot(cutoff, duration);
        if next_boundary > cursor {
            cursor = next_boundary;
        }
    }

    // A candidate end past u32::MAX can never fit the window.
    while let Some(end) = cursor.checked_add(duration).filter(|end| *end <= window.end) {
        match advance(cursor, duration, conflicts, cutoff) {
            Advance::Free => {
                slots.push(MinuteWindow::new(cursor, end));
                cursor = end;
            }
            Advance::SkipTo(next) => cursor = next,
        }
    }

    slots
}
