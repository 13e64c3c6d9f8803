//! Pull drifted Preferred tasks back toward their requested start.

use chrono::Duration;
use tracing::debug;

use crate::config::{PlacementConfig, SnapBackConfig};
use crate::interval::Interval;
use crate::task::priority::placement_order;
use crate::task::Rigidity;

use super::draft::{PlacementEntry, ScheduleDraft};
use super::placer::PlacementBounds;

/// Neighbour shifts that make room for a snapped task.
type Moves = Vec<(usize, Interval)>;

pub struct SnapBack<'a> {
    config: &'a SnapBackConfig,
    granularity: Duration,
}

impl<'a> SnapBack<'a> {
    pub fn new(config: &'a SnapBackConfig, placement: &PlacementConfig) -> Self {
        Self {
            config,
            granularity: placement.granularity(),
        }
    }

    /// Offsets from the requested start, scanned outward: 0, +g, -g, +2g, ...
    fn offsets(&self) -> Vec<Duration> {
        let window = Duration::minutes(i64::from(self.config.window_minutes));
        let mut offsets = vec![Duration::zero()];
        let mut step = self.granularity;
        while step <= window {
            offsets.push(step);
            offsets.push(-step);
            step = step + self.granularity;
        }
        offsets
    }

    /// Snap every drifted Preferred task that can move cheaply.
    pub fn apply(&self, draft: &mut ScheduleDraft, bounds: &PlacementBounds) {
        if !self.config.enabled {
            return;
        }
        let trigger = Duration::minutes(i64::from(self.config.trigger_minutes));

        let mut drifted: Vec<usize> = draft
            .placements
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| {
                let task = p.as_task()?;
                let requested = task.requested_start?;
                let drift = (p.interval.start() - requested).num_minutes().abs();
                (task.rigidity == Rigidity::Preferred && drift > trigger.num_minutes())
                    .then_some(idx)
            })
            .collect();
        drifted.sort_by(|&a, &b| {
            match (draft.placements[a].as_task(), draft.placements[b].as_task()) {
                (Some(x), Some(y)) => placement_order(x, y),
                _ => a.cmp(&b),
            }
        });

        let mut snapped = 0usize;
        for idx in drifted {
            if self.try_snap(draft, idx, bounds) {
                snapped += 1;
            }
        }
        if snapped > 0 {
            debug!(snapped, "snap-back moved tasks");
        }
    }

    fn try_snap(&self, draft: &mut ScheduleDraft, idx: usize, bounds: &PlacementBounds) -> bool {
        let Some(task) = draft.placements[idx].as_task().cloned() else {
            return false;
        };
        let Some(requested) = task.requested_start else {
            return false;
        };
        let current = draft.placements[idx].interval;

        for offset in self.offsets() {
            let Some(candidate) = requested
                .checked_add_signed(offset)
                .and_then(|start| Interval::from_start(start, task.minutes()))
            else {
                continue;
            };
            if candidate == current || !bounds.admits(&task, &candidate, &draft.open) {
                continue;
            }
            let Some(moves) = self.ripple_moves(draft, idx, &candidate, bounds) else {
                continue;
            };

            debug!(
                task_id = %task.id,
                from = %current.start(),
                to = %candidate.start(),
                neighbours = moves.len(),
                "snapped task back"
            );
            draft.placements[idx].interval = candidate;
            for (j, moved) in moves {
                draft.placements[j].interval = moved;
            }
            return true;
        }
        false
    }

    /// Shifts the immediate neighbours need so `candidate` fits, or `None`
    /// when the ripple is too large or a shifted neighbour becomes invalid.
    fn ripple_moves(
        &self,
        draft: &ScheduleDraft,
        idx: usize,
        candidate: &Interval,
        bounds: &PlacementBounds,
    ) -> Option<Moves> {
        let mut before: Option<usize> = None;
        let mut after: Option<usize> = None;
        for (j, p) in draft.placements.iter().enumerate() {
            if j == idx || !p.interval.overlaps(candidate) {
                continue;
            }
            let side = if p.interval.start() < candidate.start() {
                &mut before
            } else {
                &mut after
            };
            if side.replace(j).is_some() {
                // more than one placement on one side is not an adjacent nudge
                return None;
            }
        }

        let mut moves: Moves = Vec::new();
        let mut ripple = 0i64;
        if let Some(j) = before {
            let iv = draft.placements[j].interval;
            let shift = candidate.start() - iv.end();
            ripple += shift.num_minutes().abs();
            moves.push((j, iv.shifted(shift)?));
        }
        if let Some(j) = after {
            let iv = draft.placements[j].interval;
            let shift = candidate.end() - iv.start();
            ripple += shift.num_minutes().abs();
            moves.push((j, iv.shifted(shift)?));
        }
        if ripple >= i64::from(self.config.max_ripple_minutes) {
            return None;
        }

        for &(j, moved) in &moves {
            let neighbour = &draft.placements[j];
            if neighbour.is_anchored() {
                return None;
            }
            let in_place = match &neighbour.entry {
                PlacementEntry::Task(t) => bounds.admits(t, &moved, &draft.open),
                PlacementEntry::Break => draft.open.iter().any(|o| o.contains(&moved)),
                PlacementEntry::Sleep => false,
            };
            if !in_place {
                return None;
            }
            let collides = draft.placements.iter().enumerate().any(|(k, p)| {
                k != idx && !moves.iter().any(|&(m, _)| m == k) && p.interval.overlaps(&moved)
            });
            if collides {
                return None;
            }
        }

        Some(moves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::draft::Placement;
    use crate::task::Task;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn iv(sh: u32, sm: u32, eh: u32, em: u32) -> Interval {
        Interval::new(at(sh, sm), at(eh, em)).unwrap()
    }

    fn draft() -> (ScheduleDraft, PlacementBounds) {
        let day = iv(8, 0, 20, 0);
        (
            ScheduleDraft::new(day, vec![day]),
            PlacementBounds::new(day, vec![day], at(8, 0)),
        )
    }

    fn snap(draft: &mut ScheduleDraft, bounds: &PlacementBounds) {
        let config = SnapBackConfig::default();
        let placement = PlacementConfig::default();
        SnapBack::new(&config, &placement).apply(draft, bounds);
    }

    fn placed(draft: &ScheduleDraft, id: &str) -> Interval {
        draft
            .placements
            .iter()
            .find(|p| p.task_id() == Some(id))
            .map(|p| p.interval)
            .unwrap()
    }

    fn preferred(id: &str, requested: DateTime<Utc>) -> Task {
        Task::new(id, id).with_duration(60).preferred_at(requested)
    }

    #[test]
    fn offsets_scan_outward() {
        let config = SnapBackConfig {
            window_minutes: 10,
            ..SnapBackConfig::default()
        };
        let placement = PlacementConfig::default();
        let offsets: Vec<i64> = SnapBack::new(&config, &placement)
            .offsets()
            .iter()
            .map(Duration::num_minutes)
            .collect();
        assert_eq!(offsets, vec![0, 5, -5, 10, -10]);
    }

    #[test]
    fn free_requested_slot_is_reclaimed() {
        let (mut d, bounds) = draft();
        d.place(preferred("p", at(10, 0)), iv(12, 0, 13, 0)).unwrap();
        snap(&mut d, &bounds);
        assert_eq!(placed(&d, "p"), iv(10, 0, 11, 0));
    }

    #[test]
    fn small_drift_is_left_alone() {
        let (mut d, bounds) = draft();
        d.place(preferred("p", at(10, 0)), iv(10, 20, 11, 20)).unwrap();
        snap(&mut d, &bounds);
        assert_eq!(placed(&d, "p"), iv(10, 20, 11, 20));
    }

    #[test]
    fn small_ripple_shifts_the_neighbour() {
        let (mut d, bounds) = draft();
        d.place(Task::new("f", "f").with_duration(63), iv(9, 0, 10, 3)).unwrap();
        d.place(preferred("p", at(10, 0)), iv(13, 0, 14, 0)).unwrap();
        snap(&mut d, &bounds);
        assert_eq!(placed(&d, "p"), iv(10, 0, 11, 0));
        assert_eq!(placed(&d, "f"), iv(8, 57, 10, 0));
    }

    #[test]
    fn ripple_of_five_moves_to_next_candidate() {
        let (mut d, bounds) = draft();
        d.place(Task::new("f", "f").with_duration(65), iv(9, 0, 10, 5)).unwrap();
        d.place(preferred("p", at(10, 0)), iv(13, 0, 14, 0)).unwrap();
        snap(&mut d, &bounds);
        assert_eq!(placed(&d, "p"), iv(10, 5, 11, 5));
        assert_eq!(placed(&d, "f"), iv(9, 0, 10, 5));
    }

    #[test]
    fn fixed_neighbours_never_shift() {
        let (mut d, bounds) = draft();
        d.place(
            Task::new("meeting", "m").with_duration(63).fixed_at(at(9, 0)),
            iv(9, 0, 10, 3),
        )
        .unwrap();
        d.place(preferred("p", at(10, 0)), iv(13, 0, 14, 0)).unwrap();
        snap(&mut d, &bounds);
        // 10:00 would need the meeting to move, so the next candidate wins
        assert_eq!(placed(&d, "meeting"), iv(9, 0, 10, 3));
        assert_eq!(placed(&d, "p"), iv(10, 5, 11, 5));
    }

    #[test]
    fn shifted_neighbour_may_not_collide() {
        let (mut d, bounds) = draft();
        d.place(
            Task::new("meeting", "m").with_duration(63).fixed_at(at(9, 0)),
            iv(9, 0, 10, 3),
        )
        .unwrap();
        d.placements.push(Placement::rest(iv(10, 3, 10, 33)));
        d.place(preferred("p", at(10, 0)), iv(13, 0, 14, 0)).unwrap();
        snap(&mut d, &bounds);
        assert_eq!(placed(&d, "p"), iv(13, 0, 14, 0));
        assert_eq!(d.breaks(), vec![iv(10, 3, 10, 33)]);
    }

    #[test]
    fn blocked_window_keeps_task_put() {
        let day = iv(8, 0, 20, 0);
        let mut d = ScheduleDraft::new(day, vec![iv(8, 0, 9, 0), iv(11, 30, 20, 0)]);
        let bounds = PlacementBounds::new(day, vec![day], at(8, 0));
        d.place(preferred("p", at(10, 0)), iv(13, 0, 14, 0)).unwrap();
        snap(&mut d, &bounds);
        assert_eq!(placed(&d, "p"), iv(13, 0, 14, 0));
    }

    #[test]
    fn disabled_snap_back_does_nothing() {
        let (mut d, bounds) = draft();
        d.place(preferred("p", at(10, 0)), iv(12, 0, 13, 0)).unwrap();
        let config = SnapBackConfig {
            enabled: false,
            ..SnapBackConfig::default()
        };
        SnapBack::new(&config, &PlacementConfig::default()).apply(&mut d, &bounds);
        assert_eq!(placed(&d, "p"), iv(12, 0, 13, 0));
    }
}
