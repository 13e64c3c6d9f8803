//! Integration tests for the retune pipeline.
//!
//! Each test builds a request snapshot for one day and checks the partition
//! the caller would persist.

use chrono::{DateTime, TimeZone, Utc};
use retune_core::{
    ClockTime, ClockWindow, DayPreferences, Interval, MoodSignal, RetuneConfig, RetuneOutcome,
    RetuneRequest, Retuner, Task, TaskStatus, UnschedulableReason,
};

fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
}

fn iv(start: DateTime<Utc>, end: DateTime<Utc>) -> Interval {
    Interval::new(start, end).unwrap()
}

fn prefs() -> DayPreferences {
    DayPreferences {
        day_start: ClockTime::hm(7, 0).unwrap(),
        day_length_minutes: 24 * 60,
        sleep_window: ClockWindow {
            start: ClockTime::hm(23, 0).unwrap(),
            end: ClockTime::hm(7, 0).unwrap(),
        },
        ideal_sleep_minutes: 8 * 60,
        min_sleep_minutes: 6 * 60,
        work_window: Some(ClockWindow {
            start: ClockTime::hm(9, 0).unwrap(),
            end: ClockTime::hm(18, 0).unwrap(),
        }),
    }
}

fn request(tasks: Vec<Task>) -> RetuneRequest {
    RetuneRequest::new(at(2, 8, 0), prefs()).with_tasks(tasks)
}

fn assert_no_overlaps(outcome: &RetuneOutcome) {
    let mut occupied: Vec<Interval> = outcome.scheduled.iter().map(|s| s.interval).collect();
    occupied.extend(outcome.sleep);
    occupied.sort();
    for pair in occupied.windows(2) {
        assert!(
            !pair[0].overlaps(&pair[1]),
            "{:?} overlaps {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_flexible_fills_first_slot_after_fixed_meeting() {
    let outcome = Retuner::new().retune(&request(vec![
        Task::new("standup", "Team sync")
            .with_duration(60)
            .with_difficulty(2)
            .fixed_at(at(2, 9, 0)),
        Task::new("inbox", "Inbox").with_duration(30),
    ]));

    let meeting = iv(at(2, 9, 0), at(2, 10, 0));
    assert_eq!(outcome.interval_of("standup"), Some(meeting));
    let inbox = outcome.interval_of("inbox").unwrap();
    assert_eq!(inbox, iv(at(2, 10, 0), at(2, 10, 30)));
    assert!(!inbox.overlaps(&meeting));
    assert_no_overlaps(&outcome);
}

#[test]
fn test_ideal_sleep_is_placed() {
    let outcome = Retuner::new().retune(&request(vec![Task::new("a", "a")]));
    assert_eq!(outcome.sleep, Some(iv(at(2, 23, 0), at(3, 7, 0))));
}

#[test]
fn test_tired_mood_defers_hard_work() {
    let req = request(vec![
        Task::new("taxes", "Taxes").with_difficulty(5),
        Task::new("laundry", "Laundry").with_difficulty(1),
    ])
    .with_mood(MoodSignal::new("tired", at(2, 7, 55)));

    let outcome = Retuner::new().retune(&req);
    assert!(outcome.is_deferred("taxes"));
    assert_eq!(outcome.deferred[0].status, TaskStatus::Pending);
    assert!(outcome.reason_for("taxes").is_none());
    assert!(outcome.interval_of("laundry").is_some());
}

#[test]
fn test_stale_mood_is_ignored() {
    let req = request(vec![Task::new("taxes", "Taxes").with_difficulty(5), Task::new("x", "x")])
        .with_mood(MoodSignal::new("exhausted", at(2, 6, 0)));
    let outcome = Retuner::new().retune(&req);
    assert!(outcome.deferred.is_empty());
    assert!(outcome.interval_of("taxes").is_some());
}

#[test]
fn test_competing_preferred_tasks() {
    let outcome = Retuner::new().retune(&request(vec![
        Task::new("review", "Code review")
            .with_importance(3)
            .with_duration(30)
            .preferred_at(at(2, 14, 0)),
        Task::new("design", "Design doc")
            .with_importance(5)
            .with_duration(60)
            .preferred_at(at(2, 14, 0)),
    ]));

    assert_eq!(
        outcome.interval_of("design"),
        Some(iv(at(2, 14, 0), at(2, 15, 0)))
    );
    assert_eq!(
        outcome.interval_of("review"),
        Some(iv(at(2, 13, 30), at(2, 14, 0)))
    );
}

#[test]
fn test_blocked_calendar_time_is_avoided() {
    let req = request(vec![Task::new("focus", "Deep work").with_duration(90)])
        .with_blocked(vec![iv(at(2, 9, 0), at(2, 12, 0))]);
    let outcome = Retuner::new().retune(&req);
    assert_eq!(
        outcome.interval_of("focus"),
        Some(iv(at(2, 12, 0), at(2, 13, 30)))
    );
}

#[test]
fn test_missed_deadline_is_reported() {
    let outcome = Retuner::new().retune(&request(vec![Task::new("report", "Report")
        .with_duration(60)
        .with_due(at(2, 9, 30))]));
    assert_eq!(
        outcome.reason_for("report"),
        Some(UnschedulableReason::WouldExceedDeadline)
    );
    assert_eq!(outcome.unschedulable[0].task.status, TaskStatus::NotSchedulable);
}

#[test]
fn test_conflicting_fixed_tasks() {
    let outcome = Retuner::new().retune(&request(vec![
        Task::new("board", "Board meeting")
            .with_importance(5)
            .with_duration(60)
            .fixed_at(at(2, 10, 0)),
        Task::new("dentist", "Dentist")
            .with_importance(2)
            .with_duration(60)
            .fixed_at(at(2, 10, 30)),
    ]));
    assert!(outcome.interval_of("board").is_some());
    assert_eq!(
        outcome.reason_for("dentist"),
        Some(UnschedulableReason::Overlap)
    );
}

#[test]
fn test_overfull_day_reports_no_open_block() {
    let tasks: Vec<Task> = (0..12)
        .map(|i| Task::new(format!("t{i:02}"), "chunk").with_duration(60))
        .collect();
    let outcome = Retuner::new().retune(&request(tasks));

    // the work window holds nine hours
    assert_eq!(outcome.scheduled.len() + outcome.unschedulable.len(), 12);
    assert!(outcome.scheduled.len() <= 9);
    assert!(outcome
        .unschedulable
        .iter()
        .all(|u| u.reason == UnschedulableReason::NoOpenBlock));
    assert_no_overlaps(&outcome);
}

#[test]
fn test_breaks_follow_long_work() {
    let outcome = Retuner::new().retune(&request(vec![
        Task::new("a", "a").with_importance(5).with_duration(60).with_difficulty(4),
        Task::new("b", "b").with_importance(4).with_duration(60).with_difficulty(4),
    ]));

    // a and b sit back to back, so the first break waits for the gap after b
    assert_eq!(
        outcome.interval_of("b"),
        Some(iv(at(2, 10, 0), at(2, 11, 0)))
    );
    assert_eq!(outcome.breaks.first(), Some(&iv(at(2, 11, 0), at(2, 11, 15))));
    for b in &outcome.breaks {
        assert!(outcome.scheduled.iter().all(|s| !s.interval.overlaps(b)));
    }
}

#[test]
fn test_breaks_can_be_disabled() {
    let mut config = RetuneConfig::default();
    config.set("breaks.enabled", "false").unwrap();
    let outcome = Retuner::with_config(config).retune(&request(vec![Task::new("a", "a")
        .with_duration(120)
        .with_difficulty(5)]));
    assert!(outcome.breaks.is_empty());
}

#[test]
fn test_completed_chunks_roll_up() {
    let outcome = Retuner::new().retune(&request(vec![
        Task::new("thesis", "Thesis chapter").with_status(TaskStatus::Overextended),
        Task::new("thesis-a", "Thesis chapter")
            .with_duration(50)
            .with_status(TaskStatus::Completed)
            .as_chunk_of("thesis", iv(at(1, 9, 0), at(1, 9, 50))),
        Task::new("thesis-b", "Thesis chapter")
            .with_duration(40)
            .with_status(TaskStatus::Completed)
            .as_chunk_of("thesis", iv(at(1, 14, 0), at(1, 14, 40))),
    ]));

    assert_eq!(outcome.retired, vec!["thesis-a", "thesis-b"]);
    assert_eq!(outcome.completed.len(), 1);
    let record = &outcome.completed[0];
    assert_eq!(record.id, "thesis");
    assert_eq!(record.status, TaskStatus::Completed);
    assert_eq!(record.duration_minutes, Some(90));
    assert_eq!(record.worked_ranges.len(), 2);
}

#[test]
fn test_rerun_on_own_output_is_stable() {
    let first = Retuner::new().retune(&request(vec![
        Task::new("sync", "Sync").with_duration(30).fixed_at(at(2, 11, 0)),
        Task::new("write", "Write").with_duration(90).with_importance(4),
        Task::new("call", "Call").with_duration(45).preferred_at(at(2, 11, 0)),
        Task::new("late", "Late").with_duration(30).with_due(at(2, 8, 10)),
    ]));

    let second = Retuner::new().retune(&request(first.tasks().cloned().collect()));
    let intervals = |o: &RetuneOutcome| -> Vec<(String, Interval)> {
        o.scheduled
            .iter()
            .map(|s| (s.task.id.clone(), s.interval))
            .collect()
    };
    assert_eq!(intervals(&first), intervals(&second));
    assert_eq!(first.breaks, second.breaks);
    assert_eq!(first.reason_for("late"), second.reason_for("late"));
}

#[test]
fn test_request_decodes_from_json_snapshot() {
    let json = r#"{
        "now": "2026-03-02T08:00:00Z",
        "preferences": {
            "sleep_window": {"start": "23:00", "end": "07:00"},
            "ideal_sleep_minutes": 480,
            "min_sleep_minutes": 360,
            "work_window": {"start": "09:00", "end": "18:00"}
        },
        "mood": {"label": "Okay", "observed_at": "2026-03-02T07:45:00Z"},
        "tasks": [
            {"id": "t1", "title": "Plan sprint", "duration_minutes": 45,
             "importance": 4, "difficulty": 2, "rigidity": "preferred",
             "requested_start": "2026-03-02T10:00:00Z"},
            {"id": "t2", "title": "Missing difficulty", "duration_minutes": 15,
             "importance": 2}
        ]
    }"#;
    let req: RetuneRequest = serde_json::from_str(json).unwrap();
    let outcome = Retuner::new().retune(&req);

    assert_eq!(
        outcome.interval_of("t1"),
        Some(iv(at(2, 10, 0), at(2, 10, 45)))
    );
    assert_eq!(outcome.invalid.len(), 1);
    assert!(outcome.invalid[0].error.contains("difficulty"));

    let encoded = serde_json::to_value(&outcome).unwrap();
    assert_eq!(encoded["scheduled"][0]["task"]["status"], "SCHEDULED");
}

#[test]
fn test_break_never_displaces_a_preferred_task() {
    let req = RetuneRequest::new(at(2, 9, 0), prefs()).with_tasks(vec![
        Task::new("a", "a").with_duration(60).with_difficulty(3),
        Task::new("b", "b")
            .with_duration(30)
            .with_difficulty(1)
            .preferred_at(at(2, 10, 0)),
    ]);
    let outcome = Retuner::new().retune(&req);
    assert_eq!(outcome.interval_of("a"), Some(iv(at(2, 9, 0), at(2, 10, 0))));
    assert_eq!(
        outcome.interval_of("b"),
        Some(iv(at(2, 10, 0), at(2, 10, 30)))
    );
}

#[test]
fn test_fixed_task_on_calendar_commitment_is_overlap() {
    let commitment = iv(at(2, 10, 0), at(2, 11, 0));
    let req = request(vec![Task::new("f", "Fixed")
        .with_duration(60)
        .fixed_at(at(2, 10, 0))])
    .with_blocked(vec![commitment]);
    let outcome = Retuner::new().retune(&req);
    assert_eq!(outcome.interval_of("f"), None);
    assert_eq!(outcome.reason_for("f"), Some(UnschedulableReason::Overlap));
}

#[test]
fn test_work_window_straddling_day_start() {
    let mut p = prefs();
    p.work_window = Some(ClockWindow {
        start: ClockTime::hm(6, 0).unwrap(),
        end: ClockTime::hm(10, 0).unwrap(),
    });
    let req = RetuneRequest::new(at(2, 7, 30), p)
        .with_tasks(vec![Task::new("t", "Early").with_duration(30)]);
    let outcome = Retuner::new().retune(&req);
    assert_eq!(
        outcome.interval_of("t"),
        Some(iv(at(2, 7, 30), at(2, 8, 0)))
    );
}

#[test]
fn test_request_at_the_end_of_time_is_reported_not_fatal() {
    let json = r#"{
        "now": "2026-03-02T08:00:00Z",
        "preferences": {
            "sleep_window": {"start": "23:00", "end": "07:00"},
            "ideal_sleep_minutes": 480,
            "min_sleep_minutes": 360
        },
        "tasks": [
            {"id": "far", "title": "Far", "duration_minutes": 60, "importance": 3,
             "difficulty": 3, "rigidity": "fixed",
             "requested_start": "+262142-12-31T23:30:00Z"},
            {"id": "near", "title": "Near", "duration_minutes": 30, "importance": 3,
             "difficulty": 3}
        ]
    }"#;
    let req: RetuneRequest = serde_json::from_str(json).unwrap();
    let outcome = Retuner::new().retune(&req);
    assert_eq!(outcome.reason_for("far"), Some(UnschedulableReason::NoOpenBlock));
    assert!(outcome.interval_of("near").is_some());
}

#[test]
fn test_now_after_work_window_leaves_day_unschedulable() {
    let req = RetuneRequest::new(at(2, 19, 0), prefs())
        .with_tasks(vec![Task::new("evening", "Evening").with_duration(30)]);
    let outcome = Retuner::new().retune(&req);
    assert_eq!(
        outcome.reason_for("evening"),
        Some(UnschedulableReason::NoOpenBlock)
    );
}
