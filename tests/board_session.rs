use std::time::Duration;

use pmtui::board::color::{FALLBACK_COLOR, text_color_for_bg};
use pmtui::board::engine::TaskBoardEngine;
use pmtui::board::handoff;
use pmtui::board::model::{Project, TaskDraft, parse_date};
use pmtui::board::schedule::day_overlay;
use pmtui::config::Config;

fn project() -> Project {
    Project {
        id: "2".to_owned(),
        name: "Robotics Automation System".to_owned(),
        description: "Real-time robotic motion planning and AI vision.".to_owned(),
        deadline: parse_date("2025-11-15").ok(),
        budget: None,
        progress: Some(72),
        departments: vec!["Software Debug".to_owned()],
    }
}

fn engine() -> TaskBoardEngine {
    let cfg = Config::default();
    TaskBoardEngine::with_warning_ttl(project(), cfg.departments.palette(), cfg.ui.warning_ttl())
}

fn draft(name: &str, dept: &str, deadline: &str, progress: u8) -> TaskDraft {
    TaskDraft {
        name: name.to_owned(),
        departments: vec![dept.to_owned()],
        deadline: parse_date(deadline).ok(),
        progress,
        done: false,
    }
}

#[test]
fn full_session_classifies_and_aggregates() {
    let mut eng = engine();
    let reference = parse_date("2025-11-20").expect("date");

    eng.add_task(&draft("Wire harness", "Design Electric", "2025-12-01", 40))
        .expect("add");
    eng.add_task(&draft("PCB review", "Design Electric", "2025-11-10", 80))
        .expect("add");
    eng.add_task(&draft("Site survey", "Teste", "2025-11-20", 0))
        .expect("add");

    // Default-config color for the first department, with readable text.
    let harness = &eng.tasks()[0];
    assert_eq!(harness.color, "#33C1FF");
    assert_eq!(text_color_for_bg(&harness.color), "#fff");

    let buckets = eng.classified(reference);
    assert_eq!(buckets.in_progress.len(), 1);
    assert_eq!(buckets.in_progress[0].name, "Wire harness");
    assert_eq!(buckets.past_due.len(), 1);
    assert_eq!(buckets.past_due[0].name, "PCB review");
    // Same-day deadlines sit outside both buckets.
    assert!(buckets.done.is_empty());

    // (40 + 80 + 0) / 3 = 40.
    assert_eq!(eng.progress(), 40);

    // Marking a past-due task done moves it out of past_due entirely.
    let id = eng.tasks()[1].id.clone();
    eng.toggle_task_done(&id);
    let buckets = eng.classified(reference);
    assert!(buckets.past_due.is_empty());
    assert_eq!(buckets.done.len(), 1);
}

#[test]
fn unknown_department_gets_the_fallback_color() {
    let mut eng = engine();
    let added = eng
        .add_task(&draft("Casting", "Forging", "2025-12-05", 0))
        .expect("add");
    assert_eq!(added.color, FALLBACK_COLOR);
}

#[test]
fn edit_session_preserves_identity_across_department_change() {
    let mut eng = engine();
    eng.add_task(&draft("Wire harness", "Design Electric", "2025-12-01", 40))
        .expect("add");
    let id = eng.tasks()[0].id.clone();

    eng.select_task_for_edit(&id).expect("select");
    let saved = eng
        .save_edited_task(&draft("Wire harness v2", "Teste", "2025-12-02", 55))
        .expect("save");
    assert_eq!(saved.id, id);
    assert_eq!(saved.name, "Wire harness v2");
    assert_eq!(saved.color, "#3a33ffff");
    assert_eq!(saved.progress, 55);
}

#[test]
fn validation_warning_expires_on_its_own() {
    let cfg = Config::default();
    let mut eng =
        TaskBoardEngine::with_warning_ttl(project(), cfg.departments.palette(), Duration::ZERO);

    let err = eng.add_task(&draft("", "Design Electric", "2025-12-01", 0));
    assert!(err.is_err());
    assert_eq!(eng.warning(), Some("please provide a task name"));

    eng.expire_warning(std::time::Instant::now() + Duration::from_millis(1));
    assert!(eng.warning().is_none());
}

#[test]
fn note_double_toggle_keeps_state_consistent() {
    let mut eng = engine();
    eng.add_note("order sensors");
    eng.add_note("call vendor");
    let id = eng.notes()[0].id.clone();

    eng.toggle_note_checked(&id);
    assert!(eng.notes().last().expect("note").checked);
    eng.toggle_note_checked(&id);
    assert!(eng.notes().iter().all(|n| !n.checked));
}

#[test]
fn day_overlay_caps_visible_tasks() {
    let mut eng = engine();
    for name in ["a", "b", "c"] {
        eng.add_task(&draft(name, "Design Electric", "2025-12-01", 0))
            .expect("add");
    }
    let date = parse_date("2025-12-01").expect("date");
    let overlay = day_overlay(eng.tasks(), date, 2);
    assert_eq!(overlay.visible.len(), 2);
    assert_eq!(overlay.visible[0].name, "a");
    assert_eq!(overlay.hidden, 1);
}

#[test]
fn handoff_round_trip_merges_by_id() {
    let mut projects = vec![
        project(),
        Project {
            id: "3".to_owned(),
            name: "Renewable Energy Grid".to_owned(),
            description: String::new(),
            deadline: None,
            budget: None,
            progress: None,
            departments: Vec::new(),
        },
    ];

    let mut edited = project();
    edited.name = "Robotics Automation System v2".to_owned();
    edited.deadline = parse_date("2025-12-20").ok();
    let payload = handoff::encode_project(&edited).expect("encode");

    assert!(handoff::apply_update(&mut projects, &payload));
    assert_eq!(projects[0].name, "Robotics Automation System v2");
    assert_eq!(projects[0].deadline, parse_date("2025-12-20").ok());
    // The other record is untouched.
    assert_eq!(projects[1].name, "Renewable Energy Grid");
}

#[test]
fn handoff_with_unknown_id_changes_nothing() {
    let mut projects = vec![project()];
    let mut stranger = project();
    stranger.id = "99".to_owned();
    let payload = handoff::encode_project(&stranger).expect("encode");

    assert!(!handoff::apply_update(&mut projects, &payload));
    assert_eq!(projects[0].name, "Robotics Automation System");
}

#[test]
fn malformed_handoff_payload_is_ignored() {
    let mut projects = vec![project()];
    assert!(!handoff::apply_update(&mut projects, "%zz-not-a-payload"));
    assert!(!handoff::apply_update(&mut projects, "%7B%22broken"));
    assert_eq!(projects[0].name, "Robotics Automation System");
}
