//! Report generation and export tests


use chrono::TimeDelta;
use exam_proctor::{
    event::{BoundingBox, CategoryCounters, DetectionCategory, DetectionEvent},
    report::{format_duration, percentage, Report},
    session::SessionAggregator,
    Error,
};
use test_helpers::t0;

fn record(session: &mut SessionAggregator, category: DetectionCategory, secs: i64, confidence: f64) {
    session.record(DetectionEvent::new(
        category,
        confidence,
        BoundingBox::new(10, 10, 60, 90),
        t0() + TimeDelta::seconds(secs),
    ));
}

/// Value of a `Name:   value` line
fn field<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    text.lines()
        .find_map(|line| line.strip_prefix(name))
        .map(str::trim)
}

fn mixed_session() -> SessionAggregator {
    let mut session = SessionAggregator::new();
    record(&mut session, DetectionCategory::HandGesture, 3, 0.85);
    record(&mut session, DetectionCategory::MobilePhone, 7, 0.75);
    record(&mut session, DetectionCategory::HandGesture, 12, 0.85);
    record(&mut session, DetectionCategory::Talking, 65, 0.4);
    session
}

fn generate(session: &SessionAggregator, ended_secs: Option<i64>) -> Report {
    Report::generate(
        session.entries(),
        session.counters(),
        Some(t0()),
        ended_secs.map(|s| t0() + TimeDelta::seconds(s)),
        t0() + TimeDelta::minutes(10),
    )
    .unwrap()
}

#[test]
fn test_percentages_for_two_one_one() {
    let report = generate(&mixed_session(), Some(120));
    let rows: Vec<(&str, u64, f64)> = report
        .summary
        .iter()
        .map(|r| (r.label.as_str(), r.count, r.percentage))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Hand Gestures", 2, 50.0),
            ("Mobile Phone Usage", 1, 25.0),
            ("Talking/Mouth Movement", 1, 25.0),
        ]
    );
}

#[test]
fn test_percentage_helper() {
    assert_eq!(percentage(0, 0), 0.0);
    assert_eq!(format!("{:.1}", percentage(1, 3)), "33.3");
}

#[test]
fn test_rendered_sections() {
    let report = generate(&mixed_session(), Some(120));
    let text = report.render_text(40).unwrap();

    assert!(text.starts_with("Student Malpractice Detection Report"));
    assert_eq!(field(&text, "Session Start:"), Some("2024-05-20 14:30:00"));
    assert_eq!(field(&text, "Duration:"), Some("0:02:00"));
    assert_eq!(field(&text, "Total Events Detected:"), Some("4"));
    assert_eq!(field(&text, "Events per Minute:"), Some("2.00"));
    assert_eq!(field(&text, "Most Common:"), Some("Hand Gestures"));
    assert!(text.contains("100.0%"));

    let event_lines: Vec<&str> = text.lines().filter(|l| l.starts_with("14:3")).collect();
    assert_eq!(event_lines.len(), 4);
    assert!(event_lines[0].contains("Hand Gestures"));
    assert!(event_lines[0].contains("0.85"));
    assert!(event_lines[1].contains("Mobile Phone Usage"));
    assert!(event_lines[3].contains("Talking/Mouth Movement"));
    assert!(event_lines[3].starts_with("14:31:05"));
    assert!(event_lines[3].trim_end().ends_with('4'));
    assert!(text.contains("Page 1 of 1"));
}

#[test]
fn test_missing_end_is_unknown() {
    let report = generate(&mixed_session(), None);
    assert_eq!(report.duration(), None);
    assert_eq!(report.stats.events_per_minute, 0.0);
    assert_eq!(format_duration(report.duration()), "N/A");

    let text = report.render_text(40).unwrap();
    assert_eq!(field(&text, "Session End:"), Some("N/A"));
}

#[test]
fn test_generation_is_deterministic() {
    let session = mixed_session();
    let a = generate(&session, Some(120));
    let b = generate(&session, Some(120));
    assert_eq!(a, b);
    assert_eq!(a.render_text(2).unwrap(), b.render_text(2).unwrap());
}

#[test]
fn test_inconsistent_counters_fail_without_touching_session() {
    let session = mixed_session();
    let mut counters = CategoryCounters::default();
    counters.increment(DetectionCategory::Talking);

    let result = Report::generate(session.entries(), &counters, None, None, t0());
    assert!(matches!(result, Err(Error::Report(_))));
    assert_eq!(session.len(), 4);
}

#[test]
fn test_write_to_dir() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate(&mixed_session(), Some(120));

    let path = report.write_to_dir(dir.path().join("reports"), 2).unwrap();
    assert_eq!(path.file_name().unwrap(), "proctor_report_20240520_144000.txt");

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, report.render_text(2).unwrap());
    assert!(written.contains("Page 2 of 2"));
}

#[test]
fn test_json_export() {
    let report = generate(&mixed_session(), Some(120));
    let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(value["stats"]["total_events"], 4);
    assert_eq!(value["stats"]["most_common"], "hand_gestures");
    assert_eq!(value["events"][3]["category"], "talking");
    assert_eq!(value["summary"][1]["count"], 1);
}
