mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn settings_defaults_update_and_validation() {
    let workspace = temp_dir("edutracker-settings");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let defaults = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "settings.get",
        json!({ "userId": "u1" }),
    );
    assert_eq!(defaults["stored"], false);
    assert_eq!(defaults["settings"]["lectureDuration"], 60);
    assert_eq!(defaults["settings"]["labDuration"], 120);
    assert_eq!(defaults["settings"]["notifSound"], true);
    assert_eq!(defaults["settings"]["timeFormat"], "12h");
    assert_eq!(defaults["settings"]["theme"], "system");
    assert!(defaults["semesterId"].is_null());

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "settings.update",
        json!({
            "userId": "u1",
            "patch": {
                "lectureDuration": 90,
                "theme": "dark",
                "semesterStart": "2026-09-01",
                "semesterEnd": "2026-12-18"
            }
        }),
    );
    assert_eq!(updated["semesterId"], "2026-09-01_2026-12-18");

    let stored = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "settings.get",
        json!({ "userId": "u1" }),
    );
    assert_eq!(stored["stored"], true);
    assert_eq!(stored["settings"]["lectureDuration"], 90);
    assert_eq!(stored["settings"]["labDuration"], 120);
    assert_eq!(stored["settings"]["theme"], "dark");

    let rejected = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "settings.update",
        json!({
            "userId": "u1",
            "patch": {
                "lectureDuration": 200,
                "notifSound": "loud",
                "timeFormat": "military"
            }
        }),
    );
    assert_eq!(rejected["code"], "bad_params");
    let fields: Vec<&str> = rejected["details"]["errors"]
        .as_array()
        .expect("errors")
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert_eq!(fields, ["lectureDuration", "notifSound", "timeFormat"]);

    // Nothing from the rejected patch was applied.
    let unchanged = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "settings.get",
        json!({ "userId": "u1" }),
    );
    assert_eq!(unchanged["settings"]["lectureDuration"], 90);

    // New courses pick up the current semester.
    let course = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "courses.create",
        json!({ "userId": "u1", "courseName": "Ethics" }),
    );
    assert_eq!(course["course"]["semesterId"], "2026-09-01_2026-12-18");

    // Lecture duration feeds the default class length.
    let class = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "classes.create",
        json!({
            "userId": "u1",
            "courseId": course["courseId"],
            "day": "thursday",
            "startTime": "14:00"
        }),
    );
    assert_eq!(class["class"]["endTime"], "15:30");
}

#[test]
fn time_methods_follow_user_preference() {
    let workspace = temp_dir("edutracker-time");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let t = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "time.to24Hour",
        json!({ "time": "2:05 PM" }),
    );
    assert_eq!(t["time"], "14:05");
    let t = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "time.to12Hour",
        json!({ "time": "00:15" }),
    );
    assert_eq!(t["time"], "12:15 AM");
    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "time.to12Hour",
        json!({ "time": "25:00" }),
    );
    assert_eq!(e["code"], "bad_time");

    let t = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "time.format",
        json!({ "time": "14:05", "format": "12h" }),
    );
    assert_eq!(t["time"], "02:05 PM");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "time.format",
        json!({ "time": "14:05", "userId": "u1" }),
    );
    assert_eq!(e["code"], "no_workspace");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let t = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "time.format",
        json!({ "time": "2:05 PM", "userId": "u1" }),
    );
    assert_eq!(t["time"], "02:05 PM");
    assert_eq!(t["format"], "12h");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "settings.update",
        json!({ "userId": "u1", "patch": { "timeFormat": "24h" } }),
    );
    let t = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "time.format",
        json!({ "time": "2:05 PM", "userId": "u1" }),
    );
    assert_eq!(t["time"], "14:05");
}
