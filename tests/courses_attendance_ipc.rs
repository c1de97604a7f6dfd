mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn courses_crud_and_attendance_marking() {
    let workspace = temp_dir("edutracker-courses");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "courses.create",
        json!({
            "userId": "u1",
            "courseName": "Operating Systems",
            "courseCode": "CS330",
            "instructor": "Dr. Rao",
            "attended": 80,
            "total": 100
        }),
    );
    let course_id = created
        .get("courseId")
        .and_then(|v| v.as_str())
        .expect("courseId")
        .to_string();
    let course = &created["course"];
    assert_eq!(course["weekly"], 3);
    assert_eq!(course["type"], "lecture");
    assert_eq!(course["required"], 75.0);
    assert_eq!(course["percent"], 80.0);
    assert_eq!(course["meetsRequirement"], true);
    assert_eq!(
        course["suggestion"],
        "You can miss 6 more classes and stay above 75%"
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "courses.create",
        json!({
            "userId": "u1",
            "courseName": "Networks",
            "type": "lab",
            "required": 80,
            "attended": 1,
            "total": 4
        }),
    );

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "courses.list",
        json!({ "userId": "u1" }),
    );
    let names: Vec<&str> = listed["courses"]
        .as_array()
        .expect("courses")
        .iter()
        .filter_map(|c| c["courseName"].as_str())
        .collect();
    assert_eq!(names, ["Operating Systems", "Networks"]);

    let below = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "courses.list",
        json!({ "userId": "u1", "belowPercent": 75 }),
    );
    let below = below["courses"].as_array().expect("courses");
    assert_eq!(below.len(), 1);
    assert_eq!(below[0]["courseName"], "Networks");

    let other_user = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "courses.list",
        json!({ "userId": "u2" }),
    );
    assert_eq!(other_user["courses"].as_array().map(|a| a.len()), Some(0));

    let marked = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "attendance.mark",
        json!({ "courseId": course_id, "status": "attended" }),
    );
    assert_eq!(marked["course"]["attended"], 81);
    assert_eq!(marked["course"]["total"], 101);
    let marked = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "attendance.mark",
        json!({ "courseId": course_id, "status": "missed" }),
    );
    assert_eq!(marked["course"]["attended"], 81);
    assert_eq!(marked["course"]["total"], 102);

    let activity = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "activity.list",
        json!({ "userId": "u1", "type": "attendance" }),
    );
    let labels: Vec<(&str, &str)> = activity["activities"]
        .as_array()
        .expect("activities")
        .iter()
        .map(|a| {
            (
                a["label"].as_str().unwrap_or_default(),
                a["status"].as_str().unwrap_or_default(),
            )
        })
        .collect();
    assert_eq!(
        labels,
        [
            ("Missed Operating Systems", "no"),
            ("Attended Operating Systems", "yes")
        ]
    );

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "courses.update",
        json!({ "courseId": course_id, "patch": { "required": 90, "courseName": "OS" } }),
    );
    assert_eq!(updated["course"]["courseName"], "OS");
    assert_eq!(updated["course"]["meetsRequirement"], false);

    let bad = request_err(
        &mut stdin,
        &mut reader,
        "11",
        "courses.update",
        json!({ "courseId": course_id, "patch": { "attended": 500 } }),
    );
    assert_eq!(bad["code"], "bad_params");
    let bad = request_err(
        &mut stdin,
        &mut reader,
        "12",
        "courses.create",
        json!({ "userId": "u1", "courseName": "X", "required": 101 }),
    );
    assert_eq!(bad["code"], "bad_params");
    let bad = request_err(
        &mut stdin,
        &mut reader,
        "13",
        "attendance.mark",
        json!({ "courseId": course_id, "status": "late" }),
    );
    assert_eq!(bad["code"], "bad_params");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "14",
        "courses.delete",
        json!({ "courseId": course_id }),
    );
    let gone = request_err(
        &mut stdin,
        &mut reader,
        "15",
        "attendance.mark",
        json!({ "courseId": course_id, "status": "attended" }),
    );
    assert_eq!(gone["code"], "not_found");
}

#[test]
fn attendance_projection_methods() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    // Raw counters work without a workspace.
    let p = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.project",
        json!({ "attended": 80, "total": 100, "required": 75 }),
    );
    assert_eq!(p["projection"]["status"], "canSkip");
    assert_eq!(p["projection"]["classes"], 6);
    assert_eq!(p["meetsRequirement"], true);

    let p = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.project",
        json!({ "attended": 50, "total": 100, "required": 75 }),
    );
    assert_eq!(p["projection"]["status"], "mustAttend");
    assert_eq!(p["projection"]["classes"], 100);
    assert_eq!(p["suggestion"], "Attend next 100 classes to reach 75%");

    let p = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.project",
        json!({ "attended": 5, "total": 10, "required": 100 }),
    );
    assert_eq!(p["projection"]["status"], "unreachable");
    assert_eq!(p["projection"]["missed"], 5);

    let n = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.canSkip",
        json!({ "attended": 80, "total": 100, "required": 75 }),
    );
    assert_eq!(n["canSkip"], 6);

    let e = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "attendance.canSkip",
        json!({ "attended": 50, "total": 100, "required": 75 }),
    );
    assert_eq!(e["code"], "precondition_failed");
    assert_eq!(e["details"]["attended"], 50);

    let e = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "attendance.neededToReach",
        json!({ "attended": 5, "total": 10, "required": 100 }),
    );
    assert_eq!(e["code"], "unreachable_target");
    assert_eq!(e["details"]["missed"], 5);

    let n = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "attendance.neededToReach",
        json!({ "attended": 50, "total": 100, "required": 75 }),
    );
    assert_eq!(n["mustAttend"], 100);

    let e = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "attendance.project",
        json!({ "courseId": "nope" }),
    );
    assert_eq!(e["code"], "no_workspace");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "9",
        "attendance.project",
        json!({ "attended": 6, "total": 5, "required": 75 }),
    );
    assert_eq!(e["code"], "bad_params");

    // Requirements are compared as written, without rounding.
    let p = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "attendance.project",
        json!({ "attended": 2, "total": 3, "required": 66.666 }),
    );
    assert_eq!(p["meetsRequirement"], true);
    assert_eq!(p["projection"]["status"], "canSkip");
    assert_eq!(p["projection"]["classes"], 0);
    let n = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "attendance.neededToReach",
        json!({ "attended": 0, "total": 1, "required": 99.996 }),
    );
    assert_eq!(n["mustAttend"], 24_999);

    let e = request_err(
        &mut stdin,
        &mut reader,
        "12",
        "attendance.canSkip",
        json!({ "attended": 4_294_967_295u64, "total": 4_294_967_295u64, "required": 1 }),
    );
    assert_eq!(e["code"], "count_overflow");
}
