mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{names, seed_roster, Roster, TestServer};

async fn roll_call(server: &TestServer, token: &str, roster: &Roster, records: Value) -> Result<String> {
    server
        .create(
            token,
            "/api/attendance",
            json!({ "classId": roster.class_id, "subjectId": roster.subject_id, "records": records }),
        )
        .await
}

#[tokio::test]
async fn save_derives_counts() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_as("t1").await?;
    let roster = seed_roster(&server, &token).await?;

    let (status, body) = server
        .post(
            &token,
            "/api/attendance",
            json!({
                "classId": roster.class_id,
                "subjectId": roster.subject_id,
                "records": [
                    { "studentId": roster.alice, "status": "present" },
                    { "studentId": roster.carol, "status": "absent" }
                ]
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["presentCount"], 1);
    assert_eq!(body["data"]["absentCount"], 1);

    let id = body["data"]["id"].as_str().unwrap_or_default().to_string();
    let (status, body) = server.put(&token, &format!("/api/attendance/{}", id), json!({ "records": [] })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["presentCount"], 0);
    assert_eq!(body["data"]["absentCount"], 0);
    Ok(())
}

#[tokio::test]
async fn invalid_status_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_as("t1").await?;
    let roster = seed_roster(&server, &token).await?;

    let (status, body) = server
        .post(
            &token,
            "/api/attendance",
            json!({
                "classId": roster.class_id,
                "subjectId": roster.subject_id,
                "records": [{ "studentId": roster.alice, "status": "late" }]
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["records"].is_string());
    Ok(())
}

#[tokio::test]
async fn student_records_by_class() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_as("t1").await?;
    let roster = seed_roster(&server, &token).await?;
    roll_call(
        &server,
        &token,
        &roster,
        json!([
            { "studentId": roster.alice, "status": "present" },
            { "studentId": roster.carol, "status": "absent" }
        ]),
    )
    .await?;

    let (status, body) = server.get(&token, "/api/attendance/student-records").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!([{
            "classId": roster.class_id,
            "className": "10A",
            "students": [
                { "studentId": roster.alice, "studentName": "Alice", "presentCount": 1, "absentCount": 0 },
                { "studentId": roster.carol, "studentName": "Carol", "presentCount": 0, "absentCount": 1 }
            ]
        }])
    );

    // History now narrows eligibility to Alice and Carol
    let (_, body) = server
        .get(&token, &format!("/api/students?classId={}&subjectId={}", roster.class_id, roster.subject_id))
        .await?;
    assert_eq!(names(&body), vec!["Alice", "Carol"]);
    Ok(())
}

#[tokio::test]
async fn subject_records_sum_up() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_as("t1").await?;
    let roster = seed_roster(&server, &token).await?;
    roll_call(&server, &token, &roster, json!([{ "studentId": roster.alice, "status": "present" }])).await?;
    roll_call(
        &server,
        &token,
        &roster,
        json!([
            { "studentId": roster.alice, "status": "absent" },
            { "studentId": roster.carol, "status": "present" }
        ]),
    )
    .await?;

    let (_, body) = server.get(&token, "/api/attendance/subject-records").await?;
    let subject = &body["data"][0];
    assert_eq!(subject["subjectName"], "Math");
    let class = &subject["classes"][0];
    assert_eq!(class["totalPresents"], 2);
    assert_eq!(class["totalAbsences"], 1);
    assert_eq!(class["students"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn full_student_delete_strips_records() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_as("t1").await?;
    let roster = seed_roster(&server, &token).await?;
    let session = roll_call(
        &server,
        &token,
        &roster,
        json!([
            { "studentId": roster.alice, "status": "present" },
            { "studentId": roster.carol, "status": "absent" }
        ]),
    )
    .await?;

    let (status, _) = server.delete(&token, &format!("/api/students/{}", roster.carol)).await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = server.get(&token, &format!("/api/attendance/{}", session)).await?;
    assert_eq!(body["data"]["records"], json!([{ "studentId": roster.alice, "status": "present" }]));
    assert_eq!(body["data"]["presentCount"], 1);
    assert_eq!(body["data"]["absentCount"], 0);
    Ok(())
}

#[tokio::test]
async fn overview_is_stable() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_as("t1").await?;
    let roster = seed_roster(&server, &token).await?;
    roll_call(&server, &token, &roster, json!([{ "studentId": roster.carol, "status": "present" }])).await?;

    let (_, first) = server.get(&token, "/api/attendance").await?;
    let (_, second) = server.get(&token, "/api/attendance").await?;
    assert_eq!(first, second);
    assert_eq!(first["data"]["records"][0]["class"]["name"], "10A");
    assert_eq!(first["data"]["records"][0]["records"][0]["student"]["name"], "Carol");
    assert_eq!(first["data"]["aggregatedStats"][0]["students"][0]["presentCount"], 1);
    Ok(())
}
