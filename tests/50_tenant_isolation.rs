mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{seed_roster, TestServer};

#[tokio::test]
async fn owners_never_see_each_other() -> Result<()> {
    let server = TestServer::spawn().await?;
    let alice_token = server.login_as("owner-a").await?;
    let bob_token = server.login_as("owner-b").await?;
    let roster = seed_roster(&server, &alice_token).await?;

    server
        .create(
            &alice_token,
            "/api/attendance",
            json!({
                "classId": roster.class_id,
                "subjectId": roster.subject_id,
                "records": [{ "studentId": roster.alice, "status": "present" }]
            }),
        )
        .await?;

    let (_, classes) = server.get(&bob_token, "/api/classes").await?;
    assert_eq!(classes["data"], json!([]));

    let (status, _) = server.get(&bob_token, &format!("/api/classes/{}", roster.class_id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, students) = server.get(&bob_token, &format!("/api/students?classId={}", roster.class_id)).await?;
    assert_eq!(students["data"], json!([]));

    let (_, stats) = server.get(&bob_token, "/api/attendance/student-records").await?;
    assert_eq!(stats["data"], json!([]));

    let (status, _) = server.delete(&bob_token, &format!("/api/classes/{}", roster.class_id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Recording into someone else's class is refused
    let (status, _) = server
        .post(
            &bob_token,
            "/api/attendance",
            json!({ "classId": roster.class_id, "subjectId": roster.subject_id, "records": [] }),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The owner's data is untouched
    let (status, _) = server.get(&alice_token, &format!("/api/classes/{}", roster.class_id)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
