use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use crate::database::models::{AttendanceSession, Student, Subject};
use crate::database::OwnerScope;
use crate::filter::SessionFilter;
use crate::services::error::ServiceResult;

/// Students shown as attendance-takeable for a class, optionally narrowed to
/// one subject. Read only; output keeps student creation order.
pub async fn eligible_students(
    scope: &OwnerScope,
    class_id: Uuid,
    subject_id: Option<Uuid>,
) -> ServiceResult<Vec<Student>> {
    let students = scope.list_students(Some(class_id)).await?;

    let subject_id = match subject_id {
        Some(id) => id,
        None => return Ok(students),
    };

    let class = scope.find_class(class_id).await?;
    let subject = scope.find_subject(subject_id).await?;
    let excluded = excluded_ids(class.as_ref().map(|c| c.name.as_str()), subject.as_ref());
    let students = without_excluded(students, &excluded);

    // History runs even when the class itself is gone
    let sessions = scope
        .find_sessions(&SessionFilter::for_pair(class_id, subject_id).non_empty())
        .await?;
    let history = attended_ids(&sessions);

    debug!(
        "eligibility class={} subject={} excluded={} history={}",
        class_id,
        subject_id,
        excluded.len(),
        history.len()
    );

    Ok(with_history(students, &history))
}

/// Exclusion entry of the subject for the class name. Missing class or
/// subject excludes nobody.
fn excluded_ids(class_name: Option<&str>, subject: Option<&Subject>) -> HashSet<Uuid> {
    match (class_name, subject) {
        (Some(name), Some(subject)) => subject
            .exclusions_for(name)
            .map(|entry| entry.student_ids.iter().copied().collect())
            .unwrap_or_default(),
        _ => HashSet::new(),
    }
}

fn without_excluded(students: Vec<Student>, excluded: &HashSet<Uuid>) -> Vec<Student> {
    if excluded.is_empty() {
        return students;
    }
    students.into_iter().filter(|s| !excluded.contains(&s.id)).collect()
}

fn attended_ids(sessions: &[AttendanceSession]) -> HashSet<Uuid> {
    sessions
        .iter()
        .flat_map(|s| s.records().iter().map(|r| r.student_id))
        .collect()
}

/// An empty history keeps everyone
fn with_history(students: Vec<Student>, history: &HashSet<Uuid>) -> Vec<Student> {
    if history.is_empty() {
        return students;
    }
    students.into_iter().filter(|s| history.contains(&s.id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{AttendanceRecord, ExclusionEntry};
    use crate::testing::TestContext;

    fn names(students: &[Student]) -> Vec<&str> {
        students.iter().map(|s| s.name.as_str()).collect()
    }

    #[tokio::test]
    async fn excluded_student_is_hidden_without_history() {
        let ctx = TestContext::seeded().await;

        let all = eligible_students(&ctx.scope, ctx.class.id, None).await.unwrap();
        assert_eq!(names(&all), vec!["Alice", "Bob", "Carol"]);

        let math = eligible_students(&ctx.scope, ctx.class.id, Some(ctx.subject.id)).await.unwrap();
        assert_eq!(names(&math), vec!["Alice", "Carol"]);
    }

    #[tokio::test]
    async fn history_narrows_to_students_with_records() {
        let ctx = TestContext::seeded().await;
        ctx.record(vec![AttendanceRecord::present(ctx.alice.id)]).await;

        let math = eligible_students(&ctx.scope, ctx.class.id, Some(ctx.subject.id)).await.unwrap();
        assert_eq!(names(&math), vec!["Alice"]);
    }

    #[tokio::test]
    async fn empty_sessions_do_not_count_as_history() {
        let ctx = TestContext::seeded().await;
        ctx.record(vec![]).await;

        let math = eligible_students(&ctx.scope, ctx.class.id, Some(ctx.subject.id)).await.unwrap();
        assert_eq!(names(&math), vec!["Alice", "Carol"]);
    }

    #[tokio::test]
    async fn excluded_student_stays_hidden_even_with_history() {
        let ctx = TestContext::seeded().await;
        ctx.record(vec![AttendanceRecord::present(ctx.bob.id), AttendanceRecord::absent(ctx.carol.id)])
            .await;

        let math = eligible_students(&ctx.scope, ctx.class.id, Some(ctx.subject.id)).await.unwrap();
        assert_eq!(names(&math), vec!["Carol"]);
    }

    #[tokio::test]
    async fn history_applies_after_class_row_is_gone() {
        let ctx = TestContext::seeded().await;
        ctx.record(vec![AttendanceRecord::present(ctx.alice.id)]).await;
        // Only the class row goes; students and sessions stay
        assert!(ctx.scope.delete_class(ctx.class.id).await.unwrap());

        // No class name means no exclusions, so Bob would be back without history
        let math = eligible_students(&ctx.scope, ctx.class.id, Some(ctx.subject.id)).await.unwrap();
        assert_eq!(names(&math), vec!["Alice"]);
    }

    #[tokio::test]
    async fn subject_result_is_subset_of_class_result() {
        let ctx = TestContext::seeded().await;
        ctx.record(vec![AttendanceRecord::absent(ctx.carol.id)]).await;

        let all: HashSet<Uuid> = eligible_students(&ctx.scope, ctx.class.id, None)
            .await
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        let math = eligible_students(&ctx.scope, ctx.class.id, Some(ctx.subject.id)).await.unwrap();
        assert!(math.iter().all(|s| all.contains(&s.id)));
    }

    #[tokio::test]
    async fn unknown_subject_excludes_nobody() {
        let ctx = TestContext::seeded().await;
        let listed = eligible_students(&ctx.scope, ctx.class.id, Some(Uuid::new_v4())).await.unwrap();
        assert_eq!(names(&listed), vec!["Alice", "Bob", "Carol"]);
    }

    #[tokio::test]
    async fn exclusions_follow_class_name() {
        let ctx = TestContext::seeded().await;
        let mut subject = ctx.subject.clone();
        subject.excluded_students = vec![ExclusionEntry { class_name: "10B".into(), student_ids: vec![ctx.alice.id] }];
        ctx.scope.update_subject(&subject).await.unwrap();

        let listed = eligible_students(&ctx.scope, ctx.class.id, Some(subject.id)).await.unwrap();
        assert_eq!(names(&listed), vec!["Alice", "Bob", "Carol"]);
    }

    #[tokio::test]
    async fn other_owners_see_nothing() {
        let ctx = TestContext::seeded().await;
        let stranger = ctx.stranger();
        let listed = eligible_students(&stranger, ctx.class.id, Some(ctx.subject.id)).await.unwrap();
        assert!(listed.is_empty());
    }
}
