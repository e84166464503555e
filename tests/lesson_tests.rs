// tests/lesson_tests.rs
//
// Service-level tests for the lesson lifecycle, attendance and submissions.

mod common;

use classroom::{
    error::AppError,
    models::{
        lesson::{LessonTasks, StartLessonRequest},
        submission::Answer,
        task::{CreateTaskRequest, Question, Task},
        user::{Requester, Role},
    },
    services::{analytics, attendance, lessons, submissions, task_store},
};
use common::{Classroom, classroom, count, file_pool, insert_user, remove_file_pool, test_pool};
use sqlx::SqlitePool;

async fn create_task(
    pool: &SqlitePool,
    teacher: &Requester,
    title: &str,
    questions: Vec<Question>,
) -> Task {
    task_store::create_task(
        pool,
        teacher,
        CreateTaskRequest {
            title: title.to_string(),
            description: Some("Week 3".to_string()),
            questions,
        },
    )
    .await
    .expect("task creation failed")
}

async fn start(pool: &SqlitePool, room: &Classroom, task_ids: Vec<i64>) -> Result<i64, AppError> {
    lessons::start_lesson(
        pool,
        &room.teacher,
        StartLessonRequest {
            group_id: room.group_id,
            task_ids,
        },
    )
    .await
    .map(|lesson| lesson.id)
}

fn choice(question_index: usize, selected: usize) -> Answer {
    Answer {
        question_index,
        selected_answer: Some(selected),
        text_answer: None,
    }
}

fn text(question_index: usize, body: &str) -> Answer {
    Answer {
        question_index,
        selected_answer: None,
        text_answer: Some(body.to_string()),
    }
}

/// Task A: two choice questions (correct 1, 0). Task B: one open-ended.
async fn mixed_lesson(pool: &SqlitePool, room: &Classroom) -> i64 {
    let a = create_task(
        pool,
        &room.teacher,
        "Task A",
        vec![
            Question::multiple_choice("A1", &["x", "y"], 1),
            Question::multiple_choice("A2", &["x", "y"], 0),
        ],
    )
    .await;
    let b = create_task(pool, &room.teacher, "Task B", vec![Question::open_ended("B1")]).await;

    start(pool, room, vec![a.id, b.id]).await.unwrap()
}

#[tokio::test]
async fn start_lesson_links_every_task_in_order() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let first = create_task(&pool, &room.teacher, "First", vec![Question::open_ended("1")]).await;
    let second = create_task(&pool, &room.teacher, "Second", vec![Question::open_ended("2")]).await;

    let lesson = lessons::start_lesson(
        &pool,
        &room.teacher,
        StartLessonRequest {
            group_id: room.group_id,
            task_ids: vec![second.id, first.id],
        },
    )
    .await
    .unwrap();

    assert!(lesson.is_active());
    assert_eq!(lesson.group_id, room.group_id);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM lesson_tasks WHERE lesson_id = ?", lesson.id).await,
        2
    );

    let titles: Vec<String> = task_store::tasks_for_lesson(&pool, lesson.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[tokio::test]
async fn start_lesson_with_unknown_task_leaves_nothing_behind() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let task = create_task(&pool, &room.teacher, "Real", vec![Question::open_ended("?")]).await;

    let result = start(&pool, &room, vec![task.id, 9_999]).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let lessons = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM lessons")
        .fetch_one(&pool)
        .await
        .unwrap();
    let links = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM lesson_tasks")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((lessons, links), (0, 0));
}

#[tokio::test]
async fn start_lesson_rejects_bad_requests() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let task = create_task(&pool, &room.teacher, "T", vec![Question::open_ended("?")]).await;
    let other_teacher = insert_user(&pool, "Barbara Liskov", Role::Teacher).await;

    // Students cannot start lessons.
    let by_student = lessons::start_lesson(
        &pool,
        &room.students[0],
        StartLessonRequest {
            group_id: room.group_id,
            task_ids: vec![task.id],
        },
    )
    .await;
    assert!(matches!(by_student, Err(AppError::Forbidden(_))));

    // Only the owning teacher may start lessons for the group.
    let by_stranger = lessons::start_lesson(
        &pool,
        &other_teacher,
        StartLessonRequest {
            group_id: room.group_id,
            task_ids: vec![task.id],
        },
    )
    .await;
    assert!(matches!(by_stranger, Err(AppError::Forbidden(_))));

    assert!(matches!(start(&pool, &room, vec![]).await, Err(AppError::BadRequest(_))));
    assert!(matches!(
        start(&pool, &room, vec![task.id, task.id]).await,
        Err(AppError::BadRequest(_))
    ));

    let missing_group = lessons::start_lesson(
        &pool,
        &room.teacher,
        StartLessonRequest {
            group_id: 4_242,
            task_ids: vec![task.id],
        },
    )
    .await;
    assert!(matches!(missing_group, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn attendance_is_idempotent() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let lesson_id = mixed_lesson(&pool, &room).await;
    let student = &room.students[0];

    let first = attendance::mark_attendance(&pool, student, lesson_id).await.unwrap();
    let second = attendance::mark_attendance(&pool, student, lesson_id).await.unwrap();

    assert!(!first.already_marked);
    assert!(second.already_marked);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM attendance WHERE lesson_id = ?", lesson_id).await,
        1
    );
}

#[tokio::test]
async fn attendance_requires_enrolled_student() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let lesson_id = mixed_lesson(&pool, &room).await;
    let outsider = insert_user(&pool, "Outsider", Role::Student).await;

    assert!(matches!(
        attendance::mark_attendance(&pool, &room.teacher, lesson_id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        attendance::mark_attendance(&pool, &outsider, lesson_id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        attendance::mark_attendance(&pool, &room.students[0], 777).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn mixed_lesson_scores_only_multiple_choice() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let lesson_id = mixed_lesson(&pool, &room).await;

    let submission = submissions::submit_answers(
        &pool,
        &room.students[0],
        lesson_id,
        vec![choice(0, 1), choice(1, 1), text(2, "x")],
    )
    .await
    .unwrap();

    assert_eq!(submission.score, 50);
    assert_eq!(submission.answers.len(), 3);
    assert_eq!(submission.answers[2].text_answer.as_deref(), Some("x"));
}

#[tokio::test]
async fn second_submission_conflicts() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let lesson_id = mixed_lesson(&pool, &room).await;
    let student = &room.students[0];

    let first =
        submissions::submit_answers(&pool, student, lesson_id, vec![choice(0, 1), choice(1, 0)])
            .await
            .unwrap();
    assert_eq!(first.score, 100);

    let second = submissions::submit_answers(&pool, student, lesson_id, vec![choice(0, 0)]).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM submissions WHERE lesson_id = ?", lesson_id).await,
        1
    );
    let stored_score =
        sqlx::query_scalar::<_, i64>("SELECT score FROM submissions WHERE lesson_id = ?")
            .bind(lesson_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored_score, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_attempts_have_one_winner() {
    let (pool, path) = file_pool().await;
    let room = classroom(&pool, 1).await;
    let lesson_id = mixed_lesson(&pool, &room).await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let pool = pool.clone();
        let student = room.students[0].clone();
        handles.push(tokio::spawn(async move {
            let marked = attendance::mark_attendance(&pool, &student, lesson_id).await;
            let submitted =
                submissions::submit_answers(&pool, &student, lesson_id, vec![choice(0, i % 2)])
                    .await;
            (marked, submitted)
        }));
    }

    let mut first_marks = 0;
    let mut repeat_marks = 0;
    let mut accepted = 0;
    let mut conflicts = 0;
    for handle in handles {
        let (marked, submitted) = handle.await.unwrap();
        match marked {
            Ok(outcome) if outcome.already_marked => repeat_marks += 1,
            Ok(_) => first_marks += 1,
            Err(e) => panic!("attendance failed: {:?}", e),
        }
        match submitted {
            Ok(_) => accepted += 1,
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("submission failed: {:?}", e),
        }
    }

    assert_eq!((first_marks, repeat_marks), (1, 15));
    assert_eq!((accepted, conflicts), (1, 15));
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM attendance WHERE lesson_id = ?", lesson_id).await,
        1
    );
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM submissions WHERE lesson_id = ?", lesson_id).await,
        1
    );

    remove_file_pool(pool, &path).await;
}

#[tokio::test]
async fn open_ended_only_lesson_scores_full_marks() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let task = create_task(
        &pool,
        &room.teacher,
        "Essay",
        vec![Question::open_ended("Why?"), Question::open_ended("How?")],
    )
    .await;
    let lesson_id = start(&pool, &room, vec![task.id]).await.unwrap();

    let submission =
        submissions::submit_answers(&pool, &room.students[0], lesson_id, vec![text(0, "because")])
            .await
            .unwrap();
    assert_eq!(submission.score, 100);
}

#[tokio::test]
async fn submission_to_lesson_without_tasks_is_not_found() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let lesson_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO lessons (group_id, start_time) VALUES (?, ?) RETURNING id",
    )
    .bind(room.group_id)
    .bind(chrono::Utc::now())
    .fetch_one(&pool)
    .await
    .unwrap();

    let result = submissions::submit_answers(&pool, &room.students[0], lesson_id, vec![]).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn teachers_cannot_submit() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let lesson_id = mixed_lesson(&pool, &room).await;

    let result =
        submissions::submit_answers(&pool, &room.teacher, lesson_id, vec![choice(0, 1)]).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn students_get_tasks_without_answer_keys() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let lesson_id = mixed_lesson(&pool, &room).await;
    let outsider = insert_user(&pool, "Outsider", Role::Student).await;

    match lessons::get_tasks_for_lesson(&pool, &room.teacher, lesson_id).await.unwrap() {
        LessonTasks::Full(tasks) => assert_eq!(tasks.len(), 2),
        other => panic!("teacher should see full tasks, got {:?}", other),
    }

    let for_student = lessons::get_tasks_for_lesson(&pool, &room.students[0], lesson_id)
        .await
        .unwrap();
    let json = serde_json::to_value(&for_student).unwrap();
    assert_eq!(json[0]["title"], "Task A");
    assert!(json[0]["questions"][0].get("correctAnswer").is_none());
    assert_eq!(json[1]["questions"][0]["type"], "open-ended");

    assert!(matches!(
        lessons::get_tasks_for_lesson(&pool, &outsider, lesson_id).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn ended_lesson_rejects_new_work_but_keeps_reports() {
    let pool = test_pool().await;
    let room = classroom(&pool, 3).await;
    let lesson_id = mixed_lesson(&pool, &room).await;

    submissions::submit_answers(&pool, &room.students[0], lesson_id, vec![choice(0, 1)])
        .await
        .unwrap();
    let joined = attendance::mark_attendance(&pool, &room.students[1], lesson_id)
        .await
        .unwrap();
    assert!(!joined.already_marked);

    let ended = lessons::end_lesson(&pool, &room.teacher, lesson_id).await.unwrap();
    assert!(ended.end_time.is_some());
    assert!(ended.end_time.unwrap() >= ended.start_time);

    assert!(matches!(
        lessons::end_lesson(&pool, &room.teacher, lesson_id).await,
        Err(AppError::Conflict(_))
    ));

    // Re-marking stays a no-op after the end; a first mark is refused.
    let again = attendance::mark_attendance(&pool, &room.students[1], lesson_id)
        .await
        .unwrap();
    assert!(again.already_marked);
    assert!(matches!(
        attendance::mark_attendance(&pool, &room.students[2], lesson_id).await,
        Err(AppError::Conflict(_))
    ));
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM attendance WHERE lesson_id = ?", lesson_id).await,
        1
    );

    assert!(matches!(
        submissions::submit_answers(&pool, &room.students[2], lesson_id, vec![]).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        lessons::active_lesson_for_group(&pool, &room.teacher, room.group_id).await,
        Err(AppError::NotFound(_))
    ));

    let report = analytics::lesson_analytics(&pool, &room.teacher, lesson_id).await.unwrap();
    assert_eq!(report.submission_count, 1);
    assert_eq!(report.attendance_count, 1);
}

#[tokio::test]
async fn stored_question_without_usable_key_still_grades() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let questions = serde_json::json!([
        {"question": "2 + 2?", "options": ["3", "4"], "correctAnswer": 1},
        {"question": "essay", "options": [], "correctAnswer": 0}
    ]);
    let task_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO tasks (title, description, questions, teacher_id, created_at)
        VALUES (?, NULL, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind("Legacy")
    .bind(questions.to_string())
    .bind(room.teacher.id)
    .bind(chrono::Utc::now())
    .fetch_one(&pool)
    .await
    .unwrap();
    let lesson_id = start(&pool, &room, vec![task_id]).await.unwrap();

    let tasks = task_store::tasks_for_lesson(&pool, lesson_id).await.unwrap();
    assert_eq!(tasks[0].questions.len(), 2);

    let submission = submissions::submit_answers(
        &pool,
        &room.students[0],
        lesson_id,
        vec![choice(0, 1), choice(1, 0)],
    )
    .await
    .unwrap();
    assert_eq!(submission.score, 50);
}

#[tokio::test]
async fn active_lesson_is_the_newest_open_one() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let older = mixed_lesson(&pool, &room).await;
    let newer = mixed_lesson(&pool, &room).await;

    let active = lessons::active_lesson_for_group(&pool, &room.students[0], room.group_id)
        .await
        .unwrap();
    assert_eq!(active.id, newer);

    lessons::end_lesson(&pool, &room.teacher, newer).await.unwrap();
    let active = lessons::active_lesson_for_group(&pool, &room.students[0], room.group_id)
        .await
        .unwrap();
    assert_eq!(active.id, older);
}

#[tokio::test]
async fn history_lists_submitted_lessons_with_first_task_title() {
    let pool = test_pool().await;
    let room = classroom(&pool, 1).await;
    let lesson_id = mixed_lesson(&pool, &room).await;
    let student = &room.students[0];

    assert!(submissions::lesson_history(&pool, student).await.unwrap().is_empty());

    submissions::submit_answers(&pool, student, lesson_id, vec![choice(0, 1), choice(1, 0)])
        .await
        .unwrap();

    let history = submissions::lesson_history(&pool, student).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].lesson_id, lesson_id);
    assert_eq!(history[0].score, 100);
    assert_eq!(history[0].task_title.as_deref(), Some("Task A"));

    assert!(matches!(
        submissions::lesson_history(&pool, &room.teacher).await,
        Err(AppError::Forbidden(_))
    ));
}
