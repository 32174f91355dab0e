//! Integration tests for task positions and the reorder write path.
//!
//! Exercises the repository layer against a real database:
//! - Display order (position, then creation time)
//! - Reorder assigns list indexes and is idempotent
//! - Reorder refuses ids outside the project without writing anything
//! - Reorder of a missing or deleted project
//! - Project deletion cascades to tasks

use assert_matches::assert_matches;
use sqlx::PgPool;
use worklog_db::models::task::Task;
use worklog_db::repositories::{ProjectRepo, ReorderOutcome, TaskRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_project(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO projects (name, slug) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(name.to_lowercase())
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn seed_task(pool: &PgPool, project_id: i64, title: &str, position: i32) -> Task {
    sqlx::query_as(
        "INSERT INTO tasks (project_id, title, allotted_time, position) \
         VALUES ($1, $2, 30, $3) \
         RETURNING id, project_id, title, allotted_time, position, created_at, updated_at",
    )
    .bind(project_id)
    .bind(title)
    .bind(position)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn position_of(pool: &PgPool, task_id: i64) -> Option<i32> {
    sqlx::query_scalar("SELECT position FROM tasks WHERE id = $1")
        .bind(task_id)
        .fetch_optional(pool)
        .await
        .unwrap()
}

fn positions_by_id(tasks: &[Task]) -> Vec<(i64, i32)> {
    let mut pairs: Vec<_> = tasks.iter().map(|t| (t.id, t.position)).collect();
    pairs.sort();
    pairs
}

async fn reordered(pool: &PgPool, project_id: i64, task_ids: &[i64]) -> Vec<Task> {
    match TaskRepo::reorder(pool, project_id, task_ids).await.unwrap() {
        ReorderOutcome::Reordered(tasks) => tasks,
        other => panic!("expected reorder to succeed, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_orders_by_position_then_creation(pool: PgPool) {
    let project_id = seed_project(&pool, "Ordering").await;
    let late = seed_task(&pool, project_id, "late", 2).await;
    let first_tie = seed_task(&pool, project_id, "tie-a", 1).await;
    let second_tie = seed_task(&pool, project_id, "tie-b", 1).await;
    let early = seed_task(&pool, project_id, "early", 0).await;

    let tasks = TaskRepo::list_by_project(&pool, project_id).await.unwrap();
    let ids: Vec<_> = tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![early.id, first_tie.id, second_tie.id, late.id]);
}

// ---------------------------------------------------------------------------
// Reorder
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reorder_is_idempotent(pool: PgPool) {
    let project_id = seed_project(&pool, "Reorder").await;
    let t1 = seed_task(&pool, project_id, "one", 0).await;
    let t2 = seed_task(&pool, project_id, "two", 1).await;
    let t3 = seed_task(&pool, project_id, "three", 2).await;

    let order = [t3.id, t1.id, t2.id];
    let first = reordered(&pool, project_id, &order).await;
    let second = reordered(&pool, project_id, &order).await;

    let expected = {
        let mut v = vec![(t3.id, 0), (t1.id, 1), (t2.id, 2)];
        v.sort();
        v
    };
    assert_eq!(positions_by_id(&first), expected);
    assert_eq!(positions_by_id(&second), expected);

    let ids: Vec<_> = second.iter().map(|t| t.id).collect();
    assert_eq!(ids, order.to_vec());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reorder_leaves_unlisted_tasks_alone(pool: PgPool) {
    let project_id = seed_project(&pool, "Partial").await;
    let a = seed_task(&pool, project_id, "a", 0).await;
    let b = seed_task(&pool, project_id, "b", 1).await;
    let c = seed_task(&pool, project_id, "c", 5).await;

    reordered(&pool, project_id, &[b.id, a.id]).await;

    assert_eq!(position_of(&pool, c.id).await, Some(5));
    assert_eq!(position_of(&pool, a.id).await, Some(1));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reorder_rejects_foreign_task_without_writing(pool: PgPool) {
    let mine = seed_project(&pool, "Mine").await;
    let theirs = seed_project(&pool, "Theirs").await;
    let a = seed_task(&pool, mine, "a", 0).await;
    let b = seed_task(&pool, mine, "b", 1).await;
    let foreign = seed_task(&pool, theirs, "x", 0).await;

    let result = TaskRepo::reorder(&pool, mine, &[b.id, foreign.id, a.id])
        .await
        .unwrap();
    assert_matches!(result, ReorderOutcome::ForeignTasks);

    let tasks = TaskRepo::list_by_project(&pool, mine).await.unwrap();
    assert_eq!(positions_by_id(&tasks), vec![(a.id, 0), (b.id, 1)]);
    assert_eq!(position_of(&pool, foreign.id).await, Some(0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reorder_unknown_project(pool: PgPool) {
    let result = TaskRepo::reorder(&pool, 999_999, &[1]).await.unwrap();
    assert_matches!(result, ReorderOutcome::ProjectNotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reorder_after_project_deleted(pool: PgPool) {
    let project_id = seed_project(&pool, "Gone").await;
    let a = seed_task(&pool, project_id, "a", 0).await;
    assert!(ProjectRepo::delete(&pool, project_id).await.unwrap());

    let result = TaskRepo::reorder(&pool, project_id, &[a.id]).await.unwrap();
    assert_matches!(result, ReorderOutcome::ProjectNotFound);
}

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_project_cascades_to_tasks(pool: PgPool) {
    let project_id = seed_project(&pool, "Doomed").await;
    let task = seed_task(&pool, project_id, "a", 0).await;

    assert!(ProjectRepo::delete(&pool, project_id).await.unwrap());
    assert_eq!(position_of(&pool, task.id).await, None);
    assert!(!ProjectRepo::delete(&pool, project_id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_negative_position_violates_check(pool: PgPool) {
    let project_id = seed_project(&pool, "Check").await;
    let result = sqlx::query(
        "INSERT INTO tasks (project_id, title, allotted_time, position) VALUES ($1, 'bad', 0, -1)",
    )
    .bind(project_id)
    .execute(&pool)
    .await;
    assert!(result.is_err());
}
