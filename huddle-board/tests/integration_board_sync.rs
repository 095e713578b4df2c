//! Integration tests for the board sync engine against the in-memory store

use huddle_board::{BoardSyncEngine, BoardView, ColumnId, SyncState, TaskId};
use huddle_store::{MemoryStore, RemoteStore, StorePath};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::watch;

async fn setup() -> (Arc<MemoryStore>, BoardSyncEngine) {
    let store = Arc::new(MemoryStore::new());
    let engine = BoardSyncEngine::new(store.clone() as Arc<dyn RemoteStore>);
    engine.subscribe().await.unwrap();
    (store, engine)
}

async fn wait_for(view: &mut watch::Receiver<BoardView>, predicate: impl Fn(&BoardView) -> bool) {
    while !predicate(&view.borrow()) {
        view.changed().await.expect("view channel closed");
    }
}

async fn read(store: &MemoryStore, path: &str) -> Value {
    store.read_once(&StorePath::from(path)).await.unwrap()
}

#[test_log::test(tokio::test)]
async fn test_create_then_delete_column_round_trips() {
    let (store, engine) = setup().await;

    let keeper = engine.create_column("Keeper").await.unwrap();
    let order_before = read(&store, "board/columnOrder").await;
    let columns_before = read(&store, "board/columns").await;

    let doomed = engine.create_column("Doomed").await.unwrap();
    assert_eq!(
        read(&store, "board/columnOrder").await,
        json!([keeper.id.as_str(), doomed.id.as_str()])
    );

    engine.delete_column(&doomed.id).await.unwrap();
    assert_eq!(read(&store, "board/columnOrder").await, order_before);
    assert_eq!(read(&store, "board/columns").await, columns_before);
}

#[test_log::test(tokio::test)]
async fn test_create_then_delete_task_round_trips() {
    let (store, engine) = setup().await;
    let column = engine.create_column("To Do").await.unwrap();
    let keeper = engine.create_task(&column.id, "Keeper", "").await.unwrap();

    let task_ids_path = format!("board/columns/{}/taskIds", column.id);
    let task_ids_before = read(&store, &task_ids_path).await;
    let tasks_before = read(&store, "board/tasks").await;

    let doomed = engine.create_task(&column.id, "Doomed", "").await.unwrap();
    assert_eq!(
        read(&store, &task_ids_path).await,
        json!([keeper.id.as_str(), doomed.id.as_str()])
    );

    engine.delete_task(&doomed.id, &column.id).await.unwrap();
    assert_eq!(read(&store, &task_ids_path).await, task_ids_before);
    assert_eq!(read(&store, "board/tasks").await, tasks_before);
}

#[test_log::test(tokio::test)]
async fn test_column_delete_cascades_to_tasks() {
    let (store, engine) = setup().await;
    let mut view = engine.view();

    let keeper = engine.create_column("Keeper").await.unwrap();
    let kept_task = engine.create_task(&keeper.id, "Stays", "").await.unwrap();

    let doomed = engine.create_column("Doomed").await.unwrap();
    let t1 = engine.create_task(&doomed.id, "Task 1", "").await.unwrap();
    let t2 = engine.create_task(&doomed.id, "Task 2", "").await.unwrap();

    engine.delete_column(&doomed.id).await.unwrap();
    wait_for(&mut view, |v| !v.columns.contains_key(&doomed.id)).await;

    // Both tasks went with the column; the other column is untouched.
    let current = engine.current();
    assert!(!current.tasks.contains_key(&t1.id));
    assert!(!current.tasks.contains_key(&t2.id));
    assert!(current.tasks.contains_key(&kept_task.id));
    assert_eq!(current.column_order, vec![keeper.id.clone()]);

    assert_eq!(read(&store, &format!("board/tasks/{}", t1.id)).await, Value::Null);
    assert_eq!(read(&store, &format!("board/tasks/{}", t2.id)).await, Value::Null);
}

#[test_log::test(tokio::test)]
async fn test_reorder_tasks_within_column() {
    let (store, engine) = setup().await;
    let column = engine.create_column("To Do").await.unwrap();
    let t1 = engine.create_task(&column.id, "t1", "").await.unwrap();
    let t2 = engine.create_task(&column.id, "t2", "").await.unwrap();
    let t3 = engine.create_task(&column.id, "t3", "").await.unwrap();

    engine.reorder_tasks_in_column(&column.id, 0, 2).await.unwrap();

    assert_eq!(
        read(&store, &format!("board/columns/{}/taskIds", column.id)).await,
        json!([t2.id.as_str(), t3.id.as_str(), t1.id.as_str()])
    );
}

#[test_log::test(tokio::test)]
async fn test_reorder_columns_drag_before() {
    let (store, engine) = setup().await;
    let a = engine.create_column("A").await.unwrap();
    let b = engine.create_column("B").await.unwrap();

    // Drag column B before A.
    engine.reorder_columns(1, 0).await.unwrap();

    assert_eq!(
        read(&store, "board/columnOrder").await,
        json!([b.id.as_str(), a.id.as_str()])
    );
}

#[test_log::test(tokio::test)]
async fn test_move_task_across_columns() {
    let (store, engine) = setup().await;
    let a = engine.create_column("A").await.unwrap();
    let b = engine.create_column("B").await.unwrap();
    let t1 = engine.create_task(&a.id, "t1", "").await.unwrap();
    let t2 = engine.create_task(&a.id, "t2", "").await.unwrap();
    let t3 = engine.create_task(&b.id, "t3", "").await.unwrap();

    engine.move_task(&t1.id, &a.id, &b.id, 1).await.unwrap();

    assert_eq!(
        read(&store, &format!("board/columns/{}/taskIds", a.id)).await,
        json!([t2.id.as_str()])
    );
    assert_eq!(
        read(&store, &format!("board/columns/{}/taskIds", b.id)).await,
        json!([t3.id.as_str(), t1.id.as_str()])
    );
}

#[test_log::test(tokio::test)]
async fn test_move_conserves_tasks() {
    let (_, engine) = setup().await;
    let mut view = engine.view();
    let a = engine.create_column("A").await.unwrap();
    let b = engine.create_column("B").await.unwrap();
    let t1 = engine.create_task(&a.id, "t1", "").await.unwrap();
    engine.create_task(&a.id, "t2", "").await.unwrap();
    engine.create_task(&b.id, "t3", "").await.unwrap();

    engine.move_task(&t1.id, &a.id, &b.id, 0).await.unwrap();
    wait_for(&mut view, |v| {
        v.columns.get(&b.id).is_some_and(|c| c.contains(&t1.id))
    })
    .await;

    let current = engine.current();
    let total: usize = current.columns.values().map(|c| c.task_ids.len()).sum();
    assert_eq!(total, 3);
    let holders = current
        .columns
        .values()
        .filter(|c| c.contains(&t1.id))
        .count();
    assert_eq!(holders, 1);
}

#[test_log::test(tokio::test)]
async fn test_stale_move_fails_without_damage() {
    let (store, engine) = setup().await;
    let a = engine.create_column("A").await.unwrap();
    let b = engine.create_column("B").await.unwrap();
    let t1 = engine.create_task(&a.id, "t1", "").await.unwrap();
    let t2 = engine.create_task(&a.id, "t2", "").await.unwrap();

    // Another client moved t1 away before our drag landed.
    store
        .write(
            &StorePath::from(format!("board/columns/{}/taskIds", a.id)),
            json!([t2.id.as_str()]),
        )
        .await
        .unwrap();

    let err = engine.move_task(&t1.id, &a.id, &b.id, 0).await.unwrap_err();
    assert!(matches!(err, huddle_board::BoardError::TaskNotInColumn { .. }));

    // The stale drag deleted nothing.
    assert_eq!(
        read(&store, &format!("board/columns/{}/taskIds", a.id)).await,
        json!([t2.id.as_str()])
    );
}

#[test_log::test(tokio::test)]
async fn test_two_engines_converge() {
    let store = Arc::new(MemoryStore::new());
    let ours = BoardSyncEngine::new(store.clone() as Arc<dyn RemoteStore>);
    let theirs = BoardSyncEngine::new(store.clone() as Arc<dyn RemoteStore>);
    ours.subscribe().await.unwrap();
    theirs.subscribe().await.unwrap();

    let mut our_view = ours.view();
    let mut their_view = theirs.view();

    let column = ours.create_column("Shared").await.unwrap();
    let task = theirs.create_task(&column.id, "From them", "").await.unwrap();

    wait_for(&mut our_view, |v| v.tasks.contains_key(&task.id)).await;
    wait_for(&mut their_view, |v| v.tasks.contains_key(&task.id)).await;

    let ours_now = ours.current();
    let theirs_now = theirs.current();
    assert_eq!(ours_now.column_order, theirs_now.column_order);
    assert_eq!(ours_now.columns, theirs_now.columns);
    assert_eq!(ours_now.tasks, theirs_now.tasks);
}

#[test_log::test(tokio::test)]
async fn test_repair_sweeps_orphans() {
    let (store, engine) = setup().await;
    let column = engine.create_column("To Do").await.unwrap();
    let kept = engine.create_task(&column.id, "Kept", "").await.unwrap();

    // An entity whose ordering-list append never landed: written, but
    // referenced by no column.
    let orphan_id = TaskId::new();
    store
        .write(
            &StorePath::from(format!("board/tasks/{}", orphan_id)),
            json!({
                "id": orphan_id.as_str(),
                "title": "Lost",
                "description": "",
                "createdAt": "2026-01-01T00:00:00Z",
                "updatedAt": "2026-01-01T00:00:00Z"
            }),
        )
        .await
        .unwrap();

    assert_eq!(engine.repair().await.unwrap(), 1);
    assert_eq!(
        read(&store, &format!("board/tasks/{}", orphan_id)).await,
        Value::Null
    );
    assert_ne!(
        read(&store, &format!("board/tasks/{}", kept.id)).await,
        Value::Null
    );

    // Nothing left to sweep.
    assert_eq!(engine.repair().await.unwrap(), 0);
}

#[test_log::test(tokio::test)]
async fn test_projection_follows_external_writes() {
    let (store, engine) = setup().await;
    let mut view = engine.view();
    wait_for(&mut view, |v| v.state == SyncState::Synced).await;

    // A write from a client we know nothing about.
    store
        .write(
            &StorePath::from("board"),
            json!({
                "columnOrder": ["c1"],
                "columns": {
                    "c1": {"id": "c1", "title": "Imported", "taskIds": [],
                           "createdAt": "2026-01-01T00:00:00Z"}
                }
            }),
        )
        .await
        .unwrap();

    wait_for(&mut view, |v| !v.column_order.is_empty()).await;
    let current = engine.current();
    assert_eq!(current.column_order, vec![ColumnId::from_string("c1")]);
    assert_eq!(current.columns[&ColumnId::from_string("c1")].title, "Imported");
}
