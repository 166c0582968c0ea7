use rusqlite::Connection;
use todo_core::db::open_db_in_memory;
use todo_core::{
    LifecycleError, NewTodo, SqliteTodoRepository, SubTodoPatch, TodoPatch, TodoRepository,
    TodoService, TrashService,
};
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn todo_service(conn: &Connection) -> TodoService<SqliteTodoRepository<'_>> {
    TodoService::new(SqliteTodoRepository::try_new(conn).unwrap())
}

fn trash_service(conn: &Connection) -> TrashService<SqliteTodoRepository<'_>> {
    TrashService::new(SqliteTodoRepository::try_new(conn).unwrap())
}

fn new_todo(text: &str) -> NewTodo {
    NewTodo {
        text: text.to_string(),
        date: None,
    }
}

#[test]
fn created_todo_is_incomplete_and_empty() {
    let conn = setup();
    let service = todo_service(&conn);

    let created = service
        .create_todo(NewTodo {
            text: "Buy milk".to_string(),
            date: Some("2024-03-01".to_string()),
        })
        .unwrap();
    assert!(!created.todo.completed);
    assert!(created.sub_todos.is_empty());

    let loaded = service.get_todo(created.todo.id).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn single_sub_todo_completion_completes_parent() {
    let conn = setup();
    let service = todo_service(&conn);

    let todo = service.create_todo(new_todo("Buy milk")).unwrap().todo;
    let sub = service.create_sub_todo(todo.id, "2%").unwrap();
    assert!(!service.get_todo(todo.id).unwrap().todo.completed);

    let updated = service
        .set_sub_todo_completion(todo.id, sub.id, true)
        .unwrap();
    assert!(updated.completed);
    assert!(service.get_todo(todo.id).unwrap().todo.completed);
}

#[test]
fn parent_completion_tracks_every_sub_todo_write() {
    let conn = setup();
    let service = todo_service(&conn);

    let todo = service.create_todo(new_todo("Trip")).unwrap().todo;
    let first = service.create_sub_todo(todo.id, "tickets").unwrap();
    let second = service.create_sub_todo(todo.id, "hotel").unwrap();

    service.set_sub_todo_completion(todo.id, first.id, true).unwrap();
    assert!(!service.get_todo(todo.id).unwrap().todo.completed);

    service.set_sub_todo_completion(todo.id, second.id, true).unwrap();
    assert!(service.get_todo(todo.id).unwrap().todo.completed);

    service.set_sub_todo_completion(todo.id, first.id, false).unwrap();
    assert!(!service.get_todo(todo.id).unwrap().todo.completed);
}

#[test]
fn todo_completion_cascades_to_all_sub_todos() {
    let conn = setup();
    let service = todo_service(&conn);

    let todo = service.create_todo(new_todo("Release")).unwrap().todo;
    let done = service.create_sub_todo(todo.id, "tag").unwrap();
    service.create_sub_todo(todo.id, "publish").unwrap();
    service.set_sub_todo_completion(todo.id, done.id, true).unwrap();

    let detail = service.set_todo_completion(todo.id, true).unwrap();
    assert!(detail.todo.completed);
    assert_eq!(detail.sub_todos.len(), 2);
    assert!(detail.sub_todos.iter().all(|sub| sub.completed));

    let detail = service.set_todo_completion(todo.id, false).unwrap();
    assert!(!detail.todo.completed);
    assert!(detail.sub_todos.iter().all(|sub| !sub.completed));
}

#[test]
fn todo_completion_cascade_reaches_trashed_sub_todos() {
    let conn = setup();
    let service = todo_service(&conn);
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let todo = service.create_todo(new_todo("Clean")).unwrap().todo;
    let trashed = service.create_sub_todo(todo.id, "attic").unwrap();
    service.soft_delete_sub_todo(todo.id, trashed.id).unwrap();

    service.set_todo_completion(todo.id, true).unwrap();

    let stored = repo.get_sub_todo(trashed.id, true).unwrap().unwrap();
    assert!(stored.completed);
    assert!(stored.deleted_at.is_some());
}

#[test]
fn trashed_sub_todos_still_count_toward_parent_completion() {
    let conn = setup();
    let service = todo_service(&conn);

    let todo = service.create_todo(new_todo("Garden")).unwrap().todo;
    let open = service.create_sub_todo(todo.id, "weeds").unwrap();
    let other = service.create_sub_todo(todo.id, "water").unwrap();
    service.soft_delete_sub_todo(todo.id, open.id).unwrap();

    service.set_sub_todo_completion(todo.id, other.id, true).unwrap();

    assert!(!service.get_todo(todo.id).unwrap().todo.completed);
}

#[test]
fn todo_without_sub_todos_keeps_client_completion() {
    let conn = setup();
    let service = todo_service(&conn);

    let todo = service.create_todo(new_todo("Call mom")).unwrap().todo;
    let detail = service.set_todo_completion(todo.id, true).unwrap();
    assert!(detail.todo.completed);
    assert!(detail.sub_todos.is_empty());
}

#[test]
fn adding_sub_todo_reopens_completed_parent() {
    let conn = setup();
    let service = todo_service(&conn);

    let todo = service.create_todo(new_todo("Pack")).unwrap().todo;
    service.set_todo_completion(todo.id, true).unwrap();

    service.create_sub_todo(todo.id, "charger").unwrap();

    assert!(!service.get_todo(todo.id).unwrap().todo.completed);
}

#[test]
fn update_todo_applies_only_present_fields() {
    let conn = setup();
    let service = todo_service(&conn);

    let todo = service
        .create_todo(NewTodo {
            text: "Draft".to_string(),
            date: Some("2024-01-01".to_string()),
        })
        .unwrap()
        .todo;

    let renamed = service
        .update_todo(
            todo.id,
            &TodoPatch {
                text: Some("Final".to_string()),
                ..TodoPatch::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.todo.text, "Final");
    assert_eq!(renamed.todo.date.as_deref(), Some("2024-01-01"));
    assert!(!renamed.todo.completed);

    let cleared = service
        .update_todo(
            todo.id,
            &TodoPatch {
                date: Some(None),
                ..TodoPatch::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.todo.date, None);
    assert_eq!(cleared.todo.text, "Final");
}

#[test]
fn update_sub_todo_text_leaves_parent_alone() {
    let conn = setup();
    let service = todo_service(&conn);

    let todo = service.create_todo(new_todo("Parent")).unwrap().todo;
    let sub = service.create_sub_todo(todo.id, "old").unwrap();

    let updated = service
        .update_sub_todo(
            todo.id,
            sub.id,
            &SubTodoPatch {
                text: Some("new".to_string()),
                ..SubTodoPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.text, "new");
    assert!(!updated.completed);
    assert_eq!(service.get_todo(todo.id).unwrap().sub_todos[0].text, "new");
}

#[test]
fn sub_todo_under_other_todo_is_not_found() {
    let conn = setup();
    let service = todo_service(&conn);

    let owner = service.create_todo(new_todo("Owner")).unwrap().todo;
    let stranger = service.create_todo(new_todo("Stranger")).unwrap().todo;
    let sub = service.create_sub_todo(owner.id, "mine").unwrap();

    let err = service
        .set_sub_todo_completion(stranger.id, sub.id, true)
        .unwrap_err();
    assert!(matches!(err, LifecycleError::SubTodoNotFound(id) if id == sub.id));

    let err = service.soft_delete_sub_todo(stranger.id, sub.id).unwrap_err();
    assert!(matches!(err, LifecycleError::SubTodoNotFound(_)));
}

#[test]
fn unknown_todo_is_not_found() {
    let conn = setup();
    let service = todo_service(&conn);
    let missing = Uuid::new_v4();

    assert!(matches!(
        service.get_todo(missing),
        Err(LifecycleError::TodoNotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.set_todo_completion(missing, true),
        Err(LifecycleError::TodoNotFound(_))
    ));
    assert!(matches!(
        service.create_sub_todo(missing, "orphan"),
        Err(LifecycleError::TodoNotFound(_))
    ));
}

#[test]
fn soft_delete_todo_stamps_todo_and_sub_todos_with_one_timestamp() {
    let conn = setup();
    let service = todo_service(&conn);
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let todo = service.create_todo(new_todo("Move")).unwrap().todo;
    let early = service.create_sub_todo(todo.id, "boxes").unwrap();
    service.create_sub_todo(todo.id, "truck").unwrap();
    service.soft_delete_sub_todo(todo.id, early.id).unwrap();

    let trashed = service.soft_delete_todo(todo.id).unwrap();
    let deleted_at = trashed.todo.deleted_at.unwrap();
    assert_eq!(trashed.sub_todos.len(), 2);
    assert!(trashed
        .sub_todos
        .iter()
        .all(|sub| sub.deleted_at == Some(deleted_at)));

    let stored = repo.get_todo(todo.id, true).unwrap().unwrap();
    assert_eq!(stored.deleted_at, Some(deleted_at));
    assert!(repo.list_sub_todos(todo.id, false).unwrap().is_empty());
}

#[test]
fn trashed_todo_is_hidden_from_active_scope() {
    let conn = setup();
    let service = todo_service(&conn);

    let kept = service.create_todo(new_todo("Keep")).unwrap().todo;
    let gone = service.create_todo(new_todo("Gone")).unwrap().todo;
    service.soft_delete_todo(gone.id).unwrap();

    let listed: Vec<Uuid> = service
        .list_todos()
        .unwrap()
        .into_iter()
        .map(|detail| detail.todo.id)
        .collect();
    assert_eq!(listed, vec![kept.id]);

    assert!(matches!(
        service.get_todo(gone.id),
        Err(LifecycleError::TodoNotFound(_))
    ));
    assert!(matches!(
        service.soft_delete_todo(gone.id),
        Err(LifecycleError::TodoNotFound(_))
    ));
}

#[test]
fn soft_deleted_sub_todo_is_hidden_from_parent_view() {
    let conn = setup();
    let service = todo_service(&conn);

    let todo = service.create_todo(new_todo("Parent")).unwrap().todo;
    let kept = service.create_sub_todo(todo.id, "kept").unwrap();
    let gone = service.create_sub_todo(todo.id, "gone").unwrap();

    service.soft_delete_sub_todo(todo.id, gone.id).unwrap();

    let detail = service.get_todo(todo.id).unwrap();
    assert!(detail.todo.is_active());
    assert_eq!(detail.sub_todos, vec![kept]);
    assert!(matches!(
        service.soft_delete_sub_todo(todo.id, gone.id),
        Err(LifecycleError::SubTodoNotFound(_))
    ));
}

#[test]
fn restore_todo_restores_individually_trashed_sub_todos() {
    let conn = setup();
    let service = todo_service(&conn);
    let trash = trash_service(&conn);

    let todo = service.create_todo(new_todo("Plan")).unwrap().todo;
    let first = service.create_sub_todo(todo.id, "a").unwrap();
    service.create_sub_todo(todo.id, "b").unwrap();
    service.soft_delete_sub_todo(todo.id, first.id).unwrap();
    service.soft_delete_todo(todo.id).unwrap();

    let restored = trash.restore_todo(todo.id).unwrap();
    assert!(restored.todo.deleted_at.is_none());
    assert_eq!(restored.sub_todos.len(), 2);
    assert!(restored.sub_todos.iter().all(|sub| sub.deleted_at.is_none()));

    assert_eq!(service.get_todo(todo.id).unwrap().sub_todos.len(), 2);
}

#[test]
fn restore_requires_trashed_record() {
    let conn = setup();
    let service = todo_service(&conn);
    let trash = trash_service(&conn);

    let todo = service.create_todo(new_todo("Active")).unwrap().todo;
    let sub = service.create_sub_todo(todo.id, "active").unwrap();

    assert!(matches!(
        trash.restore_todo(todo.id),
        Err(LifecycleError::TodoNotFound(_))
    ));
    assert!(matches!(
        trash.restore_sub_todo(sub.id),
        Err(LifecycleError::SubTodoNotFound(_))
    ));
    assert!(matches!(
        trash.restore_todo(Uuid::new_v4()),
        Err(LifecycleError::TodoNotFound(_))
    ));
}

#[test]
fn restore_sub_todo_under_trashed_parent_leaves_parent_in_trash() {
    let conn = setup();
    let service = todo_service(&conn);
    let trash = trash_service(&conn);
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let todo = service.create_todo(new_todo("Parent")).unwrap().todo;
    let sub = service.create_sub_todo(todo.id, "child").unwrap();
    service.soft_delete_todo(todo.id).unwrap();

    let restored = trash.restore_sub_todo(sub.id).unwrap();
    assert!(restored.deleted_at.is_none());

    let parent = repo.get_todo(todo.id, true).unwrap().unwrap();
    assert!(parent.deleted_at.is_some());
    let child = repo.get_sub_todo(sub.id, false).unwrap().unwrap();
    assert!(child.is_active());
}

#[test]
fn failed_unit_of_work_rolls_back_every_write() {
    let conn = setup();
    let service = todo_service(&conn);
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let todo = service.create_todo(new_todo("Atomic")).unwrap().todo;
    service.create_sub_todo(todo.id, "one").unwrap();

    let result: Result<(), LifecycleError> = repo.atomically(|repo| {
        repo.set_sub_todos_completed(todo.id, true)?;
        Err(LifecycleError::TodoNotFound(todo.id))
    });
    assert!(result.is_err());

    let subs = repo.list_sub_todos(todo.id, true).unwrap();
    assert!(subs.iter().all(|sub| !sub.completed));
}
