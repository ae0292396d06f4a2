use chrono::{DateTime, TimeDelta, Utc};
use insta::assert_yaml_snapshot;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};
use todos_server::entities::todo;
use todos_server::todo::{TodoId, TodoService, TodoServiceError, TodoTitle};

mod common;

use common::{create_user, setup};

fn title(raw: &str) -> TodoTitle {
    TodoTitle::parse(raw).unwrap()
}

/// Inserts a todo with an explicit creation time so ordering is deterministic.
async fn insert_todo(
    db: &DatabaseConnection,
    owner_id: &str,
    title: &str,
    created_at: DateTime<Utc>,
) -> String {
    let id = TodoId::generate().into_inner();
    let model = todo::ActiveModel {
        id: ActiveValue::Set(id.clone()),
        title: ActiveValue::Set(title.to_string()),
        user_id: ActiveValue::Set(owner_id.to_string()),
        description: ActiveValue::Set(String::new()),
        completed: ActiveValue::Set(false),
        created_at: ActiveValue::Set(created_at),
        updated_at: ActiveValue::Set(created_at),
    };
    todo::Entity::insert(model)
        .exec(db)
        .await
        .expect("Failed to insert todo");
    id
}

#[tokio::test]
async fn can_create_todo() {
    let state = setup().await.expect("Failed to setup test context");
    let user = create_user(&state.db, "alice").await.expect("Failed to create user");

    let created = TodoService::new(&state.db)
        .create_todo(user.id(), title("Buy milk"), None)
        .await
        .expect("Failed to create todo");

    assert_eq!(created.title, "Buy milk");
    assert!(!created.completed);
    let stored = todo::Entity::find_by_id(created.id.as_str())
        .one(&state.db)
        .await
        .expect("Failed to query todo")
        .expect("Todo not found");
    assert_eq!(stored.user_id, user.id());
    assert_eq!(stored.description, "");
    assert_eq!(stored.created_at, stored.updated_at);
}

#[tokio::test]
async fn can_create_todo_with_client_id() {
    let state = setup().await.expect("Failed to setup test context");
    let user = create_user(&state.db, "alice").await.expect("Failed to create user");
    let id = TodoId::generate();

    let created = TodoService::new(&state.db)
        .create_todo(user.id(), title("Buy milk"), Some(id.clone()))
        .await
        .expect("Failed to create todo");

    assert_eq!(created.id, id.as_str());
}

#[tokio::test]
async fn can_reject_duplicate_client_id() {
    let state = setup().await.expect("Failed to setup test context");
    let user = create_user(&state.db, "alice").await.expect("Failed to create user");
    let todo_service = TodoService::new(&state.db);
    let id = TodoId::generate();
    todo_service
        .create_todo(user.id(), title("Buy milk"), Some(id.clone()))
        .await
        .expect("Failed to create todo");

    let result = todo_service
        .create_todo(user.id(), title("Buy bread"), Some(id.clone()))
        .await;

    assert!(matches!(result, Err(TodoServiceError::DuplicateId(duplicate)) if duplicate == id.as_str()));
}

#[tokio::test]
async fn can_toggle_todo() {
    let state = setup().await.expect("Failed to setup test context");
    let user = create_user(&state.db, "alice").await.expect("Failed to create user");
    let todo_service = TodoService::new(&state.db);
    let created = todo_service
        .create_todo(user.id(), title("Buy milk"), None)
        .await
        .expect("Failed to create todo");

    let affected = todo_service
        .toggle_todo(user.id(), &created.id)
        .await
        .expect("Failed to toggle todo");
    assert_eq!(affected, 1);
    let toggled = todo_service
        .get_todo(user.id(), &created.id)
        .await
        .expect("Failed to get todo")
        .expect("Todo not found");
    assert!(toggled.completed);

    todo_service
        .toggle_todo(user.id(), &created.id)
        .await
        .expect("Failed to toggle todo");
    let toggled_back = todo_service
        .get_todo(user.id(), &created.id)
        .await
        .expect("Failed to get todo")
        .expect("Todo not found");
    assert!(!toggled_back.completed);
}

#[tokio::test]
async fn can_rename_todo() {
    let state = setup().await.expect("Failed to setup test context");
    let user = create_user(&state.db, "alice").await.expect("Failed to create user");
    let todo_service = TodoService::new(&state.db);
    let created = todo_service
        .create_todo(user.id(), title("Buy milk"), None)
        .await
        .expect("Failed to create todo");
    let id = TodoId::parse(&created.id).unwrap();

    let affected = todo_service
        .rename_todo(user.id(), &id, title("Buy oat milk"))
        .await
        .expect("Failed to rename todo");

    assert_eq!(affected, 1);
    let renamed = todo_service
        .get_todo(user.id(), &created.id)
        .await
        .expect("Failed to get todo")
        .expect("Todo not found");
    assert_eq!(renamed.title, "Buy oat milk");
}

#[tokio::test]
async fn can_delete_todo() {
    let state = setup().await.expect("Failed to setup test context");
    let user = create_user(&state.db, "alice").await.expect("Failed to create user");
    let todo_service = TodoService::new(&state.db);
    let created = todo_service
        .create_todo(user.id(), title("Buy milk"), None)
        .await
        .expect("Failed to create todo");

    let affected = todo_service
        .delete_todo(user.id(), &created.id)
        .await
        .expect("Failed to delete todo");

    assert_eq!(affected, 1);
    let remaining = todo_service
        .list_todos(user.id(), None, 15)
        .await
        .expect("Failed to list todos");
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn ignores_mutations_of_other_users_todos() {
    let state = setup().await.expect("Failed to setup test context");
    let alice = create_user(&state.db, "alice").await.expect("Failed to create user");
    let mallory = create_user(&state.db, "mallory").await.expect("Failed to create user");
    let todo_service = TodoService::new(&state.db);
    let created = todo_service
        .create_todo(alice.id(), title("Buy milk"), None)
        .await
        .expect("Failed to create todo");
    let id = TodoId::parse(&created.id).unwrap();

    let toggled = todo_service
        .toggle_todo(mallory.id(), &created.id)
        .await
        .expect("Failed to toggle todo");
    let renamed = todo_service
        .rename_todo(mallory.id(), &id, title("Pwned"))
        .await
        .expect("Failed to rename todo");
    let deleted = todo_service
        .delete_todo(mallory.id(), &created.id)
        .await
        .expect("Failed to delete todo");
    let visible = todo_service
        .get_todo(mallory.id(), &created.id)
        .await
        .expect("Failed to get todo");

    assert_eq!((toggled, renamed, deleted), (0, 0, 0));
    assert!(visible.is_none());
    let untouched = todo_service
        .get_todo(alice.id(), &created.id)
        .await
        .expect("Failed to get todo")
        .expect("Todo not found");
    assert_eq!(untouched, created);
}

#[tokio::test]
async fn ignores_mutations_of_missing_todos() {
    let state = setup().await.expect("Failed to setup test context");
    let user = create_user(&state.db, "alice").await.expect("Failed to create user");
    let todo_service = TodoService::new(&state.db);
    let missing = TodoId::generate();

    assert_eq!(todo_service.toggle_todo(user.id(), missing.as_str()).await.unwrap(), 0);
    assert_eq!(
        todo_service
            .rename_todo(user.id(), &missing, title("Nothing"))
            .await
            .unwrap(),
        0
    );
    assert_eq!(todo_service.delete_todo(user.id(), missing.as_str()).await.unwrap(), 0);
}

#[tokio::test]
async fn can_list_only_own_todos_newest_first() {
    let state = setup().await.expect("Failed to setup test context");
    let alice = create_user(&state.db, "alice").await.expect("Failed to create user");
    let bob = create_user(&state.db, "bob").await.expect("Failed to create user");
    let now = Utc::now();
    insert_todo(&state.db, alice.id(), "Oldest", now - TimeDelta::minutes(2)).await;
    insert_todo(&state.db, alice.id(), "Newest", now).await;
    insert_todo(&state.db, alice.id(), "Middle", now - TimeDelta::minutes(1)).await;
    insert_todo(&state.db, bob.id(), "Bob's", now).await;

    let todos = TodoService::new(&state.db)
        .list_todos(alice.id(), None, 15)
        .await
        .expect("Failed to list todos");

    let titles: Vec<&str> = todos.iter().map(|todo| todo.title.as_str()).collect();
    assert_yaml_snapshot!(titles, @r"
    - Newest
    - Middle
    - Oldest
    ");
}

#[tokio::test]
async fn can_search_titles_case_insensitively() {
    let state = setup().await.expect("Failed to setup test context");
    let user = create_user(&state.db, "alice").await.expect("Failed to create user");
    let now = Utc::now();
    insert_todo(&state.db, user.id(), "Buy MILK", now - TimeDelta::minutes(3)).await;
    insert_todo(&state.db, user.id(), "Walk the dog", now - TimeDelta::minutes(2)).await;
    insert_todo(&state.db, user.id(), "Oat milk for Bob", now - TimeDelta::minutes(1)).await;

    let todos = TodoService::new(&state.db)
        .list_todos(user.id(), Some("Milk"), 15)
        .await
        .expect("Failed to list todos");

    let titles: Vec<&str> = todos.iter().map(|todo| todo.title.as_str()).collect();
    assert_yaml_snapshot!(titles, @r"
    - Oat milk for Bob
    - Buy MILK
    ");
}

#[tokio::test]
async fn can_search_non_ascii_titles_case_insensitively() {
    let state = setup().await.expect("Failed to setup test context");
    let user = create_user(&state.db, "alice").await.expect("Failed to create user");
    let now = Utc::now();
    insert_todo(&state.db, user.id(), "Über Milch", now - TimeDelta::minutes(2)).await;
    insert_todo(&state.db, user.id(), "ÉCOLE run", now - TimeDelta::minutes(1)).await;
    let service = TodoService::new(&state.db);

    for search in ["Über", "über", "ÜBER MILCH"] {
        let todos = service
            .list_todos(user.id(), Some(search), 15)
            .await
            .expect("Failed to list todos");
        let titles: Vec<&str> = todos.iter().map(|todo| todo.title.as_str()).collect();
        assert_eq!(titles, vec!["Über Milch"], "search {search:?}");
    }

    let todos = service
        .list_todos(user.id(), Some("école"), 15)
        .await
        .expect("Failed to list todos");
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "ÉCOLE run");
}

#[tokio::test]
async fn can_cap_search_results_across_pages() {
    let state = setup().await.expect("Failed to setup test context");
    let user = create_user(&state.db, "alice").await.expect("Failed to create user");
    let now = Utc::now();
    for minutes in 0..150 {
        let title = if minutes % 2 == 0 { "Milk" } else { "Bread" };
        insert_todo(&state.db, user.id(), title, now - TimeDelta::minutes(minutes)).await;
    }

    let service = TodoService::new(&state.db);
    let capped = service
        .list_todos(user.id(), Some("milk"), 15)
        .await
        .expect("Failed to list todos");
    assert_eq!(capped.len(), 15);
    assert!(capped.iter().all(|todo| todo.title == "Milk"));
    assert!(capped.windows(2).all(|pair| pair[0].created_at > pair[1].created_at));

    let all = service
        .list_todos(user.id(), Some("milk"), 1000)
        .await
        .expect("Failed to list todos");
    assert_eq!(all.len(), 75);
}

#[tokio::test]
async fn can_match_like_wildcards_literally() {
    let state = setup().await.expect("Failed to setup test context");
    let user = create_user(&state.db, "alice").await.expect("Failed to create user");
    let now = Utc::now();
    insert_todo(&state.db, user.id(), "100% done", now - TimeDelta::minutes(1)).await;
    insert_todo(&state.db, user.id(), "1000 things", now).await;

    let todos = TodoService::new(&state.db)
        .list_todos(user.id(), Some("0%"), 15)
        .await
        .expect("Failed to list todos");

    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "100% done");
}

#[tokio::test]
async fn can_cap_list_at_limit() {
    let state = setup().await.expect("Failed to setup test context");
    let user = create_user(&state.db, "alice").await.expect("Failed to create user");
    let now = Utc::now();
    for minutes in 0..5 {
        insert_todo(
            &state.db,
            user.id(),
            &format!("Todo {minutes}"),
            now - TimeDelta::minutes(minutes),
        )
        .await;
    }

    let todos = TodoService::new(&state.db)
        .list_todos(user.id(), None, 3)
        .await
        .expect("Failed to list todos");

    let titles: Vec<&str> = todos.iter().map(|todo| todo.title.as_str()).collect();
    assert_yaml_snapshot!(titles, @r"
    - Todo 0
    - Todo 1
    - Todo 2
    ");
}
