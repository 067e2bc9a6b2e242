// tests/crud_tests.rs

mod common;

use common::{question, spawn_app};
use serde_json::{Value, json};

#[tokio::test]
async fn unknown_model_is_rejected_before_any_work() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let response = app.get(&admin, "/api/admin/widgets").await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unknown model 'widgets'");

    let response = app.post(&admin, "/api/admin/widgets", &json!({ "name": "x" })).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn create_list_and_search() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    for name in ["Physics", "Chemistry", "Physical Education"] {
        app.create(&admin, "branches", json!({ "name": name })).await;
    }

    let all: Vec<Value> = app.get(&admin, "/api/admin/branch").await.json().await.unwrap();
    assert_eq!(all.len(), 3);

    let found: Vec<Value> = app
        .get(&admin, "/api/admin/branches?q=PHYSIC")
        .await
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = found.iter().map(|b| b["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Physics", "Physical Education"]);

    let empty: Vec<Value> = app
        .get(&admin, "/api/admin/branches?q=")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(empty.len(), 3);
}

#[tokio::test]
async fn search_query_is_matched_verbatim() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    app.create(&admin, "branches", json!({ "name": "Physics" })).await;

    let found: Vec<Value> = app
        .get(&admin, "/api/admin/branches?q=Physics%20")
        .await
        .json()
        .await
        .unwrap();
    assert!(found.is_empty());

    let found: Vec<Value> = app
        .get(&admin, "/api/admin/branches?q=%20")
        .await
        .json()
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn fields_endpoint_describes_the_allow_list() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let fields: Vec<Value> = app
        .get(&admin, "/api/admin/quiz/fields")
        .await
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = fields.iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec!["name", "chapter_id", "subject_id", "question_count", "time_limit"]
    );
    assert_eq!(fields[2]["derived"], true);
}

#[tokio::test]
async fn invalid_create_leaves_no_trace() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let response = app
        .post(
            &admin,
            "/api/admin/branches",
            &json!({ "name": "Arts", "is_admin": true, "motto": "x" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["is_admin", "motto"]);
    assert_eq!(app.count("branches").await, 0);

    let response = app
        .post(&admin, "/api/admin/subjects", &json!({ "name": "Orphan", "branch_id": 99 }))
        .await;
    assert_eq!(response.status().as_u16(), 422);
    assert_eq!(app.count("subjects").await, 0);
}

#[tokio::test]
async fn duplicate_names_are_rejected_case_insensitively() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let id = app.create(&admin, "branches", json!({ "name": "Science" })).await;

    let response = app
        .post(&admin, "/api/admin/branches", &json!({ "name": "SCIENCE" }))
        .await;
    assert_eq!(response.status().as_u16(), 422);

    // Renaming a record to its own name is not a clash.
    let response = app
        .put(&admin, &format!("/api/admin/branches/{id}"), &json!({ "name": "science" }))
        .await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn quiz_subject_follows_its_chapter() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let catalog = app.seed_catalog(&admin).await;

    let quiz: Value = app
        .get(&admin, &format!("/api/admin/quizzes/{}", catalog.quiz_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(quiz["subject_id"], catalog.subject_id);
    assert_eq!(quiz["time_limit"], 600);

    // The derived field cannot be written directly.
    let response = app
        .put(
            &admin,
            &format!("/api/admin/quizzes/{}", catalog.quiz_id),
            &json!({ "subject_id": catalog.subject_id }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);

    // Moving the chapter to another subject carries its quizzes along.
    let physics = app
        .create(&admin, "subjects", json!({ "name": "Physics", "branch_id": catalog.branch_id }))
        .await;
    let response = app
        .patch(
            &admin,
            &format!("/api/admin/chapters/{}", catalog.chapter_id),
            &json!({ "subject_id": physics }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let quiz_subject: i64 = sqlx::query_scalar("SELECT subject_id FROM quizzes WHERE id = ?")
        .bind(catalog.quiz_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(quiz_subject, physics);
}

#[tokio::test]
async fn moving_a_quiz_to_another_chapter_rederives_its_subject() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let catalog = app.seed_catalog(&admin).await;

    let biology = app
        .create(&admin, "subjects", json!({ "name": "Biology", "branch_id": catalog.branch_id }))
        .await;
    let cells = app
        .create(&admin, "chapters", json!({ "name": "Cells", "subject_id": biology }))
        .await;

    let quiz: Value = app
        .patch(
            &admin,
            &format!("/api/admin/quiz/{}", catalog.quiz_id),
            &json!({ "chapter_id": cells }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(quiz["chapter_id"], cells);
    assert_eq!(quiz["subject_id"], biology);
}

#[tokio::test]
async fn edit_merges_with_stored_values() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let catalog = app.seed_catalog(&admin).await;

    let updated: Value = app
        .put(
            &admin,
            &format!("/api/admin/questions/{}", catalog.q1),
            &json!({ "marks": "7" }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(updated["marks"], 7);
    assert_eq!(updated["question_text"], "What is 1 + 1?");

    // Merged record still has to pass the full form.
    let response = app
        .put(
            &admin,
            &format!("/api/admin/questions/{}", catalog.q1),
            &json!({ "option3": "2" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"][0]["field"], "option3");
}

#[tokio::test]
async fn prose_fields_are_sanitized() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let catalog = app.seed_catalog(&admin).await;

    let mut body = question(catalog.quiz_id, "<b>Bold</b><script>alert(1)</script>", 1, 1);
    body["option1"] = json!("yes");
    let id = app.create(&admin, "questions", body).await;

    let stored: Value = app
        .get(&admin, &format!("/api/admin/questions/{id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stored["question_text"], "<b>Bold</b>");
}

#[tokio::test]
async fn inline_edit_checks_references_and_allow_list() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let catalog = app.seed_catalog(&admin).await;

    let response = app
        .patch(
            &admin,
            &format!("/api/admin/subjects/{}", catalog.subject_id),
            &json!({ "branch_id": 999 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);

    app.register("eve@example.com", Some(catalog.branch_id)).await;
    let eve: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = 'eve@example.com'")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let response = app
        .patch(&admin, &format!("/api/admin/users/{eve}"), &json!({ "is_admin": true }))
        .await;
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["fields"],
        json!([{ "field": "is_admin", "reason": "cannot be edited inline" }])
    );

    let is_admin: bool = sqlx::query_scalar("SELECT is_admin FROM users WHERE id = ?")
        .bind(eve)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert!(!is_admin);

    let response = app
        .patch(&admin, &format!("/api/admin/subjects/{}", catalog.subject_id), &json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn delete_is_refused_while_referenced() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let catalog = app.seed_catalog(&admin).await;

    let response = app
        .delete(&admin, &format!("/api/admin/branches/{}", catalog.branch_id))
        .await;
    assert_eq!(response.status().as_u16(), 409);
    assert_eq!(app.count("branches").await, 1);

    let response = app
        .delete(&admin, &format!("/api/admin/quizzes/{}", catalog.quiz_id))
        .await;
    assert_eq!(response.status().as_u16(), 409);

    for id in [catalog.q1, catalog.q2] {
        let response = app.delete(&admin, &format!("/api/admin/questions/{id}")).await;
        assert_eq!(response.status().as_u16(), 204);
    }
    let response = app
        .delete(&admin, &format!("/api/admin/quizzes/{}", catalog.quiz_id))
        .await;
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .delete(&admin, &format!("/api/admin/quizzes/{}", catalog.quiz_id))
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn admins_cannot_delete_themselves() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let admin_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE is_admin = 1")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let response = app.delete(&admin, &format!("/api/admin/users/{admin_id}")).await;
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.count("users").await, 1);
}

#[tokio::test]
async fn admin_can_create_users_with_hashed_passwords() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let id = app
        .create(
            &admin,
            "users",
            json!({
                "username": "staff@example.com",
                "password": "staff-password",
                "name": "Staff",
                "email": "staff@example.com",
                "dob": "1985-03-01",
                "is_admin": "on"
            }),
        )
        .await;

    let user: Value = app
        .get(&admin, &format!("/api/admin/users/{id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(user["is_admin"], true);
    assert!(user.get("password").is_none());

    let token = app.login("staff@example.com", "staff-password").await;
    assert_eq!(app.get(&token, "/api/admin/branches").await.status().as_u16(), 200);
}

#[tokio::test]
async fn blank_time_limit_stores_the_default() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let catalog = app.seed_catalog(&admin).await;
    let path = format!("/api/admin/quizzes/{}", catalog.quiz_id);

    let response = app.put(&admin, &path, &json!({ "time_limit": "" })).await;
    assert_eq!(response.status().as_u16(), 200);
    let quiz: Value = response.json().await.unwrap();
    assert_eq!(quiz["time_limit"], 0);

    app.patch(&admin, &path, &json!({ "time_limit": 90 })).await;
    let response = app.patch(&admin, &path, &json!({ "time_limit": null })).await;
    assert_eq!(response.status().as_u16(), 200);
    let quiz: Value = response.json().await.unwrap();
    assert_eq!(quiz["time_limit"], 0);

    let created: Value = app
        .post(
            &admin,
            "/api/admin/quizzes",
            &json!({ "name": "Untimed", "chapter_id": catalog.chapter_id, "question_count": 1, "time_limit": "" }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(created["time_limit"], 0);

    let response = app.patch(&admin, &path, &json!({ "time_limit": -5 })).await;
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn rejected_edit_leaves_the_stored_record_untouched() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let catalog = app.seed_catalog(&admin).await;

    let response = app
        .put(
            &admin,
            &format!("/api/admin/subjects/{}", catalog.subject_id),
            &json!({ "name": "Renamed", "branch_id": 999 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"][0]["field"], "branch_id");

    let (name, branch_id): (String, i64) =
        sqlx::query_as("SELECT name, branch_id FROM subjects WHERE id = ?")
            .bind(catalog.subject_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(name, "Mathematics");
    assert_eq!(branch_id, catalog.branch_id);
}

#[tokio::test]
async fn subject_with_quizzes_cannot_be_deleted() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let catalog = app.seed_catalog(&admin).await;

    // Only the quiz still points at the subject once the chapter moves away.
    let physics = app
        .create(&admin, "subjects", json!({ "name": "Physics", "branch_id": catalog.branch_id }))
        .await;
    sqlx::query("UPDATE chapters SET subject_id = ? WHERE id = ?")
        .bind(physics)
        .bind(catalog.chapter_id)
        .execute(&app.pool)
        .await
        .unwrap();

    let response = app
        .delete(&admin, &format!("/api/admin/subjects/{}", catalog.subject_id))
        .await;
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("quiz(zes)"));

    let subject: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subjects WHERE id = ?")
        .bind(catalog.subject_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let quiz: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE subject_id = ?")
        .bind(catalog.subject_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!((subject, quiz), (1, 1));
}
