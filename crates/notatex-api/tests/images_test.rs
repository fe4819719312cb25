//! Image upload and listing integration tests.
//!
//! Run with: `TEST_DATABASE_URL=postgres://... cargo test -p notatex-api --test images_test`

mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use helpers::{bearer, register_and_login, setup_test_app, upload_png};
use notatex_db::ImageRepository;

#[tokio::test]
async fn test_upload_requires_auth() {
    let Some(app) = setup_test_app().await else {
        return;
    };

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"123".to_vec())
            .file_name("note.png")
            .mime_type("image/png"),
    );

    let response = app.server.post("/api/v0/images").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_single_image_and_list() {
    let Some(app) = setup_test_app().await else {
        return;
    };
    let account = register_and_login(&app.server).await;

    let image_id = upload_png(&app.server, &account.token, "note.png", b"PNGDATA").await;

    let response = app
        .server
        .get("/api/v0/images")
        .add_header("Authorization", bearer(&account.token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["count"].as_u64(), Some(1));
    assert_eq!(body["limit"].as_i64(), Some(50));
    assert_eq!(body["offset"].as_i64(), Some(0));
    let images = body["images"].as_array().expect("images");
    assert_eq!(images[0]["id"].as_i64(), Some(image_id));
    assert!(images[0]["file_path"]
        .as_str()
        .expect("file_path")
        .ends_with("/note.png"));
}

#[tokio::test]
async fn test_upload_rejects_empty_file_and_bad_extension() {
    let Some(app) = setup_test_app().await else {
        return;
    };
    let account = register_and_login(&app.server).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(Vec::new())
            .file_name("empty.png")
            .mime_type("image/png"),
    );
    let response = app
        .server
        .post("/api/v0/images")
        .add_header("Authorization", bearer(&account.token))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"MZ".to_vec())
            .file_name("note.exe")
            .mime_type("image/png"),
    );
    let response = app
        .server
        .post("/api/v0/images")
        .add_header("Authorization", bearer(&account.token))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_missing_file_field() {
    let Some(app) = setup_test_app().await else {
        return;
    };
    let account = register_and_login(&app.server).await;

    let form = MultipartForm::new().add_part(
        "attachment",
        Part::bytes(b"123".to_vec())
            .file_name("note.png")
            .mime_type("image/png"),
    );
    let response = app
        .server
        .post("/api/v0/images")
        .add_header("Authorization", bearer(&account.token))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_upload_shares_one_batch_id() {
    let Some(app) = setup_test_app().await else {
        return;
    };
    let account = register_and_login(&app.server).await;

    let form = MultipartForm::new()
        .add_part(
            "files",
            Part::bytes(b"X".to_vec())
                .file_name("x.png")
                .mime_type("image/png"),
        )
        .add_part(
            "files",
            Part::bytes(b"Y".to_vec())
                .file_name("y.png")
                .mime_type("image/png"),
        );

    let response = app
        .server
        .post("/api/v0/images/batch?batch_name=notes")
        .add_header("Authorization", bearer(&account.token))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    let batch_id = body["batch_id"].as_i64().expect("batch_id");
    let items = body["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);

    let first_id = items[0]["image_id"].as_i64().expect("image_id");
    let second_id = items[1]["image_id"].as_i64().expect("image_id");

    // Listing by that batch returns exactly those two, newest first
    // (uploaded_at ties within the transaction break by id descending).
    let response = app
        .server
        .get(&format!("/api/v0/images?batch_id={}", batch_id))
        .add_header("Authorization", bearer(&account.token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["count"].as_u64(), Some(2));
    assert_eq!(body["batch_id"].as_i64(), Some(batch_id));
    let listed: Vec<i64> = body["images"]
        .as_array()
        .expect("images")
        .iter()
        .map(|image| image["id"].as_i64().expect("id"))
        .collect();
    assert_eq!(listed, vec![second_id, first_id]);
}

#[tokio::test]
async fn test_batch_upload_without_name_has_no_batch() {
    let Some(app) = setup_test_app().await else {
        return;
    };
    let account = register_and_login(&app.server).await;

    let form = MultipartForm::new().add_part(
        "files",
        Part::bytes(b"A".to_vec())
            .file_name("a.png")
            .mime_type("image/png"),
    );

    let response = app
        .server
        .post("/api/v0/images/batch")
        .add_header("Authorization", bearer(&account.token))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert!(body["batch_id"].is_null());
    assert_eq!(body["items"].as_array().expect("items").len(), 1);
}

#[tokio::test]
async fn test_batch_upload_rejects_empty_file_set() {
    let Some(app) = setup_test_app().await else {
        return;
    };
    let account = register_and_login(&app.server).await;

    let form = MultipartForm::new().add_text("unrelated", "value");
    let response = app
        .server
        .post("/api/v0/images/batch")
        .add_header("Authorization", bearer(&account.token))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_pagination_bounds_rejected() {
    let Some(app) = setup_test_app().await else {
        return;
    };
    let account = register_and_login(&app.server).await;

    for query in ["limit=0", "limit=201", "limit=-5", "offset=-1"] {
        let response = app
            .server
            .get(&format!("/api/v0/images?{}", query))
            .add_header("Authorization", bearer(&account.token))
            .await;
        assert_eq!(
            response.status_code(),
            StatusCode::BAD_REQUEST,
            "query {} should be rejected",
            query
        );
    }
}

#[tokio::test]
async fn test_listing_never_crosses_accounts() {
    let Some(app) = setup_test_app().await else {
        return;
    };
    let owner = register_and_login(&app.server).await;
    let other = register_and_login(&app.server).await;

    upload_png(&app.server, &owner.token, "private.png", b"SECRET").await;

    let response = app
        .server
        .get("/api/v0/images")
        .add_header("Authorization", bearer(&other.token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["count"].as_u64(), Some(0));
}

#[tokio::test]
async fn test_resolve_is_input_order_independent() {
    let Some(app) = setup_test_app().await else {
        return;
    };
    let account = register_and_login(&app.server).await;

    let first = upload_png(&app.server, &account.token, "p1.png", b"one").await;
    let second = upload_png(&app.server, &account.token, "p2.png", b"two").await;

    let repo = ImageRepository::new(app.pool.clone());
    let forward = repo
        .resolve_for_account(account.account_id, &[first, second])
        .await
        .expect("resolve");
    let reversed = repo
        .resolve_for_account(account.account_id, &[second, first])
        .await
        .expect("resolve");

    let forward_ids: Vec<i64> = forward.iter().map(|image| image.id).collect();
    let reversed_ids: Vec<i64> = reversed.iter().map(|image| image.id).collect();
    assert_eq!(forward_ids, reversed_ids);
    assert_eq!(forward_ids, vec![first, second]);

    // Ids owned by someone else silently drop out.
    let other = register_and_login(&app.server).await;
    let cross = repo
        .resolve_for_account(other.account_id, &[first, second])
        .await
        .expect("resolve");
    assert!(cross.is_empty());
}
