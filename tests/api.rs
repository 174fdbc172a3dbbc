use actix_web::{test, web, App};
use diesel_migrations::MigrationHarness;
use tempfile::TempDir;

use vitrola::db::{self, DbPool};
use vitrola::routes;
use vitrola::storage::BlobStore;

struct TestServer {
    pool: DbPool,
    store: BlobStore,
    _dirs: (TempDir, TempDir),
}

fn test_server() -> TestServer {
    let db_dir = TempDir::new().unwrap();
    let db_path = db_dir.path().join("library.db");
    let pool = db::build_pool(db_path.to_str().unwrap()).unwrap();
    pool.get()
        .unwrap()
        .run_pending_migrations(db::MIGRATIONS)
        .unwrap();

    let blob_dir = TempDir::new().unwrap();
    let store = BlobStore::new(blob_dir.path()).unwrap();

    TestServer {
        pool,
        store,
        _dirs: (db_dir, blob_dir),
    }
}

macro_rules! init_app {
    ($srv:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($srv.pool.clone()))
                .app_data(web::Data::new($srv.store.clone()))
                .configure(routes::configure),
        )
        .await
    };
}

const BOUNDARY: &str = "----vitrola-test-boundary";

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(method: test::TestRequest, body: Vec<u8>) -> test::TestRequest {
    method
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
}

#[actix_web::test]
async fn song_create_then_attach_audio_via_update() {
    let srv = test_server();
    let app = init_app!(srv);

    // Create with metadata only: 201 with the generated id, no audio yet.
    let body = multipart_body(
        &[
            ("title", "A"),
            ("artist", "B"),
            ("duration", "00:03:30"),
            ("album_id", ""),
        ],
        None,
    );
    let resp = test::call_service(
        &app,
        multipart_request(test::TestRequest::post().uri("/songs"), body).to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let created: serde_json::Value = test::read_body_json(resp).await;
    let id = created["id"].as_i64().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/songs/{id}/audio"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);

    // Attach an mp3 through the update path.
    let body = multipart_body(
        &[("title", "A"), ("artist", "B"), ("duration", "00:03:30")],
        Some(("track.mp3", b"mp3-bytes")),
    );
    let resp = test::call_service(
        &app,
        multipart_request(test::TestRequest::put().uri(&format!("/songs/{id}")), body)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 204);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/songs/{id}/audio"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "audio/mpeg"
    );
    let audio = test::read_body(resp).await;
    assert_eq!(&audio[..], b"mp3-bytes");
}

#[actix_web::test]
async fn song_create_with_file_and_delete_cleans_everything() {
    let srv = test_server();
    let app = init_app!(srv);

    let body = multipart_body(
        &[("title", "A"), ("artist", "B")],
        Some(("song.ogg", b"ogg-bytes")),
    );
    let resp = test::call_service(
        &app,
        multipart_request(test::TestRequest::post().uri("/songs"), body).to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let created: serde_json::Value = test::read_body_json(resp).await;
    let id = created["id"].as_i64().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/songs/{id}/audio"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("content-type").unwrap(), "audio/ogg");

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/songs/{id}"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 204);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/songs/{id}"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/songs/{id}/audio"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
    assert_eq!(std::fs::read_dir(srv.store.root()).unwrap().count(), 0);
}

#[actix_web::test]
async fn song_missing_required_metadata_is_rejected() {
    let srv = test_server();
    let app = init_app!(srv);

    let body = multipart_body(&[("title", "A")], Some(("track.mp3", b"bytes")));
    let resp = test::call_service(
        &app,
        multipart_request(test::TestRequest::post().uri("/songs"), body).to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);
    // The staged upload must not linger after the rejection.
    assert_eq!(std::fs::read_dir(srv.store.root()).unwrap().count(), 0);
}

#[actix_web::test]
async fn song_list_carries_album_and_favorite_flag() {
    let srv = test_server();
    let app = init_app!(srv);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/albums")
            .set_json(serde_json::json!({ "title": "LP", "release_year": 1999 }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let album: serde_json::Value = test::read_body_json(resp).await;
    let album_id = album["id"].as_i64().unwrap();

    let body = multipart_body(
        &[("title", "A"), ("artist", "B"), ("album_id", &album_id.to_string())],
        None,
    );
    let resp = test::call_service(
        &app,
        multipart_request(test::TestRequest::post().uri("/songs"), body).to_request(),
    )
    .await;
    let created: serde_json::Value = test::read_body_json(resp).await;
    let song_id = created["id"].as_i64().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/users")
            .set_json(serde_json::json!({
                "name": "fan", "email": "fan@example.com", "password": "pw"
            }))
            .to_request(),
    )
    .await;
    let user: serde_json::Value = test::read_body_json(resp).await;
    let user_id = user["id"].as_i64().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/favorites")
            .set_json(serde_json::json!({ "user_id": user_id, "song_id": song_id }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/songs?userId={user_id}"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let list: serde_json::Value = test::read_body_json(resp).await;
    let songs = list.as_array().unwrap();
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0]["album_title"], "LP");
    assert_eq!(songs[0]["album_release_year"], 1999);
    assert_eq!(songs[0]["isFavorited"], true);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/songs/{song_id}"))
            .to_request(),
    )
    .await;
    let song: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(song["isFavorited"], false);
}

#[actix_web::test]
async fn album_delete_cascades_to_songs_and_their_audio() {
    let srv = test_server();
    let app = init_app!(srv);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/albums")
            .set_json(serde_json::json!({ "title": "LP" }))
            .to_request(),
    )
    .await;
    let album: serde_json::Value = test::read_body_json(resp).await;
    let album_id = album["id"].as_i64().unwrap();

    let mut song_ids = Vec::new();
    for n in 0..2 {
        let title = format!("track {n}");
        let body = multipart_body(
            &[
                ("title", &title),
                ("artist", "B"),
                ("album_id", &album_id.to_string()),
            ],
            Some(("track.mp3", b"bytes")),
        );
        let resp = test::call_service(
            &app,
            multipart_request(test::TestRequest::post().uri("/songs"), body).to_request(),
        )
        .await;
        let created: serde_json::Value = test::read_body_json(resp).await;
        song_ids.push(created["id"].as_i64().unwrap());
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/albums/{album_id}"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 204);

    for id in song_ids {
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/songs/{id}")).to_request(),
        )
        .await;
        assert_eq!(resp.status(), 404);
    }
    assert_eq!(std::fs::read_dir(srv.store.root()).unwrap().count(), 0);
}

#[actix_web::test]
async fn duplicate_favorite_conflicts_and_first_survives() {
    let srv = test_server();
    let app = init_app!(srv);

    let body = multipart_body(&[("title", "A"), ("artist", "B")], None);
    let resp = test::call_service(
        &app,
        multipart_request(test::TestRequest::post().uri("/songs"), body).to_request(),
    )
    .await;
    let created: serde_json::Value = test::read_body_json(resp).await;
    let song_id = created["id"].as_i64().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/users")
            .set_json(serde_json::json!({
                "name": "fan", "email": "fan@example.com", "password": "pw"
            }))
            .to_request(),
    )
    .await;
    let user: serde_json::Value = test::read_body_json(resp).await;
    let user_id = user["id"].as_i64().unwrap();

    let favorite = serde_json::json!({ "user_id": user_id, "song_id": song_id });
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/favorites")
            .set_json(&favorite)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let first: serde_json::Value = test::read_body_json(resp).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/favorites")
            .set_json(&favorite)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 409);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/favorites/{}", first["id"].as_i64().unwrap()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn login_never_returns_the_password() {
    let srv = test_server();
    let app = init_app!(srv);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/users")
            .set_json(serde_json::json!({
                "name": "ana", "email": "ana@example.com", "password": "pw"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/users/login")
            .set_json(serde_json::json!({ "name": "ana", "password": "pw" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let user: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(user["name"], "ana");
    assert!(user.get("password").is_none());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/users/login")
            .set_json(serde_json::json!({ "name": "ana", "password": "wrong" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn duplicate_user_email_conflicts() {
    let srv = test_server();
    let app = init_app!(srv);

    let payload = serde_json::json!({
        "name": "ana", "email": "ana@example.com", "password": "pw"
    });
    let resp = test::call_service(
        &app,
        test::TestRequest::post().uri("/users").set_json(&payload).to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let resp = test::call_service(
        &app,
        test::TestRequest::post().uri("/users").set_json(&payload).to_request(),
    )
    .await;
    assert_eq!(resp.status(), 409);
}
