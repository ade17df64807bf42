use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use moviedex::{
    AppState, build_router,
    db,
    service::{MovieService, PageLimits},
};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app() -> Router {
    let db = db::connect_and_migrate("sqlite::memory:").await.expect("connect");
    db::seed_defaults(&db).await.expect("seed");

    let limits = PageLimits { default_page_size: 10, max_page_size: 50 };
    let state = AppState { movies: MovieService::new(db, limits) };
    build_router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let res = app.clone().oneshot(req).await.expect("response");
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json body") };
    (status, json)
}

fn inception() -> Value {
    json!({
        "title": "Inception",
        "releaseYear": 2010,
        "cast": "Leonardo DiCaprio, Elliot Page",
        "directorId": 1,
        "genres": [1, 2]
    })
}

#[tokio::test]
async fn root_greets() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to Movie Rating API");
}

#[tokio::test]
async fn create_rate_and_read_back() {
    let app = app().await;

    let (status, body) = send(&app, Method::POST, "/movies", Some(inception())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    let movie = &body["data"];
    let id = movie["id"].as_i64().expect("id");
    assert_eq!(movie["averageRating"], 0.0);
    assert_eq!(movie["ratingsCount"], 0);
    assert_eq!(movie["director"]["name"], "Christopher Nolan");
    assert_eq!(movie["genres"], json!([{ "id": 1, "name": "Action" }, { "id": 2, "name": "Sci-Fi" }]));

    let (status, body) = send(&app, Method::POST, &format!("/movies/{id}/ratings"), Some(json!({ "score": 8 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["score"], 8);
    assert_eq!(body["data"]["movieId"], id);

    send(&app, Method::POST, &format!("/movies/{id}/ratings"), Some(json!({ "score": 4 }))).await;

    let (status, body) = send(&app, Method::GET, &format!("/movies/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["averageRating"], 6.0);
    assert_eq!(body["data"]["ratingsCount"], 2);
}

#[tokio::test]
async fn out_of_range_score_is_unprocessable() {
    let app = app().await;
    let (_, body) = send(&app, Method::POST, "/movies", Some(inception())).await;
    let id = body["data"]["id"].as_i64().expect("id");

    for score in [0, 11] {
        let (status, body) =
            send(&app, Method::POST, &format!("/movies/{id}/ratings"), Some(json!({ "score": score }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "score must be between 1 and 10");
    }

    let (status, _) = send(&app, Method::POST, "/movies/999/ratings", Some(json!({ "score": 5 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_genre_rejects_create() {
    let app = app().await;
    let mut input = inception();
    input["genres"] = json!([1, 42]);

    let (status, body) = send(&app, Method::POST, "/movies", Some(input)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "invalid genre ids: 42");

    let (_, body) = send(&app, Method::GET, "/movies", None).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn put_replaces_genres() {
    let app = app().await;
    let (_, body) = send(&app, Method::POST, "/movies", Some(inception())).await;
    let id = body["data"]["id"].as_i64().expect("id");

    let mut update = inception();
    update["genres"] = json!([3]);
    update["releaseYear"] = json!(2011);
    let (status, body) = send(&app, Method::PUT, &format!("/movies/{id}"), Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["releaseYear"], 2011);
    assert_eq!(body["data"]["genres"], json!([{ "id": 3, "name": "Drama" }]));

    let (status, _) = send(&app, Method::PUT, "/movies/555", Some(inception())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = app().await;
    let (_, body) = send(&app, Method::POST, "/movies", Some(inception())).await;
    let id = body["data"]["id"].as_i64().expect("id");
    send(&app, Method::POST, &format!("/movies/{id}/ratings"), Some(json!({ "score": 9 }))).await;

    let (status, body) = send(&app, Method::DELETE, &format!("/movies/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);

    let (status, body) = send(&app, Method::GET, &format!("/movies/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("movie {id} not found"));

    let (status, _) = send(&app, Method::DELETE, &format!("/movies/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_and_paginates() {
    let app = app().await;
    for (title, year, genres) in [("Inception", 2010, json!([1, 2])), ("Interstellar", 2014, json!([2])), ("Tenet", 2020, json!([1]))] {
        let mut input = inception();
        input["title"] = json!(title);
        input["releaseYear"] = json!(year);
        input["genres"] = genres;
        let (status, _) = send(&app, Method::POST, "/movies", Some(input)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, Method::GET, "/movies?page=1&pageSize=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["pageSize"], 2);

    let (_, body) = send(&app, Method::GET, "/movies?genre=Sci-Fi&releaseYear=2014", None).await;
    let items = body["data"]["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Interstellar");

    let (_, body) = send(&app, Method::GET, "/movies?title=inter", None).await;
    assert_eq!(body["data"]["items"][0]["title"], "Interstellar");

    let (status, body) = send(&app, Method::GET, "/movies?title=zzz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"], json!([]));

    let (status, _) = send(&app, Method::GET, "/movies?page=0", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&app, Method::GET, "/movies?page=4611686018427387904&pageSize=10", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "page is out of range");
}

#[tokio::test]
async fn malformed_input_uses_error_envelope() {
    let app = app().await;

    let (status, body) = send(&app, Method::POST, "/movies", Some(json!({ "title": "No year" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "error");

    let (status, body) = send(&app, Method::GET, "/movies/abc", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn lookup_endpoints_list_seed_rows() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/genres", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(3));

    let (_, body) = send(&app, Method::GET, "/directors", None).await;
    assert_eq!(body["data"][0]["name"], "Christopher Nolan");
}
