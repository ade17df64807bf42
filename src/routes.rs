use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::{
    AppState,
    error::AppResult,
    models::{
        ApiResponse, DeletedResponse, DirectorSummary, GenreSummary, ListMoviesQuery, MovieCreate,
        MovieResponse, MovieUpdate, Page, RatingCreate, RatingResponse,
    },
};

type Envelope<T> = Json<ApiResponse<T>>;

pub async fn index() -> Json<Value> {
    Json(json!({ "message": "Welcome to Movie Rating API" }))
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListMoviesQuery>, QueryRejection>,
) -> AppResult<Envelope<Page<MovieResponse>>> {
    let Query(query) = query?;
    let page = state.movies.list_movies(&query).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<Envelope<MovieResponse>> {
    let Path(id) = id?;
    let movie = state.movies.get_movie_detail(id).await?;
    Ok(Json(ApiResponse::success(movie)))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    body: Result<Json<MovieCreate>, JsonRejection>,
) -> AppResult<(StatusCode, Envelope<MovieResponse>)> {
    let Json(input) = body?;
    let movie = state.movies.create_movie(&input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(movie))))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<MovieUpdate>, JsonRejection>,
) -> AppResult<Envelope<MovieResponse>> {
    let Path(id) = id?;
    let Json(input) = body?;
    let movie = state.movies.update_movie(id, &input).await?;
    Ok(Json(ApiResponse::success(movie)))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<Envelope<DeletedResponse>> {
    let Path(id) = id?;
    state.movies.delete_movie(id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse { id })))
}

pub async fn add_rating(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<RatingCreate>, JsonRejection>,
) -> AppResult<(StatusCode, Envelope<RatingResponse>)> {
    let Path(id) = id?;
    let Json(input) = body?;
    let rating = state.movies.add_rating(id, input.score).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(rating))))
}

pub async fn list_genres(State(state): State<Arc<AppState>>) -> AppResult<Envelope<Vec<GenreSummary>>> {
    Ok(Json(ApiResponse::success(state.movies.list_genres().await?)))
}

pub async fn list_directors(
    State(state): State<Arc<AppState>>,
) -> AppResult<Envelope<Vec<DirectorSummary>>> {
    Ok(Json(ApiResponse::success(state.movies.list_directors().await?)))
}
