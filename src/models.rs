use serde::{Deserialize, Serialize};

use crate::{
    entities::{director, genre, movie, rating},
    error::{AppError, AppResult},
};

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { status: "success", data }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMoviesQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub title: Option<String>,
    pub release_year: Option<i32>,
    pub genre: Option<String>,
}

impl ListMoviesQuery {
    pub fn filter(&self) -> MovieFilter {
        MovieFilter {
            title: non_empty(self.title.as_deref()),
            release_year: self.release_year,
            genre: non_empty(self.genre.as_deref()),
        }
    }
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Predicates for listing movies; `None` matches everything on that dimension.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovieFilter {
    pub title: Option<String>,
    pub release_year: Option<i32>,
    pub genre: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page index
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Resolves optional query values against the configured limits.
    pub fn resolve(
        page: Option<u64>,
        page_size: Option<u64>,
        default_page_size: u64,
        max_page_size: u64,
    ) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(default_page_size);
        if page < 1 {
            return Err(AppError::Validation("page must be at least 1".into()));
        }
        if page_size < 1 {
            return Err(AppError::Validation("pageSize must be at least 1".into()));
        }
        let page_size = page_size.min(max_page_size);
        // The store binds offsets as signed 64-bit integers.
        let in_range = (page - 1).checked_mul(page_size).is_some_and(|o| o <= i64::MAX as u64);
        if !in_range {
            return Err(AppError::Validation("page is out of range".into()));
        }
        Ok(Self { page, page_size })
    }

    pub fn offset(self) -> u64 {
        (self.page - 1) * self.page_size
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

/// Scalar movie columns as written by create and update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovieFields {
    pub title: String,
    pub release_year: i32,
    pub cast: String,
    pub director_id: i32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieCreate {
    pub title: String,
    pub release_year: i32,
    pub cast: String,
    pub director_id: i32,
    pub genres: Vec<i32>,
}

/// Full replace of a movie's scalars. Omitting `genres` keeps the current set.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieUpdate {
    pub title: String,
    pub release_year: i32,
    pub cast: String,
    pub director_id: i32,
    #[serde(default)]
    pub genres: Option<Vec<i32>>,
}

impl MovieCreate {
    pub fn fields(&self) -> MovieFields {
        MovieFields {
            title: self.title.trim().to_string(),
            release_year: self.release_year,
            cast: self.cast.clone(),
            director_id: self.director_id,
        }
    }
}

impl MovieUpdate {
    pub fn fields(&self) -> MovieFields {
        MovieFields {
            title: self.title.trim().to_string(),
            release_year: self.release_year,
            cast: self.cast.clone(),
            director_id: self.director_id,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RatingCreate {
    pub score: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirectorSummary {
    pub id: i32,
    pub name: String,
}

impl From<director::Model> for DirectorSummary {
    fn from(m: director::Model) -> Self {
        Self { id: m.id, name: m.name }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenreSummary {
    pub id: i32,
    pub name: String,
}

impl From<genre::Model> for GenreSummary {
    fn from(m: genre::Model) -> Self {
        Self { id: m.id, name: m.name }
    }
}

/// Aggregate over a movie's ratings. `average` is `None` when there are no rows.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RatingStats {
    pub average: Option<f64>,
    pub count: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieResponse {
    pub id: i32,
    pub title: String,
    pub release_year: i32,
    pub cast: String,
    pub director_id: i32,
    pub director: Option<DirectorSummary>,
    pub genres: Vec<GenreSummary>,
    pub average_rating: f64,
    pub ratings_count: u64,
}

impl MovieResponse {
    pub fn new(
        movie: movie::Model,
        director: Option<director::Model>,
        genres: Vec<genre::Model>,
        stats: RatingStats,
    ) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            release_year: movie.release_year,
            cast: movie.cast,
            director_id: movie.director_id,
            director: director.map(Into::into),
            genres: genres.into_iter().map(Into::into).collect(),
            average_rating: stats.average.unwrap_or(0.0),
            ratings_count: stats.count,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub id: i32,
    pub movie_id: i32,
    pub score: i32,
}

impl From<rating::Model> for RatingResponse {
    fn from(m: rating::Model) -> Self {
        Self { id: m.id, movie_id: m.movie_id, score: m.score }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DeletedResponse {
    pub id: i32,
}
