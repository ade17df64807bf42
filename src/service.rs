use std::collections::BTreeSet;

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::{debug, info, instrument, warn};

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::{
        DirectorSummary, GenreSummary, ListMoviesQuery, MovieCreate, MovieFields, MovieResponse,
        MovieUpdate, Page, PageRequest, RatingResponse,
    },
    repository::MovieRepository,
};

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 10;

#[derive(Clone, Copy, Debug)]
pub struct PageLimits {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self { default_page_size: 10, max_page_size: 100 }
    }
}

/// Business rules over the catalog. Every write runs in a single transaction
/// that also covers its validation reads and the response read-back.
#[derive(Clone)]
pub struct MovieService {
    db: DatabaseConnection,
    limits: PageLimits,
}

impl MovieService {
    pub fn new(db: DatabaseConnection, limits: PageLimits) -> Self {
        Self { db, limits }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// One page of movies with rating stats. An empty page is a success and
    /// `total` counts every movie regardless of the filters.
    #[instrument(skip(self, query), fields(page = ?query.page, page_size = ?query.page_size))]
    pub async fn list_movies(&self, query: &ListMoviesQuery) -> AppResult<Page<MovieResponse>> {
        let page = PageRequest::resolve(
            query.page,
            query.page_size,
            self.limits.default_page_size,
            self.limits.max_page_size,
        )?;
        let filter = query.filter();
        let repo = MovieRepository::new(&self.db);

        let movies = repo.list_movies(page.offset(), page.page_size, &filter).await?;
        let total = repo.count_movies().await?;

        let mut items = Vec::with_capacity(movies.len());
        for m in movies {
            items.push(describe(&repo, m).await?);
        }
        debug!(returned = items.len(), total, ?filter, "listed movies");

        Ok(Page { items, total, page: page.page, page_size: page.page_size })
    }

    #[instrument(skip(self))]
    pub async fn get_movie_detail(&self, id: i32) -> AppResult<MovieResponse> {
        let repo = MovieRepository::new(&self.db);
        let movie = repo.get_movie_by_id(id).await?.ok_or_else(|| AppError::movie_not_found(id))?;
        describe(&repo, movie).await
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_movie(&self, input: &MovieCreate) -> AppResult<MovieResponse> {
        let fields = input.fields();
        let txn = self.db.begin().await?;
        let repo = MovieRepository::new(&txn);

        validate_fields(&repo, &fields).await?;
        let genre_ids = resolve_genres(&repo, &input.genres).await?;

        let movie = repo.create_movie(&fields, &genre_ids).await?;
        let resp = describe(&repo, movie).await?;
        txn.commit().await?;

        info!(id = resp.id, genres = genre_ids.len(), "created movie");
        Ok(resp)
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn update_movie(&self, id: i32, input: &MovieUpdate) -> AppResult<MovieResponse> {
        let fields = input.fields();
        let txn = self.db.begin().await?;
        let repo = MovieRepository::new(&txn);

        if repo.get_movie_by_id(id).await?.is_none() {
            warn!(id, "update of unknown movie");
            return Err(AppError::movie_not_found(id));
        }
        validate_fields(&repo, &fields).await?;
        let genre_ids = match &input.genres {
            Some(ids) => Some(resolve_genres(&repo, ids).await?),
            None => None,
        };

        let movie = repo
            .update_movie(id, &fields, genre_ids.as_deref())
            .await?
            .ok_or_else(|| AppError::movie_not_found(id))?;
        let resp = describe(&repo, movie).await?;
        txn.commit().await?;

        info!(id, "updated movie");
        Ok(resp)
    }

    #[instrument(skip(self))]
    pub async fn delete_movie(&self, id: i32) -> AppResult<()> {
        let deleted = MovieRepository::new(&self.db).delete_movie(id).await?;
        if !deleted {
            warn!(id, "delete of unknown movie");
            return Err(AppError::movie_not_found(id));
        }
        info!(id, "deleted movie");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn add_rating(&self, movie_id: i32, score: i32) -> AppResult<RatingResponse> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(AppError::Validation(format!(
                "score must be between {MIN_SCORE} and {MAX_SCORE}"
            )));
        }

        let txn = self.db.begin().await?;
        let repo = MovieRepository::new(&txn);
        if repo.get_movie_by_id(movie_id).await?.is_none() {
            return Err(AppError::movie_not_found(movie_id));
        }
        let rating = repo.add_rating(movie_id, score).await?;
        txn.commit().await?;

        info!(movie_id, rating_id = rating.id, "rated movie");
        Ok(rating.into())
    }

    pub async fn list_genres(&self) -> AppResult<Vec<GenreSummary>> {
        let genres = MovieRepository::new(&self.db).list_genres().await?;
        Ok(genres.into_iter().map(Into::into).collect())
    }

    pub async fn list_directors(&self) -> AppResult<Vec<DirectorSummary>> {
        let directors = MovieRepository::new(&self.db).list_directors().await?;
        Ok(directors.into_iter().map(Into::into).collect())
    }
}

async fn describe<C>(repo: &MovieRepository<'_, C>, movie: movie::Model) -> AppResult<MovieResponse>
where
    C: ConnectionTrait + TransactionTrait,
{
    let director = repo.get_director_by_id(movie.director_id).await?;
    let genres = repo.get_genres_for_movie(&movie).await?;
    let stats = repo.get_rating_stats(movie.id).await?;
    Ok(MovieResponse::new(movie, director, genres, stats))
}

async fn validate_fields<C>(repo: &MovieRepository<'_, C>, fields: &MovieFields) -> AppResult<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    if fields.title.is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }
    if repo.get_director_by_id(fields.director_id).await?.is_none() {
        return Err(AppError::Validation(format!("invalid director id: {}", fields.director_id)));
    }
    Ok(())
}

/// Deduplicates the requested ids and fails unless every one names a genre.
async fn resolve_genres<C>(repo: &MovieRepository<'_, C>, requested: &[i32]) -> AppResult<Vec<i32>>
where
    C: ConnectionTrait + TransactionTrait,
{
    let wanted: Vec<i32> = requested.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    let found = repo.get_genres_by_ids(&wanted).await?;
    if found.len() == wanted.len() {
        return Ok(wanted);
    }

    let missing: Vec<String> = wanted
        .iter()
        .filter(|id| !found.iter().any(|g| g.id == **id))
        .map(i32::to_string)
        .collect();
    Err(AppError::Validation(format!("invalid genre ids: {}", missing.join(", "))))
}
