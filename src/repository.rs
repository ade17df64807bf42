use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, ModelTrait,
    NotSet, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
};

use crate::{
    entities::{director, genre, movie, movie_genre, rating},
    models::{MovieFields, MovieFilter, RatingStats},
};

type DbResult<T> = Result<T, sea_orm::DbErr>;

/// Data access for the catalog, bound to a pool or an open transaction.
///
/// Mutations open their own transaction on the bound connection (a savepoint
/// when it is already a transaction), so each one applies fully or not at all.
/// Missing rows are reported as `None`/`false`, never as errors.
pub struct MovieRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C> MovieRepository<'a, C>
where
    C: ConnectionTrait + TransactionTrait,
{
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn list_movies(
        &self,
        offset: u64,
        limit: u64,
        filter: &MovieFilter,
    ) -> DbResult<Vec<movie::Model>> {
        let mut query = movie::Entity::find();

        if let Some(title) = &filter.title {
            let lowered = Func::lower(Expr::col((movie::Entity, movie::Column::Title)));
            query = query.filter(Expr::expr(lowered).like(contains_pattern(title)));
        }
        if let Some(year) = filter.release_year {
            query = query.filter(movie::Column::ReleaseYear.eq(year));
        }
        if let Some(name) = &filter.genre {
            query = query
                .join(JoinType::InnerJoin, movie::Relation::MovieGenre.def())
                .join(JoinType::InnerJoin, movie_genre::Relation::Genre.def())
                .filter(genre::Column::Name.eq(name.as_str()));
        }

        query.order_by_asc(movie::Column::Id).offset(offset).limit(limit).all(self.conn).await
    }

    /// Total number of movies, ignoring any list filter.
    pub async fn count_movies(&self) -> DbResult<u64> {
        movie::Entity::find().count(self.conn).await
    }

    pub async fn get_movie_by_id(&self, id: i32) -> DbResult<Option<movie::Model>> {
        movie::Entity::find_by_id(id).one(self.conn).await
    }

    pub async fn get_rating_stats(&self, movie_id: i32) -> DbResult<RatingStats> {
        let row: Option<(Option<f64>, i64)> = rating::Entity::find()
            .select_only()
            .column_as(SimpleExpr::from(Func::avg(Expr::col(rating::Column::Score))), "average")
            .column_as(SimpleExpr::from(Func::count(Expr::col(rating::Column::Id))), "count")
            .filter(rating::Column::MovieId.eq(movie_id))
            .into_tuple()
            .one(self.conn)
            .await?;

        let (average, count) = row.unwrap_or((None, 0));
        let count = u64::try_from(count).unwrap_or(0);
        Ok(RatingStats { average: if count == 0 { None } else { average }, count })
    }

    /// Inserts a movie linked to whichever of `genre_ids` exist; unknown ids are dropped.
    pub async fn create_movie(&self, fields: &MovieFields, genre_ids: &[i32]) -> DbResult<movie::Model> {
        let txn = self.conn.begin().await?;

        let genres = MovieRepository::new(&txn).get_genres_by_ids(genre_ids).await?;
        let created = movie::ActiveModel {
            id: NotSet,
            title: Set(fields.title.clone()),
            release_year: Set(fields.release_year),
            cast: Set(fields.cast.clone()),
            director_id: Set(fields.director_id),
        }
        .insert(&txn)
        .await?;
        link_genres(&txn, created.id, &genres).await?;

        txn.commit().await?;
        Ok(created)
    }

    /// Overwrites the scalar fields and, when `genre_ids` is given, replaces the
    /// whole genre set with the ids that resolve.
    pub async fn update_movie(
        &self,
        id: i32,
        fields: &MovieFields,
        genre_ids: Option<&[i32]>,
    ) -> DbResult<Option<movie::Model>> {
        let txn = self.conn.begin().await?;

        let Some(existing) = movie::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut am: movie::ActiveModel = existing.into();
        am.title = Set(fields.title.clone());
        am.release_year = Set(fields.release_year);
        am.cast = Set(fields.cast.clone());
        am.director_id = Set(fields.director_id);
        let updated = am.update(&txn).await?;

        if let Some(ids) = genre_ids {
            let genres = MovieRepository::new(&txn).get_genres_by_ids(ids).await?;
            movie_genre::Entity::delete_many()
                .filter(movie_genre::Column::MovieId.eq(id))
                .exec(&txn)
                .await?;
            link_genres(&txn, id, &genres).await?;
        }

        txn.commit().await?;
        Ok(Some(updated))
    }

    /// Removes the movie with its ratings and genre links. `false` when the id is unknown.
    pub async fn delete_movie(&self, id: i32) -> DbResult<bool> {
        let txn = self.conn.begin().await?;

        if movie::Entity::find_by_id(id).one(&txn).await?.is_none() {
            return Ok(false);
        }

        rating::Entity::delete_many().filter(rating::Column::MovieId.eq(id)).exec(&txn).await?;
        movie_genre::Entity::delete_many()
            .filter(movie_genre::Column::MovieId.eq(id))
            .exec(&txn)
            .await?;
        let res = movie::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(res.rows_affected > 0)
    }

    /// Inserts a rating row as given; movie existence and score bounds are the caller's job.
    pub async fn add_rating(&self, movie_id: i32, score: i32) -> DbResult<rating::Model> {
        rating::ActiveModel { id: NotSet, score: Set(score), movie_id: Set(movie_id) }
            .insert(self.conn)
            .await
    }

    /// Returns the requested genres that exist, ordered by id.
    pub async fn get_genres_by_ids(&self, ids: &[i32]) -> DbResult<Vec<genre::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        genre::Entity::find()
            .filter(genre::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(genre::Column::Id)
            .all(self.conn)
            .await
    }

    pub async fn get_genres_for_movie(&self, movie: &movie::Model) -> DbResult<Vec<genre::Model>> {
        movie.find_related(genre::Entity).order_by_asc(genre::Column::Id).all(self.conn).await
    }

    pub async fn get_director_by_id(&self, id: i32) -> DbResult<Option<director::Model>> {
        director::Entity::find_by_id(id).one(self.conn).await
    }

    pub async fn list_genres(&self) -> DbResult<Vec<genre::Model>> {
        genre::Entity::find().order_by_asc(genre::Column::Id).all(self.conn).await
    }

    pub async fn list_directors(&self) -> DbResult<Vec<director::Model>> {
        director::Entity::find().order_by_asc(director::Column::Id).all(self.conn).await
    }
}

async fn link_genres<C: ConnectionTrait>(conn: &C, movie_id: i32, genres: &[genre::Model]) -> DbResult<()> {
    if genres.is_empty() {
        return Ok(());
    }
    let links = genres.iter().map(|g| movie_genre::ActiveModel {
        movie_id: Set(movie_id),
        genre_id: Set(g.id),
    });
    movie_genre::Entity::insert_many(links).exec_without_returning(conn).await?;
    Ok(())
}

/// `%needle%` folded like SQLite `lower()` (ASCII only), escaping LIKE wildcards with `!`.
fn contains_pattern(needle: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.to_ascii_lowercase().chars() {
        if matches!(c, '%' | '_' | '!') {
            escaped.push('!');
        }
        escaped.push(c);
    }
    escaped.push('%');
    LikeExpr::new(escaped).escape('!')
}
