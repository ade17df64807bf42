use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_movies_title")
                    .table(Movies::Table)
                    .col(Movies::Title)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_ratings_movie_id")
                    .table(MovieRatings::Table)
                    .col(MovieRatings::MovieId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_genres_genre_id")
                    .table(MovieGenres::Table)
                    .col(MovieGenres::GenreId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_movie_genres_genre_id").table(MovieGenres::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_movie_ratings_movie_id").table(MovieRatings::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_movies_title").table(Movies::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Title,
}

#[derive(DeriveIden)]
enum MovieRatings {
    Table,
    MovieId,
}

#[derive(DeriveIden)]
enum MovieGenres {
    Table,
    GenreId,
}
