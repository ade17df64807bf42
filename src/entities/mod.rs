pub mod director;
pub mod genre;
pub mod movie;
pub mod movie_genre;
pub mod rating;
