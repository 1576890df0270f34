use serde::{Deserialize, Serialize};

use super::ItemId;

/// Raw response from TMDB `GET /movie/{id}`
///
/// Only the fields the engine reads are modelled; everything else is ignored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TmdbMovie {
    pub id: ItemId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TmdbGenre {
    pub id: i64,
    pub name: String,
}

impl TmdbMovie {
    /// Poster path if TMDB returned a usable one
    pub fn poster_path(&self) -> Option<&str> {
        self.poster_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Movie details returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub id: ItemId,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<u32>,
    pub vote_average: Option<f64>,
    pub genres: Vec<String>,
    pub poster: Option<String>,
}

impl MovieDetails {
    /// Builds the client view, resolving the poster against `image_base_url`
    pub fn from_tmdb(movie: TmdbMovie, image_base_url: &str) -> Self {
        let poster = movie
            .poster_path()
            .map(|path| poster_url(image_base_url, path));

        Self {
            id: movie.id,
            title: movie.title,
            overview: movie.overview,
            release_date: movie.release_date,
            runtime: movie.runtime,
            vote_average: movie.vote_average,
            genres: movie.genres.into_iter().map(|g| g.name).collect(),
            poster,
        }
    }
}

/// Joins the image base and a TMDB poster path (`/abc.jpg`)
pub fn poster_url(image_base_url: &str, poster_path: &str) -> String {
    format!(
        "{}/{}",
        image_base_url.trim_end_matches('/'),
        poster_path.trim_start_matches('/')
    )
}
