//! Parser for the catalog and ratings CSV files.
//!
//! - movies.csv: movieId,title[,genres]
//! - ratings.csv: userId,movieId,rating[,timestamp]
//!
//! Titles may be quoted and contain commas; genres are pipe-separated.
//! Extra columns are ignored, missing required ones are an error.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, Read};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::warn;

const MOVIE_COLUMNS: &[&str] = &["movieId", "title"];
const RATING_COLUMNS: &[&str] = &["userId", "movieId", "rating"];

/// Placeholder MovieLens uses for movies without genres
const NO_GENRES: &str = "(no genres listed)";

#[derive(Debug, Deserialize)]
struct MovieRecord {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    title: String,
    #[serde(default)]
    genres: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    rating: f32,
    #[serde(default)]
    timestamp: Option<i64>,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn csv_error(file: &str, err: csv::Error) -> DataLoadError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => DataLoadError::IoError(e),
        _ => DataLoadError::ParseError {
            file: file.to_string(),
            line,
            reason,
        },
    }
}

fn require_columns(file: &str, headers: &StringRecord, required: &[&str]) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(DataLoadError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Parse the movies.csv file
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    parse_movies_from_reader(open(path)?, &file_label(path))
}

/// Parse catalog rows from any reader; `file` names the source in errors
pub fn parse_movies_from_reader<R: Read>(reader: R, file: &str) -> Result<Vec<Movie>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = reader.headers().map_err(|e| csv_error(file, e))?.clone();
    require_columns(file, &headers, MOVIE_COLUMNS)?;

    let mut movies = Vec::new();
    let mut unknown_genres = BTreeSet::new();
    for record in reader.deserialize::<MovieRecord>() {
        let record = record.map_err(|e| csv_error(file, e))?;
        let title = record.title.trim().to_string();
        if title.is_empty() {
            return Err(DataLoadError::InvalidValue {
                field: "title".to_string(),
                value: format!("empty title for movieId {}", record.movie_id),
            });
        }

        movies.push(Movie {
            id: record.movie_id,
            year: extract_year_from_title(&title),
            genres: match record.genres.as_deref() {
                Some(genres) => parse_genres(genres, &mut unknown_genres),
                None => Vec::new(),
            },
            title,
        });
    }

    if !unknown_genres.is_empty() {
        warn!(
            file,
            labels = ?unknown_genres,
            "Ignoring unknown genre labels"
        );
    }
    Ok(movies)
}

/// Parse the ratings.csv file
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    parse_ratings_from_reader(open(path)?, &file_label(path))
}

/// Parse rating rows from any reader; `file` names the source in errors
pub fn parse_ratings_from_reader<R: Read>(reader: R, file: &str) -> Result<Vec<Rating>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = reader.headers().map_err(|e| csv_error(file, e))?.clone();
    require_columns(file, &headers, RATING_COLUMNS)?;

    reader
        .deserialize::<RatingRecord>()
        .map(|record| {
            let record = record.map_err(|e| csv_error(file, e))?;
            Ok(Rating {
                user_id: record.user_id,
                movie_id: record.movie_id,
                rating: record.rating,
                timestamp: record.timestamp,
            })
        })
        .collect()
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
pub fn extract_year_from_title(title: &str) -> Option<u16> {
    let title = title.trim_end();
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end && end == title.len() - 1 {
        return title[start + 1..end].trim().parse::<u16>().ok();
    }
    None
}

/// Parse a genre label into Genre enum
///
/// Example: "Action" -> Some(Genre::Action)
///          "Sci-Fi" -> Some(Genre::SciFi)
fn parse_genre(s: &str) -> Option<Genre> {
    let genre = match s {
        "Action" => Genre::Action,
        "Adventure" => Genre::Adventure,
        "Animation" => Genre::Animation,
        // MovieLens 1M spells it with an apostrophe, the newer sets don't
        "Children" | "Children's" => Genre::Children,
        "Comedy" => Genre::Comedy,
        "Crime" => Genre::Crime,
        "Documentary" => Genre::Documentary,
        "Drama" => Genre::Drama,
        "Fantasy" => Genre::Fantasy,
        "Film-Noir" => Genre::FilmNoir,
        "Horror" => Genre::Horror,
        "IMAX" => Genre::Imax,
        "Musical" => Genre::Musical,
        "Mystery" => Genre::Mystery,
        "Romance" => Genre::Romance,
        "Sci-Fi" => Genre::SciFi,
        "Thriller" => Genre::Thriller,
        "War" => Genre::War,
        "Western" => Genre::Western,
        _ => return None,
    };
    Some(genre)
}

/// Parse pipe-separated genres
///
/// Example: "Action|Adventure|Sci-Fi" -> vec![Genre::Action, Genre::Adventure, Genre::SciFi]
///
/// Labels that are not known genres are skipped and collected in `unknown`.
fn parse_genres(s: &str, unknown: &mut BTreeSet<String>) -> Vec<Genre> {
    let s = s.trim();
    if s.is_empty() || s == NO_GENRES {
        return Vec::new();
    }
    s.split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .filter_map(|g| {
            let genre = parse_genre(g);
            if genre.is_none() {
                unknown.insert(g.to_string());
            }
            genre
        })
        .collect()
}
