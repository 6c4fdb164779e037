//! The tabular domain store: three CSV files (movies, ratings, tags) shared
//! by every handler (`spec.md` §6, §5's "Store I/O isolation" note).
//!
//! Mutating updates that touch existing rows perform a whole-file rewrite
//! via a temp file plus atomic rename, so a concurrent reader always sees
//! either the old or the new file in full, never a partial write.
//! Append-only updates (`u.add_tag`, a first rating) just append. Writers
//! are serialized through `write_lock`; readers take no lock.

use crate::error::{CsvSnafu, IoSnafu, MissingDataFileSnafu, NoMovieForIdSnafu, NoMovieForTitleSnafu};
use crate::Result;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieRow {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub title: String,
    pub genres: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingRow {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub rating: f64,
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagRow {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub tag: String,
    pub timestamp: i64,
}

/// Strips a trailing `" (YYYY)"`-style release-year suffix (the last 7
/// characters) and case-folds a *stored* movie title, matching the
/// reference's `movie['title'].lower()[:-7]`, but operating on chars so it
/// never panics on a title shorter than 7 characters. The caller's query
/// title is never stripped — only lower-cased — exactly as the reference
/// compares `... == title.lower()`.
fn normalize_title(title: &str) -> String {
    let chars: Vec<char> = title.chars().collect();
    let keep = chars.len().saturating_sub(7);
    chars[..keep].iter().collect::<String>().to_lowercase()
}

pub struct Store {
    movies_path: PathBuf,
    ratings_path: PathBuf,
    tags_path: PathBuf,
    write_lock: Mutex<()>,
}

impl Store {
    /// Opens a store rooted at `base_dir`. `movies.csv` must already exist
    /// (it is reference data, not something a replica originates);
    /// `ratings.csv`/`tags.csv` are created with just a header if absent.
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let movies_path = base_dir.join("movies.csv");
        let ratings_path = base_dir.join("ratings.csv");
        let tags_path = base_dir.join("tags.csv");

        if !movies_path.exists() {
            return MissingDataFileSnafu { path: movies_path }.fail();
        }
        ensure_with_header(&ratings_path, &["userId", "movieId", "rating", "timestamp"])?;
        ensure_with_header(&tags_path, &["userId", "movieId", "tag", "timestamp"])?;

        Ok(Self {
            movies_path,
            ratings_path,
            tags_path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn movie_by_title(&self, title: &str) -> Result<MovieRow> {
        let needle = title.to_lowercase();
        read_csv::<MovieRow>(&self.movies_path)?
            .into_iter()
            .find(|row| normalize_title(&row.title) == needle)
            .context(NoMovieForTitleSnafu {
                title: title.to_string(),
            })
    }

    pub fn movie_by_id(&self, movie_id: i64) -> Result<MovieRow> {
        read_csv::<MovieRow>(&self.movies_path)?
            .into_iter()
            .find(|row| row.movie_id == movie_id)
            .context(NoMovieForIdSnafu { movie_id })
    }

    pub fn submit_rating(&self, user_id: i64, title: &str, rating: f64) -> Result<()> {
        let movie_id = self.movie_by_title(title)?.movie_id;
        let _guard = self.write_lock.lock().expect("store lock poisoned");
        let mut rows = read_csv::<RatingRow>(&self.ratings_path)?;
        let timestamp = chrono_now();

        if let Some(existing) = rows
            .iter_mut()
            .find(|row| row.user_id == user_id && row.movie_id == movie_id)
        {
            existing.rating = rating;
            existing.timestamp = timestamp;
            rewrite_csv(&self.ratings_path, &rows)
        } else {
            append_csv(
                &self.ratings_path,
                &RatingRow {
                    user_id,
                    movie_id,
                    rating,
                    timestamp,
                },
            )
        }
    }

    pub fn submit_tag(&self, user_id: i64, title: &str, tag: &str) -> Result<()> {
        let movie_id = self.movie_by_title(title)?.movie_id;
        let _guard = self.write_lock.lock().expect("store lock poisoned");
        append_csv(
            &self.tags_path,
            &TagRow {
                user_id,
                movie_id,
                tag: tag.to_string(),
                timestamp: chrono_now(),
            },
        )
    }

    pub fn avg_rating(&self, title: &str) -> Result<f64> {
        let movie_id = self.movie_by_title(title)?.movie_id;
        let ratings: Vec<f64> = read_csv::<RatingRow>(&self.ratings_path)?
            .into_iter()
            .filter(|row| row.movie_id == movie_id)
            .map(|row| row.rating)
            .collect();
        ensure!(
            !ratings.is_empty(),
            crate::error::NoRatingsSnafu {
                title: title.to_string()
            }
        );
        Ok(ratings.iter().sum::<f64>() / ratings.len() as f64)
    }

    /// Ratings optionally filtered by `user_id` and/or `title`, each row
    /// enriched with the movie's title (matches `get_movie_ratings`).
    pub fn ratings(&self, user_id: Option<i64>, title: Option<&str>) -> Result<Vec<(RatingRow, String)>> {
        let movie_id = title.map(|t| self.movie_by_title(t)).transpose()?.map(|m| m.movie_id);
        let rows = read_csv::<RatingRow>(&self.ratings_path)?
            .into_iter()
            .filter(|row| user_id.is_none_or(|uid| row.user_id == uid))
            .filter(|row| movie_id.is_none_or(|mid| row.movie_id == mid));

        rows.map(|row| {
            let title = self.movie_by_id(row.movie_id)?.title;
            Ok((row, title))
        })
        .collect()
    }

    pub fn genres(&self, title: &str) -> Result<Vec<String>> {
        let movie = self.movie_by_title(title)?;
        Ok(movie.genres.split('|').map(str::to_string).collect())
    }

    pub fn tags(&self, title: &str) -> Result<Vec<String>> {
        let movie_id = self.movie_by_title(title)?.movie_id;
        let mut tags: Vec<String> = read_csv::<TagRow>(&self.tags_path)?
            .into_iter()
            .filter(|row| row.movie_id == movie_id)
            .map(|row| row.tag)
            .collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    pub fn search_title(&self, text: &str) -> Result<Vec<MovieRow>> {
        let needle = text.to_lowercase();
        Ok(read_csv::<MovieRow>(&self.movies_path)?
            .into_iter()
            .filter(|row| row.title.to_lowercase().contains(&needle))
            .collect())
    }

    pub fn search_genre(&self, genre: &str) -> Result<Vec<MovieRow>> {
        let needle = genre.to_lowercase();
        Ok(read_csv::<MovieRow>(&self.movies_path)?
            .into_iter()
            .filter(|row| row.genres.to_lowercase().contains(&needle))
            .collect())
    }

    pub fn search_tag(&self, tag: &str) -> Result<Vec<MovieRow>> {
        let needle = tag.to_lowercase();
        let movie_ids: Vec<i64> = read_csv::<TagRow>(&self.tags_path)?
            .into_iter()
            .filter(|row| row.tag.to_lowercase().contains(&needle))
            .map(|row| row.movie_id)
            .collect();
        Ok(read_csv::<MovieRow>(&self.movies_path)?
            .into_iter()
            .filter(|row| movie_ids.contains(&row.movie_id))
            .collect())
    }
}

fn chrono_now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn ensure_with_header(path: &Path, header: &[&str]) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    let mut writer = csv::Writer::from_path(path).context(CsvSnafu {
        path: path.to_path_buf(),
    })?;
    writer.write_record(header).context(CsvSnafu {
        path: path.to_path_buf(),
    })?;
    writer.flush().context(IoSnafu {
        path: path.to_path_buf(),
    })
}

fn read_csv<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path).context(CsvSnafu {
        path: path.to_path_buf(),
    })?;
    reader
        .deserialize()
        .map(|row| {
            row.context(CsvSnafu {
                path: path.to_path_buf(),
            })
        })
        .collect()
}

fn append_csv<T: Serialize>(path: &Path, row: &T) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .context(IoSnafu {
            path: path.to_path_buf(),
        })?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.serialize(row).context(CsvSnafu {
        path: path.to_path_buf(),
    })?;
    writer.flush().context(IoSnafu {
        path: path.to_path_buf(),
    })
}

/// Whole-file rewrite via temp file + atomic rename (`spec.md` §5).
fn rewrite_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(dir).context(IoSnafu {
        path: path.to_path_buf(),
    })?;
    {
        let mut writer = csv::Writer::from_writer(&mut temp);
        for row in rows {
            writer.serialize(row).context(CsvSnafu {
                path: path.to_path_buf(),
            })?;
        }
        writer.flush().context(IoSnafu {
            path: path.to_path_buf(),
        })?;
    }
    temp.persist(path).map_err(|e| e.error).context(IoSnafu {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seeded_store() -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("movies.csv"),
            "movieId,title,genres\n1,Toy Story (1995),Animation|Children|Comedy\n2,Jumanji (1995),Adventure|Children\n",
        )
        .unwrap();
        let store = Store::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn movie_by_title_strips_year_suffix_and_case_folds() {
        let (_dir, store) = seeded_store();
        let movie = store.movie_by_title("toy story").unwrap();
        assert_eq!(movie.movie_id, 1);
    }

    #[test]
    fn missing_movie_is_domain_error() {
        let (_dir, store) = seeded_store();
        assert!(store.movie_by_title("nonexistent movie").is_err());
    }

    #[test]
    fn submit_rating_then_update_rewrites_in_place() {
        let (_dir, store) = seeded_store();
        store.submit_rating(7, "toy story", 4.0).unwrap();
        assert_eq!(store.avg_rating("toy story").unwrap(), 4.0);

        store.submit_rating(7, "toy story", 2.0).unwrap();
        let ratings = store.ratings(Some(7), None).unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].0.rating, 2.0);
    }

    #[test]
    fn submit_tag_and_search_by_tag() {
        let (_dir, store) = seeded_store();
        store.submit_tag(7, "toy story", "pixar").unwrap();
        let tagged = store.search_tag("pix").unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].movie_id, 1);
    }

    #[test]
    fn genres_split_on_pipe() {
        let (_dir, store) = seeded_store();
        let genres = store.genres("jumanji").unwrap();
        assert_eq!(genres, vec!["Adventure", "Children"]);
    }

    #[test]
    fn search_title_matches_substring_case_insensitively() {
        let (_dir, store) = seeded_store();
        let found = store.search_title("JUMANJI").unwrap();
        assert_eq!(found.len(), 1);
    }
}
