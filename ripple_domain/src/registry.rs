//! Opcode registry: the mapping from a dotted opcode (`u.add_rating`,
//! `q.search_title`, ...) to a deterministic handler over the
//! [`Store`](crate::store::Store) (`spec.md` §4.2, §4.5).
//!
//! The engine only ever calls [`Handlers::apply_update`] /
//! [`Handlers::apply_query`] — it never inspects what a handler actually
//! does, matching the "opaque to the engine" boundary `spec.md` draws
//! between `ReplicaManager` and `DomainHandlers`.

use crate::error::{BadParamSnafu, UnknownOperationSnafu};
use crate::store::Store;
use crate::value::DomainValue;
use crate::Result;
use ripple_core::identifier::{Identifier, TrieMap};
use ripple_messages::ParamValue;
use snafu::prelude::*;

type UpdateHandler = fn(&Store, &str, &[ParamValue]) -> Result<()>;
type QueryHandler = fn(&Store, &str, &[ParamValue]) -> Result<DomainValue>;

/// The closed table of update/query handlers, keyed by opcode. `spec.md`
/// §9 models opcode dispatch as "a closed tagged variant plus a static
/// table" rather than open-ended lookup; this is that table.
pub struct Handlers {
    updates: TrieMap<UpdateHandler>,
    queries: TrieMap<QueryHandler>,
}

impl Handlers {
    /// The handler set for the movie-ratings domain (`spec.md` §4.5).
    pub fn movie_ratings() -> Self {
        let mut updates: TrieMap<UpdateHandler> = TrieMap::new();
        updates.insert(Identifier::parse("u.add_rating"), add_rating);
        updates.insert(Identifier::parse("u.add_tag"), add_tag);

        let mut queries: TrieMap<QueryHandler> = TrieMap::new();
        queries.insert(Identifier::parse("q.get_avg_rating"), get_avg_rating);
        queries.insert(Identifier::parse("q.get_ratings"), get_ratings);
        queries.insert(Identifier::parse("q.get_genres"), get_genres);
        queries.insert(Identifier::parse("q.get_movie"), get_movie);
        queries.insert(Identifier::parse("q.get_tags"), get_tags);
        queries.insert(Identifier::parse("q.search_title"), search_title);
        queries.insert(Identifier::parse("q.search_genre"), search_genre);
        queries.insert(Identifier::parse("q.search_tag"), search_tag);

        Self { updates, queries }
    }

    pub fn apply_update(&self, store: &Store, opcode: &str, params: &[ParamValue]) -> Result<()> {
        let handler = self
            .updates
            .get(&Identifier::parse(opcode))
            .context(UnknownOperationSnafu {
                opcode: opcode.to_string(),
            })?;
        handler(store, opcode, params)
    }

    pub fn apply_query(
        &self,
        store: &Store,
        opcode: &str,
        params: &[ParamValue],
    ) -> Result<DomainValue> {
        let handler = self
            .queries
            .get(&Identifier::parse(opcode))
            .context(UnknownOperationSnafu {
                opcode: opcode.to_string(),
            })?;
        handler(store, opcode, params)
    }
}

fn param_i64(opcode: &str, params: &[ParamValue], index: usize) -> Result<i64> {
    params
        .get(index)
        .and_then(ParamValue::as_i64)
        .context(BadParamSnafu {
            opcode: opcode.to_string(),
            index,
            expected: "int",
        })
}

fn param_f64(opcode: &str, params: &[ParamValue], index: usize) -> Result<f64> {
    params
        .get(index)
        .and_then(ParamValue::as_f64)
        .context(BadParamSnafu {
            opcode: opcode.to_string(),
            index,
            expected: "float",
        })
}

fn param_text<'a>(opcode: &str, params: &'a [ParamValue], index: usize) -> Result<&'a str> {
    params
        .get(index)
        .and_then(ParamValue::as_text)
        .context(BadParamSnafu {
            opcode: opcode.to_string(),
            index,
            expected: "text",
        })
}

fn param_opt_i64(params: &[ParamValue], index: usize) -> Option<i64> {
    params.get(index).and_then(ParamValue::as_i64)
}

fn param_opt_text(params: &[ParamValue], index: usize) -> Option<&str> {
    params.get(index).and_then(ParamValue::as_text)
}

fn add_rating(store: &Store, opcode: &str, params: &[ParamValue]) -> Result<()> {
    let user_id = param_i64(opcode, params, 0)?;
    let title = param_text(opcode, params, 1)?;
    let rating = param_f64(opcode, params, 2)?;
    store.submit_rating(user_id, title, rating)
}

fn add_tag(store: &Store, opcode: &str, params: &[ParamValue]) -> Result<()> {
    let user_id = param_i64(opcode, params, 0)?;
    let title = param_text(opcode, params, 1)?;
    let tag = param_text(opcode, params, 2)?;
    store.submit_tag(user_id, title, tag)
}

fn get_avg_rating(store: &Store, opcode: &str, params: &[ParamValue]) -> Result<DomainValue> {
    let title = param_text(opcode, params, 0)?;
    Ok(DomainValue::Float(store.avg_rating(title)?))
}

fn get_ratings(store: &Store, _opcode: &str, params: &[ParamValue]) -> Result<DomainValue> {
    let user_id = param_opt_i64(params, 0);
    let title = param_opt_text(params, 1);
    let rows = store.ratings(user_id, title)?;
    Ok(DomainValue::List(
        rows.into_iter()
            .map(|(row, title)| {
                DomainValue::record([
                    ("userId", DomainValue::Float(row.user_id as f64)),
                    ("movieId", DomainValue::Float(row.movie_id as f64)),
                    ("rating", DomainValue::Float(row.rating)),
                    ("timestamp", DomainValue::Float(row.timestamp as f64)),
                    ("title", DomainValue::Text(title)),
                ])
            })
            .collect(),
    ))
}

fn get_genres(store: &Store, opcode: &str, params: &[ParamValue]) -> Result<DomainValue> {
    let title = param_text(opcode, params, 0)?;
    Ok(store.genres(title)?.into())
}

fn get_movie(store: &Store, opcode: &str, params: &[ParamValue]) -> Result<DomainValue> {
    let title = param_text(opcode, params, 0)?;
    let movie = store.movie_by_title(title)?;
    Ok(DomainValue::record([
        ("movieId", DomainValue::Float(movie.movie_id as f64)),
        ("title", DomainValue::Text(movie.title)),
        ("genres", DomainValue::Text(movie.genres)),
    ]))
}

fn get_tags(store: &Store, opcode: &str, params: &[ParamValue]) -> Result<DomainValue> {
    let title = param_text(opcode, params, 0)?;
    Ok(store.tags(title)?.into())
}

fn search_title(store: &Store, opcode: &str, params: &[ParamValue]) -> Result<DomainValue> {
    let text = param_text(opcode, params, 0)?;
    Ok(movies_to_value(store.search_title(text)?))
}

fn search_genre(store: &Store, opcode: &str, params: &[ParamValue]) -> Result<DomainValue> {
    let genre = param_text(opcode, params, 0)?;
    Ok(movies_to_value(store.search_genre(genre)?))
}

fn search_tag(store: &Store, opcode: &str, params: &[ParamValue]) -> Result<DomainValue> {
    let tag = param_text(opcode, params, 0)?;
    Ok(movies_to_value(store.search_tag(tag)?))
}

fn movies_to_value(movies: Vec<crate::store::MovieRow>) -> DomainValue {
    DomainValue::List(
        movies
            .into_iter()
            .map(|m| {
                DomainValue::record([
                    ("movieId", DomainValue::Float(m.movie_id as f64)),
                    ("title", DomainValue::Text(m.title)),
                    ("genres", DomainValue::Text(m.genres)),
                ])
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seeded() -> (tempfile::TempDir, Store, Handlers) {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("movies.csv"),
            "movieId,title,genres\n1,Toy Story (1995),Animation|Comedy\n",
        )
        .unwrap();
        let store = Store::open(dir.path()).unwrap();
        (dir, store, Handlers::movie_ratings())
    }

    #[test]
    fn dispatches_update_and_query_by_opcode() {
        let (_dir, store, handlers) = seeded();
        handlers
            .apply_update(
                &store,
                "u.add_rating",
                &[7i64.into(), "toy story".into(), 4.0.into()],
            )
            .unwrap();

        let value = handlers
            .apply_query(&store, "q.get_avg_rating", &["toy story".into()])
            .unwrap();
        assert_eq!(value, DomainValue::Float(4.0));
    }

    #[test]
    fn unknown_opcode_is_an_error() {
        let (_dir, store, handlers) = seeded();
        assert!(handlers.apply_query(&store, "q.nonexistent", &[]).is_err());
    }
}
