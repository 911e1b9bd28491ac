//! Query-string encoding for options records.
//!
//! Options fields are `Option<T>`: `None` is left out of the query and
//! `Some(v)` is always sent, zero and empty strings included. Parameters are
//! emitted in key order.

use std::collections::BTreeMap;
use std::fmt::Display;

use url::form_urlencoded;

/// An options record whose set fields become query parameters.
pub trait QueryOptions {
    fn append_to(&self, query: &mut Query);

    fn to_query(&self) -> Query {
        let mut query = Query::new();
        self.append_to(&mut query);
        query
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: BTreeMap<&'static str, String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: impl Display) -> &mut Self {
        self.params.insert(key, value.to_string());
        self
    }

    pub fn set_opt<V: Display>(&mut self, key: &'static str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Appends the encoded query to `path`, or returns `path` unchanged when empty.
    pub fn apply_to(&self, path: &str) -> String {
        if self.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{}", self.encode())
        }
    }
}

pub fn with_options<O: QueryOptions + ?Sized>(path: &str, options: Option<&O>) -> String {
    match options {
        Some(options) => options.to_query().apply_to(path),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        name: Option<String>,
        start_at: Option<u32>,
        max_results: Option<u32>,
    }

    impl QueryOptions for Sample {
        fn append_to(&self, query: &mut Query) {
            query
                .set_opt("name", self.name.as_deref())
                .set_opt("startAt", self.start_at)
                .set_opt("maxResults", self.max_results);
        }
    }

    fn parse(encoded: &str) -> Vec<(String, String)> {
        form_urlencoded::parse(encoded.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn unset_fields_are_omitted() {
        let sample = Sample {
            name: Some("Team board".to_string()),
            start_at: None,
            max_results: None,
        };
        let encoded = sample.to_query().encode();
        assert_eq!(encoded, "name=Team+board");
        assert_eq!(parse(&encoded), vec![("name".to_string(), "Team board".to_string())]);
    }

    #[test]
    fn explicit_zero_is_sent() {
        let sample = Sample {
            name: None,
            start_at: Some(0),
            max_results: Some(50),
        };
        assert_eq!(sample.to_query().encode(), "maxResults=50&startAt=0");
    }

    #[test]
    fn keys_are_ordered() {
        let mut query = Query::new();
        query.set("zeta", 1).set("alpha", 2).set("mid", "x");
        assert_eq!(query.encode(), "alpha=2&mid=x&zeta=1");
    }

    #[test]
    fn empty_query_leaves_path_alone() {
        let sample = Sample {
            name: None,
            start_at: None,
            max_results: None,
        };
        assert_eq!(with_options("rest/agile/1.0/board", Some(&sample)), "rest/agile/1.0/board");
        assert_eq!(with_options::<Sample>("rest/agile/1.0/board", None), "rest/agile/1.0/board");
    }

    #[test]
    fn reserved_characters_are_escaped() {
        let mut query = Query::new();
        query.set("jql", "project = A&B");
        assert_eq!(query.apply_to("search"), "search?jql=project+%3D+A%26B");
    }
}
