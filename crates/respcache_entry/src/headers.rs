//! Ordered response header list with case-insensitive lookup.
//!
//! `http::HeaderMap` lowercases names, so stored entries keep their own list
//! to re-emit headers exactly as the origin sent them.

use http::HeaderMap;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of `name` joined with `", "`, the way repeated list-valued
    /// fields such as `Cache-Control` combine.
    pub fn get_joined(&self, name: &str) -> Option<String> {
        let mut joined: Option<String> = None;
        for value in self.get_all(name) {
            match joined.as_mut() {
                Some(out) => {
                    out.push_str(", ");
                    out.push_str(value);
                }
                None => joined = Some(value.to_string()),
            }
        }
        joined
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Replace every `name` field with a single value.
    ///
    /// The first existing field keeps its position and original name casing;
    /// later duplicates are dropped. Unknown names are appended.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        let Some(pos) = self
            .fields
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(&name))
        else {
            self.fields.push((name, value));
            return;
        };

        self.fields[pos].1 = value;
        let mut idx = 0;
        self.fields.retain(|(n, _)| {
            let keep = idx <= pos || !n.eq_ignore_ascii_case(&name);
            idx += 1;
            keep
        });
    }

    /// Remove every `name` field, returning how many were dropped.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.fields.len();
        self.fields.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        before - self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<&HeaderMap> for Headers {
    fn from(map: &HeaderMap) -> Self {
        map.iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Headers;
    use http::{HeaderMap, HeaderValue, header};

    #[test]
    fn lookup_ignores_case_but_keeps_original_name() {
        let headers: Headers = [("Cache-Control", "max-age=60"), ("ETag", "\"a\"")]
            .into_iter()
            .collect();
        assert_eq!(headers.get("cache-control"), Some("max-age=60"));
        assert_eq!(headers.get("ETAG"), Some("\"a\""));
        let names: Vec<&str> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Cache-Control", "ETag"]);
    }

    #[test]
    fn insert_replaces_duplicates_in_place() {
        let mut headers: Headers = [
            ("Date", "a"),
            ("Vary", "Accept"),
            ("vary", "Origin"),
            ("Server", "x"),
        ]
        .into_iter()
        .collect();
        headers.insert("VARY", "Accept-Encoding");
        let fields: Vec<(&str, &str)> = headers.iter().collect();
        assert_eq!(
            fields,
            vec![("Date", "a"), ("Vary", "Accept-Encoding"), ("Server", "x")]
        );
    }

    #[test]
    fn insert_appends_unknown_name() {
        let mut headers = Headers::new();
        headers.insert("ETag", "\"v1\"");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("etag"), Some("\"v1\""));
    }

    #[test]
    fn joined_values_combine_repeated_fields() {
        let headers: Headers = [("Cache-Control", "public"), ("cache-control", "max-age=5")]
            .into_iter()
            .collect();
        assert_eq!(
            headers.get_joined("Cache-Control").as_deref(),
            Some("public, max-age=5")
        );
        assert_eq!(headers.get_joined("Expires"), None);
    }

    #[test]
    fn remove_drops_every_match() {
        let mut headers: Headers = [("A", "1"), ("a", "2"), ("B", "3")].into_iter().collect();
        assert_eq!(headers.remove("a"), 2);
        assert!(!headers.contains("A"));
        assert!(headers.contains("b"));
    }

    #[test]
    fn converts_from_header_map() {
        let mut map = HeaderMap::new();
        map.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        map.insert(
            header::ETAG,
            HeaderValue::from_bytes(b"\"\xff\"").expect("opaque bytes are a valid value"),
        );
        let headers = Headers::from(&map);
        assert_eq!(headers.get("Cache-Control"), Some("no-store"));
        assert!(!headers.contains("etag"));
    }
}
