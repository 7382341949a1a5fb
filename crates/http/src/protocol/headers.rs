//! Request header multimap.
//!
//! Names keep the exact spelling they had on the wire and the same name may
//! appear several times. Lookups through [`Headers::get`] are exact; the
//! `_ignore_case` variants compare ASCII case-insensitively, which is what
//! the parser uses for the framing headers it has to understand.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    /// Adds a field/value pair, keeping any earlier value of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Returns the first value stored under exactly `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries.iter().filter(move |(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn contains_ignore_case(&self, name: &str) -> bool {
        self.get_ignore_case(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Headers;

    #[test]
    fn keeps_duplicates_and_spelling() {
        let mut headers = Headers::new();
        headers.insert("Accept", "text/html");
        headers.insert("Accept", "application/json");
        headers.insert("X-Trace", "1");

        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("Accept"), Some("text/html"));
        assert_eq!(headers.get_all("Accept").collect::<Vec<_>>(), vec!["text/html", "application/json"]);
        assert_eq!(headers.get("accept"), None);
        assert_eq!(headers.get_ignore_case("x-trace"), Some("1"));
    }
}
