//! Ordered header multimap.
//!
//! Header names are matched case-insensitively on lookup but preserved
//! byte-for-byte on serialization. Entries keep their insertion order, and
//! the same name may appear more than once.
//!
//! The map is generic over the string representation so that parsed
//! requests can hold borrowed `&str` views into the session's buffer while
//! built responses own their `String`s.

use bytes::{BufMut, BytesMut};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap<S = String> {
    entries: Vec<(S, S)>,
}

impl<S> Default for HeaderMap<S> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<S> HeaderMap<S> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: AsRef<str>> HeaderMap<S> {
    /// Appends an entry, keeping any existing entries with the same name.
    pub fn add(&mut self, name: S, value: S) {
        self.entries.push((name, value));
    }

    /// Replaces the first entry with the given name (or appends if absent)
    /// and removes any further entries with that name.
    pub fn set(&mut self, name: S, value: S) {
        match self.find(name.as_ref()) {
            Some(index) => {
                let keep = name.as_ref().to_owned();
                self.entries[index] = (name, value);
                let mut seen = 0usize;
                self.entries.retain(|entry| {
                    if entry.0.as_ref().eq_ignore_ascii_case(&keep) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Removes all entries with the given name, returning how many were
    /// removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.0.as_ref().eq_ignore_ascii_case(name));
        before - self.entries.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// The value of the first entry matching `name`, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find(name).map(|index| self.entries[index].1.as_ref())
    }

    /// All values for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.0.as_ref().eq_ignore_ascii_case(name))
            .map(|entry| entry.1.as_ref())
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|entry| (entry.0.as_ref(), entry.1.as_ref()))
    }

    pub fn entries(&self) -> &[(S, S)] {
        &self.entries
    }

    /// Appends `"<name>: <value>\r\n"` for every entry. Header folding is
    /// not supported.
    pub fn serialize(&self, dst: &mut BytesMut) {
        for (name, value) in self.iter() {
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.0.as_ref().eq_ignore_ascii_case(name))
    }
}

impl<S: AsRef<str>> From<Vec<(S, S)>> for HeaderMap<S> {
    fn from(entries: Vec<(S, S)>) -> Self {
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.add("Content-Type".to_owned(), "text/plain".to_owned());
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert!(headers.contains("conTent-tYpe"));
        assert_eq!(headers.get("Content-Length"), None);
    }

    #[test]
    fn multimap_keeps_insertion_order() {
        let mut headers: HeaderMap<&str> = HeaderMap::new();
        headers.add("Accept", "text/html");
        headers.add("Via", "a");
        headers.add("via", "b");
        assert_eq!(headers.get("Via"), Some("a"));
        assert_eq!(headers.get_all("via").collect::<Vec<_>>(), vec!["a", "b"]);
        let names: Vec<_> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Accept", "Via", "via"]);
    }

    #[test]
    fn set_collapses_duplicates() {
        let mut headers: HeaderMap<&str> = HeaderMap::new();
        headers.add("Via", "a");
        headers.add("Accept", "*/*");
        headers.add("via", "b");
        headers.set("VIA", "c");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("via"), Some("c"));
    }

    #[test]
    fn remove_drops_all_matches() {
        let mut headers: HeaderMap<&str> = HeaderMap::new();
        headers.add("Via", "a");
        headers.add("via", "b");
        headers.add("Host", "h");
        assert_eq!(headers.remove("VIA"), 2);
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn serialize_preserves_names_and_order() {
        let mut headers: HeaderMap<&str> = HeaderMap::new();
        headers.add("Connection", "close");
        headers.add("Content-Type", "text/plain");
        let mut dst = BytesMut::new();
        headers.serialize(&mut dst);
        assert_eq!(&dst[..], b"Connection: close\r\nContent-Type: text/plain\r\n".as_slice());
    }
}
