use std::collections::btree_map::{self, BTreeMap};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// RFC 3986 unreserved characters are the only ones left untouched.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encodes `value` the way OAuth 1.0a requires.
///
/// Non-ASCII input is encoded byte-wise from its UTF-8 form, and the hex
/// digits are always uppercase. A space becomes `%20`, never `+`.
pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Serializes key-value pairs into the canonical `k1=v1&k2=v2` form.
///
/// Pairs are sorted by encoded key, then by encoded value, so the same
/// parameters always produce the same string whatever order they came in.
/// Duplicate keys are kept.
pub fn serialize_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut encoded = pairs
        .into_iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect::<Vec<(String, String)>>();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<String>>()
        .join("&")
}

/// Request parameters: unique, case-sensitive keys mapped to string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    inner: BTreeMap<String, String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Default::default()
    }

    /// Decodes an `application/x-www-form-urlencoded` string.
    ///
    /// When a key shows up more than once the last value wins.
    pub fn parse(query: &str) -> Self {
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Inserts a parameter, returning the value it replaced.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<String>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.insert(key.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.inner.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.inner.iter(),
        }
    }

    /// The canonical, percent-encoded form used in query strings, request
    /// bodies and the signature base string. Empty for an empty set.
    pub fn serialize(&self) -> String {
        serialize_pairs(self.iter())
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = ParameterSet::new();
        params.extend(iter);
        params
    }
}

impl<K, V> Extend<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Borrowing iterator over a [`ParameterSet`], in key order.
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, String, String>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use percent_encoding::percent_decode_str;

    use super::*;

    #[test]
    fn unreserved_pass_through() {
        let unreserved = "ABCXYZabcxyz0189-._~";
        assert_eq!(percent_encode(unreserved), unreserved);
    }

    #[test]
    fn reserved_are_encoded_uppercase() {
        assert_eq!(percent_encode("hello world"), "hello%20world");
        assert_eq!(percent_encode("a+b=c&d"), "a%2Bb%3Dc%26d");
        assert_eq!(percent_encode("*!'()"), "%2A%21%27%28%29");
        assert_eq!(
            percent_encode("http://printer.example.com/ready"),
            "http%3A%2F%2Fprinter.example.com%2Fready"
        );
        assert_eq!(percent_encode("\u{2603}"), "%E2%98%83");
    }

    #[test]
    fn decoding_restores_the_original() {
        let printable = (0x20u8..0x7f).map(char::from).collect::<String>();
        for sample in &[
            printable.as_str(),
            "少女終末旅行",
            "Ladies + Gentlemen",
            "café ☃ \u{1F600}",
            "",
        ] {
            let encoded = percent_encode(sample);
            let decoded = percent_decode_str(&encoded).decode_utf8().unwrap();
            assert_eq!(decoded, *sample);
        }
    }

    #[test]
    fn empty_set_serializes_to_empty_string() {
        assert_eq!(ParameterSet::new().serialize(), "");
    }

    #[test]
    fn serialization_ignores_input_order() {
        let forward: ParameterSet = vec![("b", "2"), ("a", "1"), ("c", "x y")]
            .into_iter()
            .collect();
        let backward: ParameterSet = vec![("c", "x y"), ("a", "1"), ("b", "2")]
            .into_iter()
            .collect();
        assert_eq!(forward.serialize(), "a=1&b=2&c=x%20y");
        assert_eq!(forward.serialize(), backward.serialize());
    }

    #[test]
    fn sorts_by_encoded_key_then_value() {
        // RFC 5849 section 3.4.1.3.2
        let serialized = serialize_pairs(vec![
            ("b5", "=%3D"),
            ("a3", "a"),
            ("c@", ""),
            ("a2", "r b"),
            ("oauth_consumer_key", "9djdj82h48djs9d2"),
            ("oauth_token", "kkk9d7dh3k39sjv7"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "137131201"),
            ("oauth_nonce", "7d8f3e4a"),
            ("c2", ""),
            ("a3", "2 q"),
        ]);
        assert_eq!(
            serialized,
            "a2=r%20b&a3=2%20q&a3=a&b5=%3D%253D&c%40=&c2=&oauth_consumer_key=9dj\
             dj82h48djs9d2&oauth_nonce=7d8f3e4a&oauth_signature_method=HMAC-SHA1\
             &oauth_timestamp=137131201&oauth_token=kkk9d7dh3k39sjv7"
        );
    }

    #[test]
    fn keys_are_case_sensitive_and_unique() {
        let mut params = ParameterSet::new().with("Key", "1").with("key", "2");
        assert_eq!(params.len(), 2);
        assert_eq!(params.insert("key", "3"), Some("2".to_string()));
        assert_eq!(params.get("key"), Some("3"));
        assert_eq!(params.get("Key"), Some("1"));
    }

    #[test]
    fn parse_decodes_form_encoding() {
        let params = ParameterSet::parse("status=Hello+Ladies%20%2B&empty=&flag");
        assert_eq!(params.get("status"), Some("Hello Ladies +"));
        assert_eq!(params.get("empty"), Some(""));
        assert_eq!(params.get("flag"), Some(""));
        assert_eq!(params.len(), 3);
    }
}
