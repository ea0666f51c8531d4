use std::collections::HashMap;

/// Header fields of a request or of a multipart part.
///
/// Names are case-sensitive. A field seen more than once keeps every value,
/// comma-joined in the order they arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    fields: HashMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw header block (CRLF separated, no trailing blank line).
    ///
    /// Lines without a colon, or with an empty name or value, are ignored.
    pub fn parse(text: &str) -> Self {
        let mut headers = HeaderMap::new();

        for line in text.split("\r\n") {
            if let Some((name, value)) = split_field(line) {
                headers.append(name, value);
            }
        }

        headers
    }

    /// Adds a value, folding it into an existing field of the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        self.fields
            .entry(name.into())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Splits `Name : value` into its trimmed parts.
fn split_field(line: &str) -> Option<(String, String)> {
    // whitespace runs count as a single space
    let collapsed = line
        .split(|c: char| c.is_ascii_whitespace())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let (name, value) = collapsed.split_once(':')?;
    let (name, value) = (name.trim(), value.trim());

    if name.is_empty() || value.is_empty() {
        return None;
    }

    Some((name.to_string(), value.to_string()))
}

/// Parses `key=value` pairs separated by `;`, as found in
/// `Content-Disposition` and `Content-Type`. Later duplicates win.
pub fn parse_parameters(input: &str) -> HashMap<String, String> {
    input
        .split(';')
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
