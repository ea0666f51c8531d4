//! Content-type lookup by file name suffix.

use std::collections::HashMap;
use std::path::Path;

/// Mapping from file extension to content type, in `mime.types` format.
///
/// Loaded once at startup and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct MimeTable {
    types: HashMap<String, String>,
}

impl MimeTable {
    /// Parses `type ext1 ext2 ...` lines. Blank lines and lines starting
    /// with `#` are skipped. A later line wins for a repeated extension.
    pub fn parse(text: &str) -> Self {
        let mut types = HashMap::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let Some(content_type) = fields.next() else {
                continue;
            };
            for ext in fields {
                types.insert(ext.to_string(), content_type.to_string());
            }
        }

        Self { types }
    }

    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Content type for a file name, judged by what follows its last `.`.
    pub fn lookup(&self, file_name: &str) -> Option<&str> {
        let (_, ext) = file_name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        self.types.get(ext).map(|t| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
