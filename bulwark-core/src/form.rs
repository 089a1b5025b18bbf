//! Form processing and multipart support

use crate::{Error, Result};
use memchr::memmem;
use std::collections::HashMap;

/// Default upper bound for a multipart body held in memory (32 MiB).
pub const DEFAULT_MULTIPART_LIMIT: usize = 32 << 20;

/// Decoded form fields.
///
/// A field may repeat; accessors return the first value unless stated otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    values: HashMap<String, Vec<String>>,
}

impl Form {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` body
    pub fn from_urlencoded(body: &[u8]) -> Result<Self> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| Error::BadRequest(format!("Failed to parse form data: {}", e)))?;

        Ok(pairs.into_iter().collect())
    }

    /// First value of `key`, or `default` when the field is absent.
    pub fn string<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
            .unwrap_or(default)
    }

    /// All values submitted under `key`
    pub fn strings(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check whether a field was submitted
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Append a value to `key`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Number of distinct field names
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for Form {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut form = Form::new();
        for (key, value) in iter {
            form.insert(key, value);
        }
        form
    }
}

/// Uploaded file data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    /// Original filename
    pub filename: String,

    /// Content type (MIME type)
    pub content_type: String,

    /// File size in bytes
    pub size: usize,

    /// File data
    pub data: Vec<u8>,
}

impl FormFile {
    /// Create a new form file
    pub fn new(filename: String, content_type: String, data: Vec<u8>) -> Self {
        let size = data.len();
        Self {
            filename,
            content_type,
            size,
            data,
        }
    }
}

/// A parsed `multipart/form-data` body: text fields plus uploaded files.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    /// Text fields
    pub form: Form,

    /// Files keyed by field name
    pub files: HashMap<String, Vec<FormFile>>,
}

impl MultipartForm {
    /// Files submitted under `key`
    pub fn files(&self, key: &str) -> &[FormFile] {
        self.files.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Multipart form data parser
#[derive(Debug, Clone)]
pub struct MultipartParser {
    boundary: String,
    max_bytes: usize,
}

impl MultipartParser {
    /// Create a new multipart parser from a Content-Type header
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        // Example: "multipart/form-data; boundary=----WebKitFormBoundary7MA4YWxkTrZu0gW"
        let boundary = content_type
            .split(';')
            .find_map(|part| {
                part.trim()
                    .strip_prefix("boundary=")
                    .map(|b| b.trim_matches('"').to_string())
            })
            .filter(|b| !b.is_empty())
            .ok_or_else(|| Error::BadRequest("Missing boundary in Content-Type".to_string()))?;

        Ok(Self {
            boundary,
            max_bytes: DEFAULT_MULTIPART_LIMIT,
        })
    }

    /// Reject bodies larger than `max_bytes`
    pub fn with_limit(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Parse multipart form data
    pub fn parse(&self, body: &[u8]) -> Result<MultipartForm> {
        if body.len() > self.max_bytes {
            return Err(Error::PayloadTooLarge(format!(
                "multipart body of {} bytes exceeds limit of {} bytes",
                body.len(),
                self.max_bytes
            )));
        }

        // Delimiters only count at the start of a line
        let delimiter = format!("\r\n--{}", self.boundary);
        let finder = memmem::Finder::new(delimiter.as_bytes());
        let opening = &delimiter.as_bytes()[2..];

        let first = if body.starts_with(opening) {
            0
        } else {
            finder
                .find(body)
                .map(|pos| pos + 2)
                .ok_or_else(|| Error::BadRequest("Multipart boundary not found".to_string()))?
        };

        let mut form = MultipartForm::default();
        let mut cursor = first + opening.len();

        loop {
            let rest = &body[cursor..];
            if rest.starts_with(b"--") {
                return Ok(form);
            }

            let rest = strip_line_break(rest)
                .ok_or_else(|| Error::BadRequest("Malformed multipart boundary line".to_string()))?;
            let part_start = body.len() - rest.len();

            let next = finder
                .find(rest)
                .map(|offset| part_start + offset)
                .ok_or_else(|| Error::BadRequest("Unterminated multipart body".to_string()))?;

            self.parse_part(&body[part_start..next], &mut form)?;
            cursor = next + delimiter.len();
        }
    }

    /// Parse a single multipart part
    fn parse_part(&self, part: &[u8], form: &mut MultipartForm) -> Result<()> {
        let (head, content) = split_head(part)
            .ok_or_else(|| Error::BadRequest("Multipart part without headers".to_string()))?;

        let head = std::str::from_utf8(head)
            .map_err(|_| Error::BadRequest("Multipart headers are not UTF-8".to_string()))?;

        let mut name = None;
        let mut filename = None;
        let mut content_type = None;

        for line in head.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };

            if key.trim().eq_ignore_ascii_case("content-disposition") {
                for attr in value.split(';') {
                    let attr = attr.trim();
                    if let Some(v) = attr.strip_prefix("name=") {
                        name = Some(v.trim_matches('"').to_string());
                    } else if let Some(v) = attr.strip_prefix("filename=") {
                        filename = Some(v.trim_matches('"').to_string());
                    }
                }
            } else if key.trim().eq_ignore_ascii_case("content-type") {
                content_type = Some(value.trim().to_string());
            }
        }

        let name = name.ok_or_else(|| Error::BadRequest("Missing field name".to_string()))?;

        match filename {
            Some(filename) => {
                let file = FormFile::new(
                    filename,
                    content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
                    content.to_vec(),
                );
                form.files.entry(name).or_default().push(file);
            }
            None => {
                let value = String::from_utf8(content.to_vec())
                    .map_err(|_| Error::BadRequest(format!("Field '{}' is not UTF-8", name)))?;
                form.form.insert(name, value);
            }
        }

        Ok(())
    }
}

fn strip_line_break(bytes: &[u8]) -> Option<&[u8]> {
    bytes
        .strip_prefix(b"\r\n")
        .or_else(|| bytes.strip_prefix(b"\n"))
}

fn split_head(part: &[u8]) -> Option<(&[u8], &[u8])> {
    if let Some(pos) = memmem::find(part, b"\r\n\r\n") {
        return Some((&part[..pos], &part[pos + 4..]));
    }
    memmem::find(part, b"\n\n").map(|pos| (&part[..pos], &part[pos + 2..]))
}
