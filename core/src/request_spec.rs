/*
 * request_spec.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of jack-http-client, a mutual-TLS HTTP client for build tooling.
 *
 * jack-http-client is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * jack-http-client is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with jack-http-client.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Request specification built from command-line modifiers:
//! `header:Name=Value`, `data:text`, and `name=value` form fields.

use std::fs;
use std::path::PathBuf;

use tracing::warn;

const HEADER_PREFIX: &str = "header:";
const DATA_PREFIX: &str = "data:";
const EXPLICIT_FILE_PREFIX: char = '@';

/// How a form field's value is told apart as a file upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldMode {
    /// The value is a file upload when it names an existing regular file at encode time.
    /// A literal that happens to match a file path is uploaded as that file.
    #[default]
    Legacy,
    /// Only values written as `@path` are file uploads.
    Explicit,
}

/// One command-line modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    Header { name: String, value: String },
    Data(String),
    Field { name: String, value: String },
    Ignored(String),
}

impl Modifier {
    pub fn parse(token: &str) -> Modifier {
        if let Some(rest) = token.strip_prefix(HEADER_PREFIX) {
            return match rest.split_once('=') {
                Some((name, value)) if !name.is_empty() => Modifier::Header {
                    name: name.to_string(),
                    value: value.to_string(),
                },
                _ => Modifier::Ignored(token.to_string()),
            };
        }
        if let Some(rest) = token.strip_prefix(DATA_PREFIX) {
            return Modifier::Data(rest.to_string());
        }
        match token.split_once('=') {
            Some((name, value)) => Modifier::Field {
                name: name.to_string(),
                value: value.to_string(),
            },
            None => Modifier::Ignored(token.to_string()),
        }
    }
}

/// A form field as given on the command line; the file/literal decision is deferred to
/// `resolve`, which consults the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldArg {
    pub name: String,
    pub value: String,
}

/// A form field after dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Literal { name: String, text: String },
    FileUpload { name: String, path: PathBuf },
}

impl FormField {
    pub fn name(&self) -> &str {
        match self {
            FormField::Literal { name, .. } | FormField::FileUpload { name, .. } => name,
        }
    }
}

impl FieldArg {
    pub fn resolve(&self, mode: FieldMode) -> FormField {
        match mode {
            FieldMode::Legacy => {
                let is_file = fs::metadata(&self.value)
                    .map(|m| m.is_file())
                    .unwrap_or(false);
                if is_file {
                    FormField::FileUpload {
                        name: self.name.clone(),
                        path: PathBuf::from(&self.value),
                    }
                } else {
                    FormField::Literal {
                        name: self.name.clone(),
                        text: self.value.clone(),
                    }
                }
            }
            FieldMode::Explicit => match self.value.strip_prefix(EXPLICIT_FILE_PREFIX) {
                Some(path) => FormField::FileUpload {
                    name: self.name.clone(),
                    path: PathBuf::from(path),
                },
                None => FormField::Literal {
                    name: self.name.clone(),
                    text: self.value.clone(),
                },
            },
        }
    }
}

/// Method, target, ordered headers, optional raw body, ordered form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: String,
    pub url: String,
    /// Sent in this order; duplicates are kept.
    pub headers: Vec<(String, String)>,
    pub data: Option<String>,
    pub fields: Vec<FieldArg>,
}

impl RequestSpec {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            data: None,
            fields: Vec::new(),
        }
    }

    pub fn from_modifiers<S: AsRef<str>>(
        method: impl Into<String>,
        url: impl Into<String>,
        modifiers: &[S],
    ) -> Self {
        let mut spec = Self::new(method, url);
        for token in modifiers {
            spec.apply(Modifier::parse(token.as_ref()));
        }
        spec
    }

    pub fn apply(&mut self, modifier: Modifier) {
        match modifier {
            Modifier::Header { name, value } => self.headers.push((name, value)),
            Modifier::Data(text) => self.data = Some(text),
            Modifier::Field { name, value } => self.fields.push(FieldArg { name, value }),
            Modifier::Ignored(token) => warn!(token = %token, "ignoring unrecognised modifier"),
        }
    }

    /// Any form field switches the whole request to multipart; `data:` is then ignored.
    pub fn is_multipart(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn resolve_fields(&self, mode: FieldMode) -> Vec<FormField> {
        self.fields.iter().map(|f| f.resolve(mode)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn header_splits_on_first_equals() {
        assert_eq!(
            Modifier::parse("header:X-Query=a=b"),
            Modifier::Header {
                name: "X-Query".to_string(),
                value: "a=b".to_string()
            }
        );
        assert_eq!(
            Modifier::parse("header:X-Empty="),
            Modifier::Header {
                name: "X-Empty".to_string(),
                value: String::new()
            }
        );
    }

    #[test]
    fn header_without_name_or_equals_is_ignored() {
        assert!(matches!(Modifier::parse("header:=v"), Modifier::Ignored(_)));
        assert!(matches!(Modifier::parse("header:NoValue"), Modifier::Ignored(_)));
    }

    #[test]
    fn data_keeps_everything_after_prefix() {
        assert_eq!(Modifier::parse("data:a=b&c"), Modifier::Data("a=b&c".to_string()));
        assert_eq!(Modifier::parse("data:"), Modifier::Data(String::new()));
    }

    #[test]
    fn field_and_ignored_tokens() {
        assert_eq!(
            Modifier::parse("file=/tmp/x=y"),
            Modifier::Field {
                name: "file".to_string(),
                value: "/tmp/x=y".to_string()
            }
        );
        assert_eq!(
            Modifier::parse("=v"),
            Modifier::Field {
                name: String::new(),
                value: "v".to_string()
            }
        );
        assert_eq!(Modifier::parse("stray"), Modifier::Ignored("stray".to_string()));
    }

    #[test]
    fn from_modifiers_preserves_order_and_duplicates() {
        let spec = RequestSpec::from_modifiers(
            "PUT",
            "https://host/upload",
            &[
                "header:X-Id=1",
                "a=1",
                "header:X-Id=2",
                "data:first",
                "b=2",
                "data:second",
                "junk",
            ],
        );
        assert_eq!(
            spec.headers,
            vec![
                ("X-Id".to_string(), "1".to_string()),
                ("X-Id".to_string(), "2".to_string())
            ]
        );
        assert_eq!(spec.data.as_deref(), Some("second"));
        let names: Vec<&str> = spec.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(spec.is_multipart());
    }

    #[test]
    fn raw_body_alone_is_not_multipart() {
        let spec = RequestSpec::from_modifiers("POST", "https://h/", &["data:x"]);
        assert!(!spec.is_multipart());
    }

    #[test]
    fn legacy_mode_checks_filesystem() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"payload").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let existing = FieldArg {
            name: "file".to_string(),
            value: path.clone(),
        };
        assert_eq!(
            existing.resolve(FieldMode::Legacy),
            FormField::FileUpload {
                name: "file".to_string(),
                path: PathBuf::from(&path)
            }
        );
        let missing = FieldArg {
            name: "file".to_string(),
            value: "/nonexistent/jack/report.txt".to_string(),
        };
        assert!(matches!(missing.resolve(FieldMode::Legacy), FormField::Literal { .. }));
    }

    #[test]
    fn legacy_mode_treats_directory_as_literal() {
        let dir = tempfile::tempdir().unwrap();
        let arg = FieldArg {
            name: "d".to_string(),
            value: dir.path().to_str().unwrap().to_string(),
        };
        assert!(matches!(arg.resolve(FieldMode::Legacy), FormField::Literal { .. }));
    }

    #[test]
    fn explicit_mode_uses_prefix_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"payload").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let bare = FieldArg {
            name: "f".to_string(),
            value: path.clone(),
        };
        assert_eq!(
            bare.resolve(FieldMode::Explicit),
            FormField::Literal {
                name: "f".to_string(),
                text: path.clone()
            }
        );
        let prefixed = FieldArg {
            name: "f".to_string(),
            value: format!("@{}", path),
        };
        assert_eq!(
            prefixed.resolve(FieldMode::Explicit),
            FormField::FileUpload {
                name: "f".to_string(),
                path: PathBuf::from(&path)
            }
        );
    }
}
