//! Dotted field paths.

use std::fmt;

use crate::error::FormError;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member.
    Key(String),
    /// Array element, written `[n]`.
    Index(usize),
}

/// A parsed field path such as `address.city` or `contacts[0].email`.
///
/// Object members are joined with `.`, array elements use `[n]`. The string
/// form is the key a leaf is stored under in a flattened value map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parses a path string.
    ///
    /// An empty string is the root path.
    pub fn parse(path: &str) -> Result<Self, FormError> {
        let mut segments = Vec::new();
        let mut key = String::new();
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if key.is_empty() && !matches!(segments.last(), Some(Segment::Index(_))) {
                        return Err(FormError::invalid_path(path, "empty segment"));
                    }
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    if chars.peek().is_none() {
                        return Err(FormError::invalid_path(path, "trailing '.'"));
                    }
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) if d.is_ascii_digit() => digits.push(d),
                            Some(_) => return Err(FormError::invalid_path(path, "non-numeric index")),
                            None => return Err(FormError::invalid_path(path, "unclosed '['")),
                        }
                    }
                    let index = digits
                        .parse()
                        .map_err(|_| FormError::invalid_path(path, "missing or oversized index"))?;
                    segments.push(Segment::Index(index));
                }
                _ => key.push(c),
            }
        }
        if !key.is_empty() {
            segments.push(Segment::Key(key));
        }

        Ok(Self { segments })
    }

    /// Returns the path segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Joins a child key onto a parent path string.
pub(crate) fn join_key(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Joins an array index onto a parent path string.
pub(crate) fn join_index(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

/// Returns `true` if `key` is `name` or lies underneath it.
pub(crate) fn is_same_or_descendant(key: &str, name: &str) -> bool {
    match key.strip_prefix(name) {
        Some(rest) => rest.is_empty() || rest.starts_with('.') || rest.starts_with('['),
        None => false,
    }
}
