//! Passage references such as `"John 3:16"` or `"1 Corinthians 13"`.

use std::fmt;
use std::str::FromStr;

use crate::error::{BibleError, Result};

/// Book, chapter and optional verse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub book: String,
    pub chapter: u32,
    pub verse: Option<u32>,
}

impl Reference {
    pub fn chapter(book: impl Into<String>, chapter: u32) -> Self {
        Self {
            book: normalize_book(&book.into()),
            chapter,
            verse: None,
        }
    }

    pub fn with_verse(mut self, verse: u32) -> Self {
        self.verse = Some(verse);
        self
    }

    /// Parse `"<book> <chapter>[:<verse>]"`. Book names are case-insensitive
    /// and may contain spaces.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (book, location) = trimmed
            .rsplit_once(char::is_whitespace)
            .ok_or_else(|| BibleError::invalid(input, "expected '<book> <chapter>[:<verse>]'"))?;

        let book = book.split_whitespace().collect::<Vec<_>>().join(" ");
        if book.is_empty() {
            return Err(BibleError::invalid(input, "missing book name"));
        }

        let (chapter, verse) = match location.split_once(':') {
            Some((chapter, verse)) => (chapter, Some(verse)),
            None => (location, None),
        };
        let chapter = parse_number(input, chapter, "chapter")?;
        let verse = verse
            .map(|v| parse_number(input, v, "verse"))
            .transpose()?;

        Ok(Self {
            book: normalize_book(&book),
            chapter,
            verse,
        })
    }

    /// Path segment for the scripture API, e.g. `1+John+3`.
    pub fn api_path(&self) -> String {
        format!("{}+{}", self.book.replace(' ', "+"), self.chapter)
    }
}

impl FromStr for Reference {
    type Err = BibleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verse {
            Some(verse) => write!(f, "{} {}:{}", self.book, self.chapter, verse),
            None => write!(f, "{} {}", self.book, self.chapter),
        }
    }
}

fn parse_number(input: &str, value: &str, field: &str) -> Result<u32> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(BibleError::invalid(
            input,
            format!("{field} must be a positive number"),
        )),
    }
}

/// Title-case each word; "psalm" becomes "Psalms".
pub fn normalize_book(book: &str) -> String {
    let lower = book.trim().to_lowercase();
    if lower == "psalm" {
        return "Psalms".to_string();
    }

    lower
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
