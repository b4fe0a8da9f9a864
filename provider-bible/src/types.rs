//! Scripture API payloads

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ChapterResponse {
    #[serde(default)]
    pub verses: Vec<Verse>,
    /// Set instead of `verses` when the passage does not exist
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Verse {
    pub book_name: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

impl Verse {
    /// Stable id used for highlights: `"<book>:<chapter>:<verse>"`.
    pub fn id(&self) -> String {
        format!("{}:{}:{}", self.book_name, self.chapter, self.verse)
    }

    /// Display reference used for bookmarks: `"<book> <chapter>:<verse>"`.
    pub fn label(&self) -> String {
        format!("{} {}:{}", self.book_name, self.chapter, self.verse)
    }

    /// Verse text without the API's trailing newline.
    pub fn clean_text(&self) -> &str {
        self.text.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_chapter() {
        let body = r#"{
            "reference": "John 3",
            "verses": [
                {"book_id": "JHN", "book_name": "John", "chapter": 3, "verse": 16,
                 "text": "For God so loved the world...\n"}
            ],
            "translation_id": "web"
        }"#;
        let response: ChapterResponse = serde_json::from_str(body).unwrap();
        let verse = &response.verses[0];
        assert_eq!(verse.id(), "John:3:16");
        assert_eq!(verse.label(), "John 3:16");
        assert_eq!(verse.clean_text(), "For God so loved the world...");
        assert!(response.error.is_none());
    }

    #[test]
    fn test_decode_error_body() {
        let response: ChapterResponse = serde_json::from_str(r#"{"error": "not found"}"#).unwrap();
        assert!(response.verses.is_empty());
        assert_eq!(response.error.as_deref(), Some("not found"));
    }
}
