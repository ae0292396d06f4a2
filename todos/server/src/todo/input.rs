//! Validated inputs for todo operations.

/// Message shown when a todo title is missing.
pub const EMPTY_TITLE_MESSAGE: &str = "Please enter a todo";
/// Message shown when a todo id is not a UUID.
pub const INVALID_ID_MESSAGE: &str = "Invalid todo id";

/// A todo title that is known to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoTitle(String);

impl TodoTitle {
    /// Trims surrounding whitespace and rejects empty titles.
    pub fn parse(raw: &str) -> Result<Self, &'static str> {
        let title = raw.trim();
        if title.is_empty() {
            return Err(EMPTY_TITLE_MESSAGE);
        }
        Ok(Self(title.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// A todo identifier in canonical hyphenated UUID form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoId(String);

impl TodoId {
    pub fn parse(raw: &str) -> Result<Self, &'static str> {
        uuid::Uuid::parse_str(raw.trim())
            .map(|id| Self(id.to_string()))
            .map_err(|_| INVALID_ID_MESSAGE)
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
