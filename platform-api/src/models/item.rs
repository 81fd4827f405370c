//! Item input validation

use super::ValidationError;

/// Matches the VARCHAR(255) `name` column
pub const MAX_ITEM_NAME_LEN: usize = 255;

/// Validated item name: non-empty, at most 255 characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemName(String);

impl ItemName {
    /// Create a new item name.
    ///
    /// # Example
    /// ```
    /// use platform_api::models::ItemName;
    ///
    /// assert!(ItemName::new("widget").is_ok());
    /// assert!(ItemName::new("").is_err());
    /// ```
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }

        if s.chars().count() > MAX_ITEM_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_ITEM_NAME_LEN,
            });
        }

        Ok(Self(s))
    }

    /// Skip validation, so tests can exercise store-side constraints.
    #[cfg(test)]
    pub(crate) fn new_unchecked(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated item ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: ItemName,
    pub description: Option<String>,
}
