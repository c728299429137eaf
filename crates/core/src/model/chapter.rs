use crate::model::ids::{ChapterKey, ChapterKeyError};

/// A chapter with its display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    key: ChapterKey,
    title: String,
}

impl Chapter {
    #[must_use]
    pub fn new(key: ChapterKey, title: impl Into<String>) -> Self {
        Self {
            key,
            title: title.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &ChapterKey {
        &self.key
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Ordered list of chapters the app offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterCatalog {
    chapters: Vec<Chapter>,
}

const DEFAULT_CHAPTERS: [(&str, &str); 5] = [
    ("basics", "Nushu Basics"),
    ("history", "History"),
    ("geography", "Geography"),
    ("phonology", "Sounds and Glyphs"),
    ("heritage", "Heritage Protection and Fieldwork"),
];

impl ChapterCatalog {
    #[must_use]
    pub fn new(chapters: Vec<Chapter>) -> Self {
        Self { chapters }
    }

    /// Build a catalog from `(key, title)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `ChapterKeyError` for the first key that is not file-safe.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ChapterKeyError> {
        let chapters = pairs
            .into_iter()
            .map(|(key, title)| Ok(Chapter::new(ChapterKey::new(key)?, title)))
            .collect::<Result<Vec<_>, ChapterKeyError>>()?;
        Ok(Self { chapters })
    }

    #[must_use]
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    #[must_use]
    pub fn find(&self, key: &ChapterKey) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.key() == key)
    }

    /// Display title for a key, falling back to the key itself.
    #[must_use]
    pub fn title_of<'a>(&'a self, key: &'a ChapterKey) -> &'a str {
        self.find(key).map_or(key.as_str(), Chapter::title)
    }
}

impl Default for ChapterCatalog {
    fn default() -> Self {
        let chapters = DEFAULT_CHAPTERS
            .iter()
            .filter_map(|(key, title)| ChapterKey::new(*key).ok().map(|k| Chapter::new(k, *title)))
            .collect();
        Self { chapters }
    }
}
