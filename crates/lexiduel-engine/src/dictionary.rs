//! The dictionary collaborator.
//!
//! Word lookup lives outside the engine (a remote word table with a
//! local fallback in the shipping game). The engine only needs the
//! [`Dictionary`] trait; both methods may fail, and word scoring treats
//! a failure as "needs manual validation" rather than an error — an
//! incomplete or unreachable dictionary must never block a round.

use std::collections::{HashMap, HashSet};

use lexiduel_protocol::CategoryId;

/// A word category ("Fruit", "Animal", …).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Errors from the dictionary collaborator.
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    /// The lookup backend could not be reached or answered garbage.
    #[error("dictionary unavailable: {0}")]
    Unavailable(String),
}

/// Word lookup interface.
pub trait Dictionary: Send + Sync + 'static {
    /// The categories a round is played over.
    async fn categories(&self) -> Result<Vec<Category>, DictionaryError>;

    /// Whether `word` is a known member of the category.
    /// Implementations normalize before comparing.
    async fn validate_word(
        &self,
        word: &str,
        category_id: CategoryId,
    ) -> Result<bool, DictionaryError>;
}

/// Lowercases, trims, and strips accents so "Éléphant " matches
/// "elephant".
pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase().chars().map(strip_accent).collect()
}

fn strip_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ä' | 'ã' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ÿ' => 'y',
        _ => c,
    }
}

// ---------------------------------------------------------------------------
// StaticDictionary
// ---------------------------------------------------------------------------

/// An in-memory dictionary over normalized word lists.
///
/// This is the offline fallback shape: a fixed set of categories, each
/// with its known words. Used by tests and the demo; a production
/// client would put its remote lookup behind the same trait.
#[derive(Debug, Default)]
pub struct StaticDictionary {
    categories: Vec<Category>,
    words: HashMap<CategoryId, HashSet<String>>,
}

impl StaticDictionary {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a category and its word list (normalized on insert).
    pub fn with_category(
        mut self,
        id: CategoryId,
        name: &str,
        words: &[&str],
    ) -> Self {
        self.categories.push(Category {
            id,
            name: name.to_string(),
        });
        self.words
            .insert(id, words.iter().map(|w| normalize_word(w)).collect());
        self
    }
}

impl Dictionary for StaticDictionary {
    async fn categories(&self) -> Result<Vec<Category>, DictionaryError> {
        Ok(self.categories.clone())
    }

    async fn validate_word(
        &self,
        word: &str,
        category_id: CategoryId,
    ) -> Result<bool, DictionaryError> {
        let normalized = normalize_word(word);
        Ok(self
            .words
            .get(&category_id)
            .is_some_and(|set| set.contains(&normalized)))
    }
}
