//! Product catalog shown on the home page.
//!
//! The catalog is a JSON file loaded once at startup:
//!
//! ```json
//! {
//!   "sections": [
//!     { "id": "home", "title": "Moon Bling", "hero": true, "tagline": "..." },
//!     { "id": "shop", "title": "Shop", "collections": ["rings", "necklaces"] }
//!   ],
//!   "collections": [
//!     { "id": "rings", "title": "Rings", "featured": 4,
//!       "products": [{ "name": "Crescent Ring", "price": "Rs. 1,200", "image": "/static/images/crescent-ring.jpeg" }] }
//!   ]
//! }
//! ```
//!
//! Sections appear in file order. The first `featured` products of a
//! collection are always shown; the rest sit behind "View all".

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Section shown when no (or an unknown) section is requested.
pub const DEFAULT_SECTION: &str = "home";

/// Errors loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: &'static str, id: String },

    #[error("section `{section}` references unknown collection `{collection}`")]
    UnknownCollection { section: String, collection: String },

    #[error("catalog must define a `{DEFAULT_SECTION}` section")]
    MissingDefaultSection,
}

/// The whole catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub sections: Vec<Section>,
    #[serde(default)]
    pub collections: Vec<Collection>,
}

/// A page section reachable from the navigation menu.
#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    /// Hero sections are laid out with flex instead of block.
    #[serde(default)]
    pub hero: bool,
    #[serde(default)]
    pub tagline: Option<String>,
    /// Paragraphs of free text.
    #[serde(default)]
    pub body: Vec<String>,
    /// Collection ids shown in this section, in order.
    #[serde(default)]
    pub collections: Vec<String>,
}

/// A product grid.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    pub id: String,
    pub title: String,
    /// Products shown before "View all".
    pub featured: usize,
    pub products: Vec<Product>,
}

/// A product card. These are exactly the values copied into a cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    pub name: String,
    /// Display price, e.g. `"Rs. 1,200"`.
    pub price: String,
    pub image: String,
}

impl Catalog {
    /// Load and validate a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read, is not valid JSON,
    /// or fails validation.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate catalog JSON.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on malformed JSON, duplicate ids, dangling
    /// collection references, or a missing default section.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut section_ids = HashSet::new();
        for section in &self.sections {
            if !section_ids.insert(section.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "section",
                    id: section.id.clone(),
                });
            }
        }
        if !section_ids.contains(DEFAULT_SECTION) {
            return Err(CatalogError::MissingDefaultSection);
        }

        let mut collection_ids = HashSet::new();
        for collection in &self.collections {
            if !collection_ids.insert(collection.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "collection",
                    id: collection.id.clone(),
                });
            }
        }

        for section in &self.sections {
            if let Some(missing) = section
                .collections
                .iter()
                .find(|id| !collection_ids.contains(id.as_str()))
            {
                return Err(CatalogError::UnknownCollection {
                    section: section.id.clone(),
                    collection: missing.clone(),
                });
            }
        }

        Ok(())
    }

    /// Look up a section.
    #[must_use]
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Look up a collection.
    #[must_use]
    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }
}

impl Collection {
    /// Products always on display.
    #[must_use]
    pub fn featured_products(&self) -> &[Product] {
        self.products
            .get(..self.featured.min(self.products.len()))
            .unwrap_or_default()
    }

    /// Products revealed by "View all".
    #[must_use]
    pub fn more_products(&self) -> &[Product] {
        self.products
            .get(self.featured.min(self.products.len())..)
            .unwrap_or_default()
    }
}
