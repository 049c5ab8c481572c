//! Section router: which page section is visible.
//!
//! Exactly one section is shown at a time. Hero sections lay out with flex,
//! all others with block, and hidden sections get `display: none`. The shown
//! section is marked for activation after [`ACTIVATION_DELAY`], which adds
//! the `active` class to it and its reveal-marked descendants; hidden
//! sections are rendered without it so their entry animation replays.

use std::time::Duration;

use crate::catalog::{Catalog, DEFAULT_SECTION, Product};

/// Delay before the shown section and its reveal elements become active.
pub const ACTIVATION_DELAY: Duration = Duration::from_millis(100);

/// CSS `display` value of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Flex,
    Block,
    None,
}

impl Display {
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Flex => "flex",
            Self::Block => "block",
            Self::None => "none",
        }
    }
}

/// Render state of one section.
#[derive(Debug, Clone)]
pub struct SectionView {
    pub id: String,
    pub title: String,
    pub hero: bool,
    pub tagline: Option<String>,
    pub body: Vec<String>,
    pub display: Display,
    pub collections: Vec<CollectionView>,
}

impl SectionView {
    /// Whether this is the visible section.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.display != Display::None
    }
}

/// Render state of a product grid.
#[derive(Debug, Clone)]
pub struct CollectionView {
    pub id: String,
    pub title: String,
    pub featured: Vec<Product>,
    pub more: Vec<Product>,
    /// "View all" was used: the remaining products are visible.
    pub expanded: bool,
}

impl CollectionView {
    /// Whether the remaining products are on display.
    #[must_use]
    pub fn shows_more(&self) -> bool {
        self.expanded && !self.more.is_empty()
    }

    /// Whether the "View all" control is on display.
    #[must_use]
    pub fn shows_view_all(&self) -> bool {
        !self.expanded && !self.more.is_empty()
    }
}

/// The whole section layout for one render.
#[derive(Debug, Clone)]
pub struct RouterView {
    /// Id of the visible section.
    pub current: String,
    pub sections: Vec<SectionView>,
}

impl RouterView {
    /// Activation delay in milliseconds, for the `data-activate-after`
    /// attribute.
    #[must_use]
    pub fn activation_delay_ms(&self) -> u128 {
        ACTIVATION_DELAY.as_millis()
    }
}

/// Derives [`RouterView`]s from the catalog.
pub struct SectionRouter<'a> {
    catalog: &'a Catalog,
}

impl<'a> SectionRouter<'a> {
    #[must_use]
    pub const fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// The section that will be shown for a requested id. Missing or unknown
    /// ids fall back to the default section.
    #[must_use]
    pub fn resolve(&self, requested: Option<&str>) -> &'a str {
        requested
            .and_then(|id| self.catalog.section(id))
            .map_or(DEFAULT_SECTION, |section| section.id.as_str())
    }

    /// Show `requested` and hide every other section. `expand` names a
    /// collection whose "View all" has been used.
    #[must_use]
    pub fn show(&self, requested: Option<&str>, expand: Option<&str>) -> RouterView {
        let current = self.resolve(requested);

        let sections = self
            .catalog
            .sections
            .iter()
            .map(|section| {
                let display = if section.id != current {
                    Display::None
                } else if section.hero {
                    Display::Flex
                } else {
                    Display::Block
                };

                let collections = section
                    .collections
                    .iter()
                    .filter_map(|id| self.catalog.collection(id))
                    .map(|collection| CollectionView {
                        id: collection.id.clone(),
                        title: collection.title.clone(),
                        featured: collection.featured_products().to_vec(),
                        more: collection.more_products().to_vec(),
                        expanded: expand == Some(collection.id.as_str()),
                    })
                    .collect();

                SectionView {
                    id: section.id.clone(),
                    title: section.title.clone(),
                    hero: section.hero,
                    tagline: section.tagline.clone(),
                    body: section.body.clone(),
                    display,
                    collections,
                }
            })
            .collect();

        RouterView {
            current: current.to_string(),
            sections,
        }
    }
}
