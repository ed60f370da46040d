//! Controlled interest vocabulary: the predefined list and the synonym table.
//!
//! Both are plain data. Swap or extend them without touching the
//! normalization logic.

use std::collections::HashMap;

/// Interests offered to every user, in display order.
pub const PREDEFINED_INTERESTS: &[&str] = &[
    "Hiking", "Running", "Cycling", "Yoga", "Fitness", "Sports",
    "Basketball", "Soccer", "Tennis", "Golf", "Swimming", "Climbing",
    "Board Games", "Video Games", "Chess", "Cards", "Puzzles",
    "Reading", "Writing", "Poetry", "Book Club", "Journaling",
    "Cooking", "Baking", "Wine Tasting", "Coffee", "Foodie",
    "Photography", "Art", "Painting", "Drawing", "Crafts",
    "Music", "Guitar", "Piano", "Singing", "Dancing", "DJ",
    "Movies", "Theater", "Comedy", "Concerts", "Festivals",
    "Travel", "Camping", "Fishing", "Hunting", "Kayaking",
    "Gardening", "Plants", "Volunteering", "Charity", "Community",
    "Technology", "Coding", "Startups", "Crypto", "AI",
    "Investing", "Real Estate", "Business", "Entrepreneurship",
    "Meditation", "Spirituality", "Mindfulness", "Self-Improvement",
    "Language Learning", "Culture", "History", "Science",
    "Pets", "Dogs", "Cats", "Animals", "Nature",
    "Fashion", "Style", "Beauty", "Makeup", "Shopping",
    "Anime", "Comics", "Cosplay", "Sci-Fi", "Fantasy",
    "Politics", "Activism", "Environment", "Sustainability",
];

/// Title-cased variant → canonical interest.
const BUILTIN_SYNONYMS: &[(&str, &str)] = &[
    ("Hike", "Hiking"),
    ("Hikes", "Hiking"),
    ("Nature Walks", "Hiking"),
    ("Run", "Running"),
    ("Runs", "Running"),
    ("Jog", "Running"),
    ("Jogging", "Running"),
    ("Bike", "Cycling"),
    ("Biking", "Cycling"),
    ("Boardgames", "Board Games"),
    ("Tabletop Games", "Board Games"),
    ("Video Gaming", "Video Games"),
    ("Gaming", "Video Games"),
    ("Cook", "Cooking"),
    ("Bake", "Baking"),
    ("Photo", "Photography"),
    ("Photos", "Photography"),
    ("Paint", "Painting"),
    ("Draw", "Drawing"),
    ("Dog", "Dogs"),
    ("Cat", "Cats"),
    ("Tech", "Technology"),
    ("Code", "Coding"),
    ("Programming", "Coding"),
    ("Meditate", "Meditation"),
    ("Garden", "Gardening"),
    ("Camp", "Camping"),
    ("Fish", "Fishing"),
    ("Movie", "Movies"),
    ("Film", "Movies"),
    ("Films", "Movies"),
];

/// Immutable many-to-one mapping from title-cased variants to canonical
/// interests.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    entries: HashMap<String, String>,
}

impl SynonymTable {
    /// The table shipped with the app.
    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN_SYNONYMS.iter().copied())
    }

    /// Build a table from `(variant, canonical)` pairs. Later pairs win.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let entries = pairs
            .into_iter()
            .map(|(variant, canonical)| (variant.to_string(), canonical.to_string()))
            .collect();
        Self { entries }
    }

    /// Canonical form for an already title-cased variant.
    pub fn canonical(&self, title_cased: &str) -> Option<&str> {
        self.entries.get(title_cased).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
