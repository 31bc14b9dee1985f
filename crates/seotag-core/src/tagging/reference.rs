//! Built-in reference vocabulary.
//!
//! Duplicates across and within categories ("sunset", "ocean", "beach") are
//! intentional and kept as independent candidates.

use super::vocabulary::{TagCategory, TagVocabulary};

const REFERENCE: &[(&str, &[&str])] = &[
    (
        "Wildlife",
        &[
            "lion", "tiger", "elephant", "zebra", "savanna", "jungle", "predator", "prey",
            "monkey", "giraffe", "kangaroo", "penguin", "koala", "crocodile", "snake", "bird",
        ],
    ),
    (
        "Landscapes",
        &[
            "mountain", "forest", "ocean", "barn", "beach", "lake", "sunset", "waterfall",
            "lighthouse", "coastal", "desert", "valley", "canyon", "river", "cityscape",
            "skyscraper", "sunset", "sky", "golden hour", "beach", "ocean", "mountain", "nature",
            "scenic", "peaceful", "romantic", "warm", "glowing", "clouds", "silhouette",
            "desert sunset", "beach sunset", "mountain sunset", "city sunset", "rural sunset",
        ],
    ),
    (
        "Seasons",
        &[
            "summer", "winter", "spring", "autumn", "snow", "rain", "sunshine", "cloudy", "foggy",
        ],
    ),
    (
        "Objects",
        &[
            "car", "bike", "tree", "house", "building", "bridge", "road", "street", "lamp post",
            "keyboard", "laptop", "computer", "typing", "input device", "technology", "gadget",
            "office", "work", "productivity", "key", "qwerty", "wireless", "mechanical",
            "notebook", "ultrabook", "gaming", "macbook", "MacBookPro", "windows", "home office",
            "remote work", "travel", "coffee shop", "library", "classroom",
        ],
    ),
    (
        "Human",
        &[
            "Human standing", "Human walking", "Human running", "Human sitting", "Human smiling",
            "Portrait", "Face", "Eyes", "Smile", "Laughter",
        ],
    ),
    (
        "Cities",
        &[
            "New York", "Paris", "Tokyo", "London", "cityscape", "skyline", "metropolis", "urban",
            "Chicago", "Los Angeles", "Sydney", "Melbourne", "Bangkok", "Hong Kong",
        ],
    ),
    (
        "Flowers",
        &[
            "Rose", "Flower", "Bloom", "Floral", "Nature", "Petals", "Romantic", "Love", "Garden",
            "SpringFlowers", "FlowersOfTheDay", "FloralBeauty", "Botanical", "RosesAreRed",
            "FlowerLovers", "FragrantFlowers", "FreshBlooms", "RedRoses", "FlowerArrangement",
            "FloralArt", "Daisy", "Sunflower",
        ],
    ),
    (
        "Food",
        &[
            "pizza", "burger", "sushi", "tacos", "ice cream", "cake", "coffee", "tea", "wine",
            "beer", "restaurant", "kitchen", "cooking", "baking", "foodie", "delicious",
        ],
    ),
    (
        "Sports",
        &[
            "football", "basketball", "tennis", "baseball", "golf", "soccer", "cricket", "rugby",
            "boxing", "wrestling", "gym", "fitness", "workout", "exercise", "athletics",
        ],
    ),
    (
        "Music",
        &[
            "guitar", "piano", "drums", "music", "song", "singer", "band", "concert", "festival",
            "rock", "pop", "jazz", "classical", "hip hop", "rap",
        ],
    ),
    (
        "Travel",
        &[
            "airplane", "hotel", "beach", "city", "country", "passport", "suitcase", "backpack",
            "travel", "adventure", "explore", "wanderlust", "tourist", "vacation",
        ],
    ),
];

impl TagVocabulary {
    /// The built-in vocabulary of 11 categories.
    pub fn reference() -> Self {
        Self::from_static(REFERENCE)
    }

    /// Build from compiled-in data that is known to be valid.
    fn from_static(table: &[(&str, &[&str])]) -> Self {
        let categories = table
            .iter()
            .map(|(name, tags)| TagCategory::new(*name, tags.iter().copied()))
            .collect();
        Self::from_validated(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_categories() {
        let vocab = TagVocabulary::reference();
        let names: Vec<&str> = vocab.categories().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "Wildlife", "Landscapes", "Seasons", "Objects", "Human", "Cities", "Flowers",
                "Food", "Sports", "Music", "Travel"
            ]
        );
    }

    #[test]
    fn test_reference_passes_validation() {
        let vocab = TagVocabulary::reference();
        let revalidated = TagVocabulary::new(vocab.categories().to_vec()).unwrap();
        assert_eq!(revalidated, vocab);
    }

    #[test]
    fn test_reference_keeps_duplicates() {
        let flat = TagVocabulary::reference().flatten();
        assert_eq!(flat.len(), 201);
        assert_eq!(flat.iter().filter(|t| *t == "sunset").count(), 2);
        assert_eq!(flat.iter().filter(|t| *t == "ocean").count(), 2);
        assert_eq!(flat.iter().filter(|t| *t == "beach").count(), 3);
        assert_eq!(flat.first().map(String::as_str), Some("lion"));
        assert_eq!(flat.last().map(String::as_str), Some("vacation"));
    }
}
