//! Autocomplete for the add-item form.
//!
//! Candidates are the names this machine has entered before (newest first)
//! followed by a fixed starter set of common groceries.

/// Remembered names kept in local state.
pub const MAX_REMEMBERED: usize = 200;

/// Suggestions shown under the input at once.
pub const MAX_MATCHES: usize = 5;

const STARTER_SUGGESTIONS: &[&str] = &[
    "Milk",
    "Bread",
    "Eggs",
    "Butter",
    "Cheese",
    "Yoghurt",
    "Bananas",
    "Apples",
    "Oranges",
    "Lemons",
    "Tomatoes",
    "Potatoes",
    "Onions",
    "Garlic",
    "Carrots",
    "Peppers",
    "Mushrooms",
    "Spinach",
    "Lettuce",
    "Cucumber",
    "Avocados",
    "Rice",
    "Pasta",
    "Flour",
    "Sugar",
    "Salt",
    "Olive oil",
    "Coffee",
    "Tea",
    "Orange juice",
    "Chicken",
    "Mince",
    "Bacon",
    "Salmon",
    "Tinned tomatoes",
    "Chickpeas",
    "Cereal",
    "Oats",
    "Toilet roll",
    "Washing up liquid",
    "Bin bags",
    "Toothpaste",
];

#[derive(Debug, Clone)]
pub struct Suggestions {
    remembered: Vec<String>,
    seed: Vec<String>,
}

impl Default for Suggestions {
    fn default() -> Self {
        Self::with_starters(Vec::new())
    }
}

impl Suggestions {
    /// Remembered names ahead of the starter set.
    pub fn with_starters(remembered: Vec<String>) -> Self {
        Self::new(
            remembered,
            STARTER_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Remembered names ahead of an explicit seed list.
    pub fn new(remembered: Vec<String>, seed: Vec<String>) -> Self {
        let mut deduped: Vec<String> = Vec::with_capacity(remembered.len().min(MAX_REMEMBERED));
        for name in remembered {
            let name = name.trim();
            if name.is_empty() || deduped.iter().any(|n| same_name(n, name)) {
                continue;
            }
            deduped.push(name.to_string());
            if deduped.len() == MAX_REMEMBERED {
                break;
            }
        }
        Self {
            remembered: deduped,
            seed,
        }
    }

    /// Parse the stored JSON array. Missing or malformed state yields no
    /// remembered names.
    pub fn from_stored(raw: Option<&str>) -> Self {
        let remembered = match raw {
            None => Vec::new(),
            Some(raw) => serde_json::from_str::<Vec<String>>(raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring malformed stored suggestions");
                Vec::new()
            }),
        };
        Self::with_starters(remembered)
    }

    pub fn remembered(&self) -> &[String] {
        &self.remembered
    }

    /// Move `name` to the front of the remembered names.
    pub fn remember(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.remembered.retain(|n| !same_name(n, name));
        self.remembered.insert(0, name.to_string());
        self.remembered.truncate(MAX_REMEMBERED);
    }

    /// Candidates that contain `input` (ignoring case) but are not equal to it,
    /// in suggestion order, at most [`MAX_MATCHES`].
    ///
    /// ```
    /// use shoplist::list::Suggestions;
    ///
    /// let s = Suggestions::new(vec![], vec!["Milk".into(), "Mint".into(), "Bread".into()]);
    /// assert_eq!(s.matching("mi"), vec!["Milk", "Mint"]);
    /// ```
    pub fn matching(&self, input: &str) -> Vec<&str> {
        let needle = input.to_lowercase();
        let mut out: Vec<&str> = Vec::with_capacity(MAX_MATCHES);

        for candidate in self.remembered.iter().chain(self.seed.iter()) {
            let lower = candidate.to_lowercase();
            if !lower.contains(&needle) || lower == needle {
                continue;
            }
            if out.iter().any(|seen| same_name(seen, candidate)) {
                continue;
            }
            out.push(candidate);
            if out.len() == MAX_MATCHES {
                break;
            }
        }

        out
    }
}

/// Case-insensitive name equality, Unicode-aware.
fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
