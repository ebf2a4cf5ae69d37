use serde::{Deserialize, Serialize};

/// Keys a new user starts with, in display order.
pub const DEFAULT_CATEGORIES: [&str; 9] = [
    "alimentacao",
    "transporte",
    "moradia",
    "saude",
    "educacao",
    "lazer",
    "vestuario",
    "servicos",
    "outros",
];

/// An open category identifier. Categories are user-extensible, so this is a
/// normalized key rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Build a category from free text: lowercased, with whitespace and
    /// hyphen runs collapsed into a single underscore.
    pub fn new(name: &str) -> Self {
        let mut key = String::with_capacity(name.len());
        let mut pending_separator = false;
        for c in name.trim().chars() {
            if c.is_whitespace() || c == '-' || c == '_' {
                pending_separator = true;
                continue;
            }
            if pending_separator && !key.is_empty() {
                key.push('_');
            }
            pending_separator = false;
            key.extend(c.to_lowercase());
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Human label. Defaults have a fixed label; anything else (including
    /// keys whose category was deleted) is title-cased from the key.
    pub fn label(&self) -> String {
        let known = match self.0.as_str() {
            "alimentacao" => Some("Alimentação"),
            "transporte" => Some("Transporte"),
            "moradia" => Some("Moradia"),
            "saude" => Some("Saúde"),
            "educacao" => Some("Educação"),
            "lazer" => Some("Lazer"),
            "vestuario" => Some("Vestuário"),
            "servicos" => Some("Serviços"),
            "outros" => Some("Outros"),
            _ => None,
        };
        if let Some(label) = known {
            return label.to_string();
        }

        self.0
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Category::new(name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    Empty,
    Duplicate(Category),
}

impl std::fmt::Display for CategoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryError::Empty => write!(f, "category name is empty"),
            CategoryError::Duplicate(category) => {
                write!(f, "category already exists: {}", category)
            }
        }
    }
}

impl std::error::Error for CategoryError {}

/// A user's ordered, editable category list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryList {
    categories: Vec<Category>,
}

impl Default for CategoryList {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|key| Category::new(key)).collect(),
        }
    }
}

impl CategoryList {
    pub fn from_keys(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.categories.contains(category)
    }

    /// Append a category, normalizing the name first.
    pub fn add(&mut self, name: &str) -> Result<Category, CategoryError> {
        let category = Category::new(name);
        if category.is_empty() {
            return Err(CategoryError::Empty);
        }
        if self.contains(&category) {
            return Err(CategoryError::Duplicate(category));
        }
        self.categories.push(category.clone());
        Ok(category)
    }

    /// Remove a category. Expenses already tagged with it are left alone.
    /// Returns false if the key was not in the list.
    pub fn remove(&mut self, category: &Category) -> bool {
        let before = self.categories.len();
        self.categories.retain(|c| c != category);
        self.categories.len() != before
    }
}
