use std::collections::BTreeMap;

/// In-memory table of converted files, keyed by base file name (e.g. `items_main.csv`).
///
/// Built once by a [`crate::TableLoader`] and then frozen behind an `Arc` by the
/// [`crate::Redirector`]; nothing mutates it after that point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentMapping {
    files: BTreeMap<String, String>,
}

impl ContentMapping {
    pub fn new() -> Self {
        ContentMapping::default()
    }

    /// Add a file, returning the previous content if the name was already taken
    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) -> Option<String> {
        self.files.insert(name.into(), content.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// File names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Merge another mapping in, returning the names that were overwritten
    pub fn extend_from(&mut self, other: ContentMapping) -> Vec<String> {
        let mut replaced = Vec::new();
        for (name, content) in other.files {
            if self.files.insert(name.clone(), content).is_some() {
                replaced.push(name);
            }
        }
        replaced
    }
}

impl<K, V> FromIterator<(K, V)> for ContentMapping
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ContentMapping {
            files: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
