//! ``src/model/favorites.rs``

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteLocation {
    pub name: String,
    pub path: PathBuf,
}

/// Ordered bookmarks, independent of navigation state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteLocations {
    locations: Vec<FavoriteLocation>,
}

impl FavoriteLocations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unless `path` is already bookmarked.
    pub fn add(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> bool {
        let path: PathBuf = path.into();
        if self.contains(&path) {
            return false;
        }

        self.locations.push(FavoriteLocation {
            name: name.into(),
            path,
        });
        true
    }

    pub fn remove(&mut self, path: &Path) -> Option<FavoriteLocation> {
        let idx: usize = self.locations.iter().position(|f| f.path == path)?;
        Some(self.locations.remove(idx))
    }

    /// Move the bookmark at `from` to position `to`.
    pub fn move_to(&mut self, from: usize, to: usize) -> bool {
        if from >= self.locations.len() || to >= self.locations.len() {
            return false;
        }

        let item: FavoriteLocation = self.locations.remove(from);
        self.locations.insert(to, item);
        true
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.locations.iter().any(|f| f.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FavoriteLocation> + '_ {
        self.locations.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_preserved_and_mutable() {
        let mut favorites = FavoriteLocations::new();
        assert!(favorites.add("home", "/home/user"));
        assert!(favorites.add("tmp", "/tmp"));
        assert!(!favorites.add("again", "/tmp"));

        assert!(favorites.move_to(1, 0));
        let names: Vec<&str> = favorites.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["tmp", "home"]);

        assert!(favorites.remove(Path::new("/tmp")).is_some());
        assert_eq!(favorites.len(), 1);
        assert!(!favorites.move_to(0, 3));
    }
}
