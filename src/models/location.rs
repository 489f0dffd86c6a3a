//! Location model and the static, ordered registry of locations to query

use serde::{Deserialize, Serialize};

/// One place whose weather is shown as a table row
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Location {
    /// Provider lookup key (free-text place name or provider city id)
    pub key: String,
    /// Human-readable place label
    pub display_name: String,
    /// Optional secondary label, e.g. the facility served by this place
    #[serde(default)]
    pub group_label: String,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            group_label: String::new(),
        }
    }

    /// Create location with a group label
    #[must_use]
    pub fn with_group(
        key: impl Into<String>,
        display_name: impl Into<String>,
        group_label: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            group_label: group_label.into(),
        }
    }
}

/// Ordered list of locations. Order determines row order in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRegistry {
    locations: Vec<Location>,
}

impl LocationRegistry {
    #[must_use]
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    /// First key that occurs more than once, if any
    #[must_use]
    pub fn duplicate_key(&self) -> Option<&str> {
        self.locations.iter().enumerate().find_map(|(i, loc)| {
            self.locations[..i]
                .iter()
                .any(|earlier| earlier.key == loc.key)
                .then_some(loc.key.as_str())
        })
    }
}

impl Default for LocationRegistry {
    fn default() -> Self {
        Self::new(default_locations())
    }
}

impl<'a> IntoIterator for &'a LocationRegistry {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.locations.iter()
    }
}

/// The seven mining-corridor sites the table was built for
#[must_use]
pub fn default_locations() -> Vec<Location> {
    vec![
        Location::with_group("Itabira", "Itabira, MG", "Cauê, Conceição e Minas do Meio"),
        Location::with_group("Ouro Preto", "Ouro Preto, MG", "Capanema"),
        Location::with_group("Rio Piracicaba", "Rio Piracicaba, MG", "Água Limpa"),
        Location::with_group(
            "São Gonçalo do Rio Abaixo",
            "São Gonçalo do Rio Abaixo, MG",
            "Brucutu",
        ),
        Location::with_group(
            "Mariana",
            "Mariana, MG",
            "Fábrica Nova, Fazendão, Timbopeba e Alegria",
        ),
        Location::with_group("Sabará", "Sabará, MG", "Córrego do Meio"),
        Location::with_group("Barão de Cocais", "Barão de Cocais, MG", "Gongo Soco"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_order() {
        let registry = LocationRegistry::default();
        assert_eq!(registry.len(), 7);
        let keys: Vec<&str> = registry.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys[0], "Itabira");
        assert_eq!(keys[6], "Barão de Cocais");
        assert!(registry.duplicate_key().is_none());
    }

    #[test]
    fn test_duplicate_key_detection() {
        let registry = LocationRegistry::new(vec![
            Location::new("Mariana", "Mariana, MG"),
            Location::new("Sabará", "Sabará, MG"),
            Location::new("Mariana", "Mariana again"),
        ]);
        assert_eq!(registry.duplicate_key(), Some("Mariana"));
    }

    #[test]
    fn test_location_without_group_label() {
        let location = Location::new("Itabira,br", "Itabira, MG");
        assert!(location.group_label.is_empty());
    }
}
