//! The set of live pets, keyed by ID.
//!
//! Ordered by ID so iteration, rendering and saves are deterministic.

use std::collections::BTreeMap;

use pawz_core::error::{PawzError, Result};
use pawz_core::types::{PetId, Species};
use pawz_core::PetRecord;

/// Exclusive owner of every [`PetRecord`].
#[derive(Debug, Default)]
pub struct PetRegistry {
    pets: BTreeMap<PetId, PetRecord>,
}

impl PetRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pet`.
    ///
    /// # Errors
    /// [`PawzError::DuplicatePet`] if a pet with the same name (case-insensitive)
    /// and species exists.
    pub fn insert(&mut self, pet: PetRecord) -> Result<PetId> {
        if self.find(&pet.name, pet.species).is_some() {
            return Err(PawzError::DuplicatePet {
                name: pet.name,
                species: pet.species,
            });
        }
        let id = pet.id;
        self.pets.insert(id, pet);
        Ok(id)
    }

    /// Replace the whole set, e.g. after a load.
    pub fn replace_all(&mut self, pets: impl IntoIterator<Item = PetRecord>) {
        self.pets = pets.into_iter().map(|p| (p.id, p)).collect();
    }

    /// Unregister and return a pet.
    ///
    /// # Errors
    /// [`PawzError::PetNotFound`] for an unknown ID.
    pub fn remove(&mut self, id: PetId) -> Result<PetRecord> {
        self.pets.remove(&id).ok_or(PawzError::PetNotFound(id))
    }

    /// Look a pet up.
    #[must_use]
    pub fn get(&self, id: PetId) -> Option<&PetRecord> {
        self.pets.get(&id)
    }

    /// Look a pet up for mutation.
    ///
    /// # Errors
    /// [`PawzError::PetNotFound`] for an unknown ID.
    pub fn get_mut(&mut self, id: PetId) -> Result<&mut PetRecord> {
        self.pets.get_mut(&id).ok_or(PawzError::PetNotFound(id))
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: PetId) -> bool {
        self.pets.contains_key(&id)
    }

    /// Find a pet by name and species.
    #[must_use]
    pub fn find(&self, name: &str, species: Species) -> Option<&PetRecord> {
        let name = name.trim();
        self.pets
            .values()
            .find(|p| p.species == species && p.name.eq_ignore_ascii_case(name))
    }

    /// Pets in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &PetRecord> {
        self.pets.values()
    }

    /// Mutable pets in ID order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PetRecord> {
        self.pets.values_mut()
    }

    /// Number of pets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pets.len()
    }

    /// Whether there are no pets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pawz_core::config::MoodConfig;
    use pawz_core::types::Position;

    fn pet(name: &str, species: Species) -> PetRecord {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).single().expect("valid time");
        PetRecord::new(name, species, Position::default(), &MoodConfig::default(), t0)
    }

    #[test]
    fn duplicate_name_and_species_rejected() {
        let mut registry = PetRegistry::new();
        registry.insert(pet("Clucky", Species::Chicken)).expect("first");
        let err = registry.insert(pet("clucky", Species::Chicken)).expect_err("duplicate");
        assert!(matches!(err, PawzError::DuplicatePet { .. }));
        // Same name, other species is fine.
        registry.insert(pet("Clucky", Species::Duck)).expect("different species");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_unknown_is_not_found() {
        let mut registry = PetRegistry::new();
        let id = registry.insert(pet("Rex", Species::Dog)).expect("insert");
        registry.remove(id).expect("remove");
        assert!(matches!(registry.remove(id), Err(PawzError::PetNotFound(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn iteration_is_ordered_by_id() {
        let mut registry = PetRegistry::new();
        for name in ["a", "b", "c", "d"] {
            registry.insert(pet(name, Species::Cat)).expect("insert");
        }
        let ids: Vec<PetId> = registry.iter().map(|p| p.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
