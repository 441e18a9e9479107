use super::error::{Error, Result};
use super::relation::Relation;
use std::collections::HashMap;

/// The flat relation namespace an engine owns.
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub relations: HashMap<String, Relation>,
}

impl Database {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_relation(&mut self, relation: Relation) -> Result<()> {
        if self.relations.contains_key(&relation.name) {
            return Err(Error::AlreadyExists(relation.name));
        }
        self.relations.insert(relation.name.clone(), relation);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    #[must_use]
    pub fn get_relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn get_relation_mut(&mut self, name: &str) -> Option<&mut Relation> {
        self.relations.get_mut(name)
    }

    pub fn relation(&self, name: &str) -> Result<&Relation> {
        self.get_relation(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn relation_mut(&mut self, name: &str) -> Result<&mut Relation> {
        self.get_relation_mut(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn drop_relation(&mut self, name: &str) -> Result<Relation> {
        self.relations
            .remove(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Relation names in sorted order.
    #[must_use]
    pub fn relation_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.relations.keys().cloned().collect();
        names.sort();
        names
    }
}
