// The authoritative in-memory mapping of participant identity to entity state.
//
// The registry is the only shared mutable state in the engine. Write access is
// limited to the session loop, which applies both decoded protocol events and
// per-frame advances; everything else consumes read-only projections.

use crate::domain::state::Entity;

#[derive(Debug, PartialEq, Eq)]
pub enum RegistryError {
    // A second, different identity was offered as the local entity.
    LocalAlreadyAssigned { current: String, attempted: String },
}

/// Insertion-ordered entity store keyed by session identity.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    local_id: Option<String>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entity` unless its id is already present.
    ///
    /// Idempotent: a duplicate `current`/`join` delivery leaves the existing
    /// entry untouched. Returns true when a new entry was created.
    pub fn upsert(&mut self, mut entity: Entity) -> bool {
        if self.contains(&entity.id) {
            return false;
        }
        entity.is_local = self.local_id.as_deref() == Some(entity.id.as_str());
        self.entities.push(entity);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Removes the entity with `id`, returning it. No-op when absent, which
    /// absorbs duplicate `leave` deliveries and leave/move races.
    pub fn remove(&mut self, id: &str) -> Option<Entity> {
        let index = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(index))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.iter().any(|e| e.id == id)
    }

    /// Marks `id` as the local participant.
    ///
    /// Assigned at most once per session: repeating the same id is accepted,
    /// a different id is a protocol violation surfaced to the caller.
    pub fn set_local(&mut self, id: &str) -> Result<(), RegistryError> {
        if let Some(current) = &self.local_id {
            if current != id {
                return Err(RegistryError::LocalAlreadyAssigned {
                    current: current.clone(),
                    attempted: id.to_string(),
                });
            }
            return Ok(());
        }

        self.local_id = Some(id.to_string());
        if let Some(entity) = self.get_mut(id) {
            entity.is_local = true;
        }
        Ok(())
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn local(&self) -> Option<&Entity> {
        let id = self.local_id.as_deref()?;
        self.get(id)
    }

    pub fn for_each(&self, mut f: impl FnMut(&Entity)) {
        for entity in &self.entities {
            f(entity);
        }
    }

    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut Entity)) {
        for entity in &mut self.entities {
            f(entity);
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
