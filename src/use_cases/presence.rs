// Display-ready roster projection, recomputed on membership changes only.

use crate::domain::registry::EntityRegistry;
use crate::domain::state::PresenceEntry;

/// Projects the registry into an ordered `{id, display_name}` list.
///
/// Pure read: never writes back into the registry. Iteration order is the
/// registry's insertion order, so the list is stable across recomputations.
pub fn project_presence(registry: &EntityRegistry) -> Vec<PresenceEntry> {
    let mut entries = Vec::with_capacity(registry.len());
    registry.for_each(|entity| {
        entries.push(PresenceEntry {
            id: entity.id.clone(),
            display_name: entity.display_name.clone(),
        });
    });
    entries
}
