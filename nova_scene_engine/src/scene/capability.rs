/// Capability table — typed component lookup by stable type id.
///
/// Answers "does this entity have component X, and which handle is it"
/// without runtime type inspection: component kinds are identified by a
/// stable `ComponentTypeId`, and handles round-trip through slotmap's
/// `KeyData`, so the typed view comes back as the caller's key type.
///
/// The entity back-reference is used for diagnostics and capability lookup
/// only, never for ownership.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, Key, KeyData};

new_key_type! {
    /// Identifier of a game object in the external object framework.
    pub struct EntityId;
}

/// Stable identifier for a component capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentTypeId(pub u32);

/// Capability granted by point-light components.
pub const POINT_LIGHT_CAPABILITY: ComponentTypeId = ComponentTypeId(1);
/// Capability granted by scene-visibility components.
pub const VISIBILITY_CAPABILITY: ComponentTypeId = ComponentTypeId(2);

/// Entity → component-handle table, keyed by capability id.
pub struct CapabilityTable {
    entries: FxHashMap<(EntityId, ComponentTypeId), KeyData>,
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Register `key` as the entity's component of the given capability,
    /// replacing any previous registration.
    pub fn register<K: Key>(&mut self, entity: EntityId, capability: ComponentTypeId, key: K) {
        self.entries.insert((entity, capability), key.data());
    }

    /// Remove a registration. Returns false if none existed.
    pub fn unregister(&mut self, entity: EntityId, capability: ComponentTypeId) -> bool {
        self.entries.remove(&(entity, capability)).is_some()
    }

    /// Typed lookup: the entity's component handle for this capability.
    ///
    /// The caller picks the key type; registering under one key type and
    /// looking up under another is a programming fault the table cannot
    /// detect, which is why capability ids are per component kind.
    pub fn lookup<K: Key>(&self, entity: EntityId, capability: ComponentTypeId) -> Option<K> {
        self.entries
            .get(&(entity, capability))
            .map(|data| K::from(*data))
    }

    pub fn has(&self, entity: EntityId, capability: ComponentTypeId) -> bool {
        self.entries.contains_key(&(entity, capability))
    }

    /// Drop every registration of an entity (entity left the world).
    pub fn clear_entity(&mut self, entity: EntityId) {
        self.entries.retain(|(e, _), _| *e != entity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;
