// src/edit/registry.rs
//! Active-object arbitration: per variant family, at most one entity shows
//! interactive edit handles. Explicitly constructed registries, no globals.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::edit::cursor::EditHandle;
use crate::volume::core::{Placed, VolumeFamily};

/// Registered entities of one family plus the single active one.
#[derive(Default, Debug)]
pub struct FamilyRegistry {
    registered: Vec<Entity>,
    active: Option<Entity>,
}

impl FamilyRegistry {
    pub fn register(&mut self, entity: Entity) {
        if !self.registered.contains(&entity) {
            self.registered.push(entity);
        }
    }

    pub fn unregister(&mut self, entity: Entity) {
        self.registered.retain(|&e| e != entity);
        if self.active == Some(entity) {
            self.active = None;
        }
    }

    /// Make `entity` the single active one (or clear with `None`).
    /// Returns the previously active entity so callers can hide its handles.
    pub fn set_active(&mut self, entity: Option<Entity>) -> Option<Entity> {
        let prev = self.active;
        if let Some(e) = entity {
            self.register(e);
        }
        self.active = entity;
        prev
    }

    pub fn get_active(&self) -> Option<Entity> {
        self.active
    }

    pub fn registered(&self) -> &[Entity] {
        &self.registered
    }

    /// Drop entries whose backing entity no longer exists. Entities may be
    /// destroyed without explicit unregistration; this runs on next access.
    pub fn prune(&mut self, alive: impl Fn(Entity) -> bool) {
        self.registered.retain(|&e| alive(e));
        if let Some(active) = self.active {
            if !alive(active) {
                self.active = None;
            }
        }
    }
}

/// One registry per procedural-volume family, owned by the world as a
/// resource and handed to the systems that need it.
#[derive(Resource)]
pub struct ActiveRegistries {
    families: HashMap<VolumeFamily, FamilyRegistry>,
}

impl Default for ActiveRegistries {
    fn default() -> Self {
        let mut families = HashMap::with_capacity(VolumeFamily::ALL.len());
        for family in VolumeFamily::ALL {
            families.insert(family, FamilyRegistry::default());
        }
        Self { families }
    }
}

impl ActiveRegistries {
    pub fn family(&self, family: VolumeFamily) -> &FamilyRegistry {
        &self.families[&family]
    }

    pub fn family_mut(&mut self, family: VolumeFamily) -> &mut FamilyRegistry {
        self.families.entry(family).or_default()
    }

    pub fn register(&mut self, family: VolumeFamily, entity: Entity) {
        self.family_mut(family).register(entity);
    }

    pub fn unregister_everywhere(&mut self, entity: Entity) {
        for registry in self.families.values_mut() {
            registry.unregister(entity);
        }
    }

    pub fn set_active(&mut self, family: VolumeFamily, entity: Option<Entity>) -> Option<Entity> {
        self.family_mut(family).set_active(entity)
    }

    pub fn get_active(&self, family: VolumeFamily) -> Option<Entity> {
        self.family(family).get_active()
    }

    /// Whether the entity is the active one of any family.
    pub fn is_active(&self, entity: Entity) -> bool {
        self.families.values().any(|r| r.get_active() == Some(entity))
    }

    pub fn prune(&mut self, alive: impl Fn(Entity) -> bool) {
        for registry in self.families.values_mut() {
            registry.prune(&alive);
        }
    }
}

/// Last in the frame chain (input → recompute → bounds → registries): prune
/// stale entries and sync handle visibility so only the active entity of each
/// family shows interactive handles.
pub fn refresh_active_registries(
    mut registries: ResMut<ActiveRegistries>,
    placed: Query<(), With<Placed>>,
    mut handles: Query<(&EditHandle, &mut Visibility)>,
) {
    registries.prune(|e| placed.contains(e));

    for (handle, mut visibility) in handles.iter_mut() {
        let shown = registries.is_active(handle.owner);
        let want = if shown { Visibility::Inherited } else { Visibility::Hidden };
        if *visibility != want {
            *visibility = want;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_active_per_family_and_switching() {
        let mut reg = ActiveRegistries::default();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        reg.register(VolumeFamily::Wall, a);
        reg.register(VolumeFamily::Wall, b);

        assert_eq!(reg.set_active(VolumeFamily::Wall, Some(a)), None);
        assert_eq!(reg.get_active(VolumeFamily::Wall), Some(a));

        // switching reports the previous active entity (whose handles hide)
        assert_eq!(reg.set_active(VolumeFamily::Wall, Some(b)), Some(a));
        assert_eq!(reg.get_active(VolumeFamily::Wall), Some(b));
        assert!(reg.is_active(b));
        assert!(!reg.is_active(a));

        // clearing hides everything
        assert_eq!(reg.set_active(VolumeFamily::Wall, None), Some(b));
        assert_eq!(reg.get_active(VolumeFamily::Wall), None);
    }

    #[test]
    fn families_are_independent() {
        let mut reg = ActiveRegistries::default();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        reg.set_active(VolumeFamily::Wall, Some(a));
        reg.set_active(VolumeFamily::CornerBox, Some(b));
        assert_eq!(reg.get_active(VolumeFamily::Wall), Some(a));
        assert_eq!(reg.get_active(VolumeFamily::CornerBox), Some(b));
    }

    #[test]
    fn prune_tolerates_destroyed_entities() {
        let mut reg = ActiveRegistries::default();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        reg.register(VolumeFamily::Prop, a);
        reg.set_active(VolumeFamily::Prop, Some(b));

        // b was destroyed without unregistration
        reg.prune(|e| e == a);
        assert_eq!(reg.get_active(VolumeFamily::Prop), None);
        assert_eq!(reg.family(VolumeFamily::Prop).registered(), &[a]);
    }
}
