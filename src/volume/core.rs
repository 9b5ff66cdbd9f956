// src/volume/core.rs
//! Core types for control-point-parameterized procedural volumes.
//! Keep this file dependency-light; generators and systems build on it.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::templates::{TemplateId, VolumeVariantDef};
use crate::volume::wall::WallState;

// ---------- Ids & placed-entity bookkeeping ----------

/// Stable identity of a placed entity; survives save/load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedId(pub u64);

/// Monotonic id source. Restored above the highest loaded id after a scene load.
#[derive(Resource, Clone, Copy, Debug)]
pub struct PlacedIdAllocator {
    next: u64,
}

impl Default for PlacedIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl PlacedIdAllocator {
    pub fn alloc(&mut self) -> PlacedId {
        let id = PlacedId(self.next);
        self.next += 1;
        id
    }

    /// Ensure future ids stay above everything already in the scene.
    pub fn reserve_through(&mut self, id: PlacedId) {
        self.next = self.next.max(id.0 + 1);
    }
}

/// Which edit-handle family an entity belongs to. One active-object registry
/// exists per family; plain props share the `Prop` family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeFamily {
    CornerBox,
    Partition,
    Wall,
    HeightBox,
    ChunkFill,
    Prop,
}

impl VolumeFamily {
    pub const ALL: [VolumeFamily; 6] = [
        VolumeFamily::CornerBox,
        VolumeFamily::Partition,
        VolumeFamily::Wall,
        VolumeFamily::HeightBox,
        VolumeFamily::ChunkFill,
        VolumeFamily::Prop,
    ];

    pub fn of(variant: Option<VolumeVariantDef>) -> Self {
        match variant {
            Some(VolumeVariantDef::CornerBox) => VolumeFamily::CornerBox,
            Some(VolumeVariantDef::Partition) => VolumeFamily::Partition,
            Some(VolumeVariantDef::Wall) => VolumeFamily::Wall,
            Some(VolumeVariantDef::HeightBox) => VolumeFamily::HeightBox,
            Some(VolumeVariantDef::ChunkFill) => VolumeFamily::ChunkFill,
            None => VolumeFamily::Prop,
        }
    }
}

/// Marker on every committed entity in the world.
#[derive(Component, Clone, Copy, Debug)]
pub struct Placed {
    pub id: PlacedId,
    pub template: TemplateId,
    pub family: VolumeFamily,
}

/// Runtime index of placed entities by stable id.
#[derive(Resource, Default)]
pub struct PlacedIndex {
    by_id: HashMap<u64, Entity>,
}

impl PlacedIndex {
    pub fn insert(&mut self, id: PlacedId, ent: Entity) {
        self.by_id.insert(id.0, ent);
    }

    pub fn remove(&mut self, id: PlacedId) {
        self.by_id.remove(&id.0);
    }

    pub fn get(&self, id: PlacedId) -> Option<Entity> {
        self.by_id.get(&id.0).copied()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }
}

// ---------- Size clamping ----------

/// Component-wise size clamp; every derived volume size stays inside it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SizeClamp {
    pub min: Vec3,
    pub max: Vec3,
}

impl SizeClamp {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn apply(&self, size: Vec3) -> Vec3 {
        size.clamp(self.min, self.max)
    }
}

impl Default for SizeClamp {
    fn default() -> Self {
        Self { min: Vec3::splat(0.25), max: Vec3::new(20.0, 10.0, 20.0) }
    }
}

// ---------- Volume state ----------

/// Variant-tagged control-point state. Geometry is fully regenerated from this
/// on every recompute, never patched.
#[derive(Clone, Debug, PartialEq)]
pub enum VolumeKind {
    /// One corner control point; `size = (|x|*2, |y|, |z|*2)`. Shared by the
    /// ground cuboid and the interior partition templates.
    CornerBox { point: Vec3 },
    /// One XZ footprint point plus two independently draggable heights.
    HeightBox { footprint: Vec3, height_a: f32, height_b: f32 },
    /// Ordered bottom points (y = 0) sharing one wall height.
    Wall(WallState),
    /// One XYZ point giving the requested fill size (symmetric X/Z, one-sided Y).
    ChunkFill { point: Vec3 },
}

impl VolumeKind {
    /// Hard-coded starting control points per variant; also the fallback for
    /// corrupt or zero-valued saved data.
    pub fn default_for(variant: VolumeVariantDef) -> Self {
        match variant {
            VolumeVariantDef::CornerBox => VolumeKind::CornerBox { point: Vec3::new(0.75, 1.0, 0.75) },
            VolumeVariantDef::Partition => VolumeKind::CornerBox { point: Vec3::new(1.0, 1.2, 0.15) },
            VolumeVariantDef::HeightBox => {
                VolumeKind::HeightBox { footprint: Vec3::new(0.75, 0.0, 0.75), height_a: 1.0, height_b: 0.5 }
            }
            VolumeVariantDef::Wall => VolumeKind::Wall(WallState::new(
                vec![Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)],
                1.5,
            )),
            VolumeVariantDef::ChunkFill => VolumeKind::ChunkFill { point: Vec3::new(1.5, 1.0, 1.5) },
        }
    }

    /// Flat list of control points, for serialization and handle layout.
    pub fn control_points(&self) -> Vec<Vec3> {
        match self {
            VolumeKind::CornerBox { point } | VolumeKind::ChunkFill { point } => vec![*point],
            VolumeKind::HeightBox { footprint, height_a, height_b } => vec![
                *footprint,
                Vec3::new(0.0, *height_a, 0.0),
                Vec3::new(0.0, *height_b, 0.0),
            ],
            VolumeKind::Wall(wall) => wall.points.clone(),
        }
    }
}

/// The procedural-volume component: control-point state, clamp, dirty flag,
/// and the derived size of the last recompute.
#[derive(Component, Clone, Debug)]
pub struct ProcVolume {
    pub kind: VolumeKind,
    pub clamp: SizeClamp,
    /// Derived size as of the last recompute; clamped component-wise.
    pub size: Vec3,
    /// Counts completed recomputes; lets tests assert coalescing.
    pub generation: u32,
    dirty: bool,
}

impl ProcVolume {
    pub fn new(kind: VolumeKind, clamp: SizeClamp) -> Self {
        Self { kind, clamp, size: Vec3::ZERO, generation: 0, dirty: true }
    }

    /// Request a recompute; mutations within one frame coalesce into one.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consumed by the per-frame recompute system.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

/// Marker + origin of one instantiated chunk piece inside a ChunkFill volume.
#[derive(Component, Clone, Copy, Debug)]
pub struct ChunkPiece {
    pub template: TemplateId,
}

/// Local-space collision boxes of the last recompute (per wall segment, or a
/// single box for the cuboid variants). Consumed by picking.
#[derive(Component, Clone, Debug, Default)]
pub struct VolumeColliders {
    pub boxes: Vec<crate::bounds::Obb>,
}

// ---------- Change events (exposed surface) ----------

/// A volume's control-point state changed this frame.
#[derive(Event, Clone, Copy, Debug)]
pub struct ControlPointChanged {
    pub entity: Entity,
}

/// A placed entity was removed from the world.
#[derive(Event, Clone, Copy, Debug)]
pub struct EntityDeleted {
    pub entity: Entity,
    pub id: PlacedId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_is_component_wise() {
        let clamp = SizeClamp::new(Vec3::ONE, Vec3::splat(20.0));
        let s = clamp.apply(Vec3::new(0.1, 25.0, 4.0));
        assert_eq!(s, Vec3::new(1.0, 20.0, 4.0));
    }

    #[test]
    fn dirty_is_taken_once() {
        let mut v = ProcVolume::new(
            VolumeKind::default_for(VolumeVariantDef::CornerBox),
            SizeClamp::default(),
        );
        v.mark_dirty();
        v.mark_dirty();
        assert!(v.take_dirty());
        assert!(!v.take_dirty());
    }

    #[test]
    fn id_allocator_resumes_above_loaded() {
        let mut alloc = PlacedIdAllocator::default();
        alloc.reserve_through(PlacedId(41));
        assert_eq!(alloc.alloc(), PlacedId(42));
        assert_eq!(alloc.alloc(), PlacedId(43));
    }
}
