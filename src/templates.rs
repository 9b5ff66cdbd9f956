// src/templates.rs
//! Data-driven placeable templates + loader.

use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------- Public plugin to register asset+loader ----------

pub struct TemplateAssetPlugin;

impl Plugin for TemplateAssetPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<TemplateRegistry>()
            .register_asset_loader(TemplateRegistryLoader);
    }
}

// ---------- Ids ----------

/// Index of a template in the registry (stable during a session).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub u32);

// ---------- Template definition (data form) ----------

/// Which procedural volume a template instance owns, if any.
/// Plain props (crates, braziers, ...) carry `None` and stay fixed-size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeVariantDef {
    /// Ground-anchored cuboid sized by one corner control point.
    CornerBox,
    /// Interior partition: same corner-point formula, different template.
    Partition,
    /// Polyline wall with a shared height.
    Wall,
    /// Cuboid with two independently draggable height points.
    HeightBox,
    /// Volume filled with seeded chunk instances.
    ChunkFill,
}

/// Visual primitive used for the template's base mesh.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum TemplateShape {
    Box { size: Vec3 },
    Cylinder { radius: f32, height: f32 },
}

impl TemplateShape {
    /// Local-space footprint half-extents, used for ghost bounds and chunk fills.
    pub fn half_extents(&self) -> Vec3 {
        match *self {
            TemplateShape::Box { size } => size * 0.5,
            TemplateShape::Cylinder { radius, height } => {
                Vec3::new(radius, height * 0.5, radius)
            }
        }
    }

    /// Build the base mesh for this shape (centered primitives).
    pub fn mesh(&self) -> Mesh {
        match *self {
            TemplateShape::Box { size } => Mesh::from(Cuboid::new(size.x, size.y, size.z)),
            TemplateShape::Cylinder { radius, height } => {
                Mesh::from(Cylinder::new(radius, height))
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemplateDef {
    /// Unique human-readable name (used for lookup and save files).
    pub name: String,

    /// Optional category hint; members of `"chunk"` feed tiled fills.
    #[serde(default)]
    pub category: Option<String>,

    /// Base visual primitive.
    pub shape: TemplateShape,

    /// Procedural volume the instance owns, when this is a construction template.
    #[serde(default)]
    pub volume: Option<VolumeVariantDef>,

    /// Flat base color.
    #[serde(default = "default_color")]
    pub color: [f32; 3],
}

fn default_color() -> [f32; 3] {
    [0.7, 0.7, 0.7]
}

// ---------- Runtime registry asset ----------

#[derive(Asset, TypePath, Clone)]
pub struct TemplateRegistry {
    /// Ordered list; index in this vector is the `TemplateId.0`.
    pub templates: Vec<TemplateDef>,
    /// Name → index for quick lookups.
    pub name_to_index: HashMap<String, u32>,
}

impl TemplateRegistry {
    pub fn index_of(&self, name: &str) -> Option<TemplateId> {
        self.name_to_index.get(name).map(|&i| TemplateId(i))
    }

    pub fn get(&self, id: TemplateId) -> Option<&TemplateDef> {
        self.templates.get(id.0 as usize)
    }

    /// Templates eligible as chunk-fill pieces.
    pub fn chunk_variants(&self) -> Vec<TemplateId> {
        self.templates
            .iter()
            .enumerate()
            .filter(|(_, def)| def.category.as_deref() == Some("chunk"))
            .map(|(i, _)| TemplateId(i as u32))
            .collect()
    }
}

/// Handle to the loaded TemplateRegistry asset.
#[derive(Resource, Default)]
pub struct TemplateRegistryHandle(pub Handle<TemplateRegistry>);

// ---------- Asset loader for `.templates.ron` / `templates.ron` ----------

#[derive(Default)]
pub struct TemplateRegistryLoader;

impl AssetLoader for TemplateRegistryLoader {
    type Asset = TemplateRegistry;
    type Settings = ();
    type Error = TemplateRegistryLoadError;

    fn extensions(&self) -> &[&str] {
        &["templates.ron", "ron"]
    }

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let defs: Vec<TemplateDef> = ron::de::from_bytes(&bytes)
            .map_err(|e| TemplateRegistryLoadError::Ron(e.to_string()))?;
        TemplateRegistry::from_defs(defs)
    }
}

impl TemplateRegistry {
    pub fn from_defs(defs: Vec<TemplateDef>) -> Result<Self, TemplateRegistryLoadError> {
        let mut name_to_index = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if let Some(prev) = name_to_index.insert(def.name.clone(), i as u32) {
                return Err(TemplateRegistryLoadError::DuplicateName {
                    name: def.name.clone(),
                    first: prev,
                    second: i as u32,
                });
            }
        }
        Ok(TemplateRegistry { templates: defs, name_to_index })
    }
}

// ---------- Loader errors ----------

#[derive(thiserror::Error, Debug)]
pub enum TemplateRegistryLoadError {
    #[error("I/O while reading template manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error("Duplicate template name '{name}' (first idx {first}, second idx {second})")]
    DuplicateName { name: String, first: u32, second: u32 },
}

// ---------- Startup/monitor systems ----------

/// Startup: request loading the template manifest, store the handle.
pub fn load_template_registry(
    mut handle_res: ResMut<TemplateRegistryHandle>,
    settings: Res<crate::settings::RampartSettings>,
    assets: Res<AssetServer>,
) {
    if handle_res.0.is_strong() {
        return;
    }
    let h: Handle<TemplateRegistry> = assets.load(settings.template_manifest.as_str());
    handle_res.0 = h;
    info!("Templates: loading manifest from '{}'", settings.template_manifest);
}

/// Update: log once when the registry becomes available.
pub fn monitor_template_registry_ready(
    handle_res: Res<TemplateRegistryHandle>,
    registries: Res<Assets<TemplateRegistry>>,
    mut logged: Local<bool>,
) {
    if *logged {
        return;
    }
    if let Some(reg) = registries.get(&handle_res.0) {
        *logged = true;
        info!(
            "Templates: manifest loaded ({} templates, {} chunk variants)",
            reg.templates.len(),
            reg.chunk_variants().len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, category: Option<&str>) -> TemplateDef {
        TemplateDef {
            name: name.to_string(),
            category: category.map(str::to_string),
            shape: TemplateShape::Box { size: Vec3::ONE },
            volume: None,
            color: default_color(),
        }
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = TemplateRegistry::from_defs(vec![def("crate", None), def("crate", None)]);
        assert!(matches!(err, Err(TemplateRegistryLoadError::DuplicateName { .. })));
    }

    #[test]
    fn chunk_variants_filtered_by_category() {
        let reg = TemplateRegistry::from_defs(vec![
            def("crate", None),
            def("rubble_a", Some("chunk")),
            def("rubble_b", Some("chunk")),
        ])
        .unwrap();
        assert_eq!(reg.chunk_variants(), vec![TemplateId(1), TemplateId(2)]);
        assert_eq!(reg.index_of("crate"), Some(TemplateId(0)));
        assert_eq!(reg.index_of("missing"), None);
    }
}
