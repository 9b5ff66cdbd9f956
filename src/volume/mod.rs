pub mod core;
pub mod mesh;
pub mod box_corner;
pub mod height_box;
pub mod wall;
pub mod tiled;
pub mod plugin;

pub use plugin::VolumesPlugin;
