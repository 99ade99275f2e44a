use std::path::Path;

use prism_kernel::World;
use serde::Deserialize;

/// Errors from loading a map into a world. Always a setup failure: world
/// creation aborts on the first one.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("failed to read map file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse map file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Collaborator contract: populate a freshly created world from a map file.
pub trait MapLoader {
    fn load(&self, path: &Path, world: &mut World) -> Result<(), MapError>;
}

#[derive(Debug, Deserialize)]
struct MapFile {
    #[serde(default)]
    name: Option<String>,
    /// Overrides the configured player spawn when present.
    #[serde(default)]
    spawn: Option<MapTransform>,
    #[serde(default)]
    entities: Vec<MapTransform>,
}

#[derive(Debug, Deserialize)]
struct MapTransform {
    position: [f32; 3],
    #[serde(default = "unit_scale")]
    scale: [f32; 3],
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl MapTransform {
    fn to_transform(&self) -> prism_common::Transform {
        prism_common::Transform {
            position: glam::Vec3::from_array(self.position),
            scale: glam::Vec3::from_array(self.scale),
            ..prism_common::Transform::default()
        }
    }
}

/// JSON map backend. Spawns entities in file order and repositions the
/// player to the map's spawn point when one is given.
#[derive(Debug, Default)]
pub struct JsonMapLoader;

impl JsonMapLoader {
    pub fn new() -> Self {
        Self
    }
}

impl MapLoader for JsonMapLoader {
    fn load(&self, path: &Path, world: &mut World) -> Result<(), MapError> {
        let text = std::fs::read_to_string(path)?;
        let map: MapFile = serde_json::from_str(&text)?;

        if let Some(name) = &map.name {
            tracing::info!(%name, entities = map.entities.len(), "map loaded");
        }

        for entry in &map.entities {
            world.spawn(entry.to_transform());
        }

        if let Some(spawn) = &map.spawn {
            if let Some(player) = world.player_mut() {
                player.transform = spawn.to_transform();
            }
        }

        Ok(())
    }
}
