use std::collections::HashMap;
use std::path::Path;

use glam::Vec3;
use log::{info, warn};

use crate::block::{BlockKind, BlockType, Parameters};
use crate::color::Color;
use crate::entity::{Entity, EntityData, EntityState, ObjectKind, Transform};
use crate::error::Result;
use crate::json;
use crate::script::Script;

const PALETTE: [Color; 6] = [
  Color::rgb(0x3b, 0x82, 0xf6),
  Color::rgb(0xef, 0x44, 0x44),
  Color::rgb(0x10, 0xb9, 0x81),
  Color::rgb(0xf5, 0x9e, 0x0b),
  Color::rgb(0x8b, 0x5c, 0xf6),
  Color::rgb(0xec, 0x48, 0x99),
];

/// Partial edit of an object, as sent by the properties panel.
#[derive(Debug, Clone, Default)]
pub struct ObjectUpdate {
  pub name: Option<String>,
  pub position: Option<Vec3>,
  pub rotation: Option<Vec3>,
  pub scale: Option<Vec3>,
  pub color: Option<Color>,
  pub locked: Option<bool>,
}

/// All entities of an edited world plus the execution-mode switch the host toggles.
#[derive(Debug)]
pub struct World {
  entities: Vec<Entity>,
  entity_id_to_index: HashMap<String, usize>,
  pub environment_color: Color,
  pub current_user: String,
  playing: bool,
  next_id: u64,
}

impl Default for World {
  fn default() -> Self {
    World::new()
  }
}

impl World {
  /// A fresh world containing only the locked ground plane.
  pub fn new() -> World {
    let ground = Entity::new(
      EntityData {
        id: "floor".to_string(),
        name: "Ground".to_string(),
        kind: ObjectKind::Plane,
        behaviors: Vec::new(),
        scripts: Vec::new(),
        locked: true,
        created_by: "system".to_string(),
      },
      EntityState {
        transform: Transform {
          position: Vec3::new(0., -0.5, 0.),
          rotation: Vec3::new(-std::f32::consts::FRAC_PI_2, 0., 0.),
          scale: Vec3::new(20., 20., 1.),
        },
        color: Color::rgb(0xe5, 0xe7, 0xeb),
      },
    );
    World::with_entities(vec![ground], Color::rgb(0xf3, 0xf4, 0xf6))
  }

  pub fn with_entities(entities: Vec<Entity>, environment_color: Color) -> World {
    let mut world = World {
      entities: Vec::with_capacity(entities.len()),
      entity_id_to_index: HashMap::with_capacity(entities.len()),
      environment_color,
      current_user: "me".to_string(),
      playing: false,
      next_id: 0,
    };
    for entity in entities {
      if world.entity_id_to_index.contains_key(entity.id()) {
        warn!("dropping duplicate object {}", entity.id());
        continue;
      }
      world.insert(entity);
    }
    world
  }

  pub fn load(path: &Path) -> Result<World> {
    json::load(path)
  }

  fn insert(&mut self, entity: Entity) {
    self
      .entity_id_to_index
      .insert(entity.id().to_string(), self.entities.len());
    self.entities.push(entity);
  }

  pub fn entities(&self) -> &[Entity] {
    &self.entities
  }

  pub fn entity(&self, id: &str) -> Option<&Entity> {
    self
      .entity_id_to_index
      .get(id)
      .map(|&index| &self.entities[index])
  }

  fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
    let index = *self.entity_id_to_index.get(id)?;
    self.entities.get_mut(index)
  }

  pub fn is_playing(&self) -> bool {
    self.playing
  }

  pub fn set_playing(&mut self, playing: bool) {
    if self.playing == playing {
      return;
    }
    self.playing = playing;
    for entity in &mut self.entities {
      if playing {
        entity.on_execution_start();
      } else {
        entity.on_execution_stop();
      }
    }
    info!("switched to {} mode", if playing { "play" } else { "edit" });
  }

  pub fn tick(&mut self, now: f64, delta: f64) {
    let playing = self.playing;
    for entity in &mut self.entities {
      entity.tick(now, delta, playing);
    }
  }

  /// Routes a pointer click to an object. Outside execution mode clicks select rather than
  /// trigger, so nothing is dispatched.
  pub fn click(&mut self, id: &str) -> bool {
    if !self.playing {
      return false;
    }
    match self.entity_mut(id) {
      Some(entity) => {
        entity.on_interaction();
        true
      }
      None => false,
    }
  }

  fn generate_id(&mut self, prefix: &str) -> String {
    self.next_id += 1;
    format!("{prefix}-{}", self.next_id)
  }

  pub fn add_object(&mut self, kind: ObjectKind) -> String {
    let mut id = self.generate_id("object");
    while self.entity_id_to_index.contains_key(&id) {
      id = self.generate_id("object");
    }
    let (name, transform, color) = match kind {
      ObjectKind::Spawn => (
        "Spawn Pad".to_string(),
        Transform {
          position: Vec3::new(0., 0.1, 0.),
          rotation: Vec3::ZERO,
          scale: Vec3::new(1., 0.2, 1.),
        },
        Color::rgb(0x37, 0x41, 0x51),
      ),
      kind => (
        format!("New {}", kind.name()),
        Transform {
          position: Vec3::new(0., 0.5, 0.),
          ..Transform::IDENTITY
        },
        PALETTE[self.next_id as usize % PALETTE.len()],
      ),
    };
    let entity = Entity::new(
      EntityData {
        id: id.clone(),
        name,
        kind,
        behaviors: Vec::new(),
        scripts: Vec::new(),
        locked: false,
        created_by: self.current_user.clone(),
      },
      EntityState { transform, color },
    );
    self.insert(entity);
    if self.playing {
      if let Some(entity) = self.entity_mut(&id) {
        entity.on_execution_start();
      }
    }
    id
  }

  pub fn update_object(&mut self, id: &str, update: ObjectUpdate) -> bool {
    let Some(entity) = self.entity_mut(id) else {
      return false;
    };
    let transform = &mut entity.state.transform;
    if let Some(position) = update.position {
      transform.position = position;
    }
    if let Some(rotation) = update.rotation {
      transform.rotation = rotation;
    }
    if let Some(scale) = update.scale {
      transform.scale = scale;
    }
    if let Some(color) = update.color {
      entity.state.color = color;
    }
    if let Some(name) = update.name {
      entity.data.name = name;
    }
    if let Some(locked) = update.locked {
      entity.data.locked = locked;
    }
    true
  }

  pub fn remove_object(&mut self, id: &str) -> bool {
    let Some(index) = self.entity_id_to_index.remove(id) else {
      return false;
    };
    self.entities.remove(index);
    for entity in &self.entities[index..] {
      if let Some(slot) = self.entity_id_to_index.get_mut(entity.id()) {
        *slot -= 1;
      }
    }
    true
  }

  /// Attaches a new script with a single `EVENT_START` root and returns its id.
  pub fn add_script(&mut self, entity_id: &str) -> Option<String> {
    if !self.entity_id_to_index.contains_key(entity_id) {
      return None;
    }
    let id = self.generate_id("script");
    let root = self.generate_id("block");
    let mut script = Script::new(id.clone(), "New Script");
    script.insert(root, BlockKind::EventStart, None)?;
    let playing = self.playing;
    let entity = self.entity_mut(entity_id)?;
    entity.data.scripts.push(script);
    if playing {
      entity.on_execution_start();
    }
    Some(id)
  }

  pub fn add_block(
    &mut self,
    entity_id: &str,
    script_id: &str,
    ty: BlockType,
    parent: Option<&str>,
  ) -> Option<String> {
    let key = self.generate_id("block");
    self.edit_script(entity_id, script_id, |script| {
      let parent = match parent {
        Some(parent) => Some(script.lookup(parent)?),
        None => None,
      };
      script.insert(key.clone(), BlockKind::authoring_default(ty), parent)?;
      Some(key)
    })
  }

  pub fn update_block_parameters(
    &mut self,
    entity_id: &str,
    script_id: &str,
    block_id: &str,
    parameters: &Parameters,
  ) -> bool {
    self
      .edit_script(entity_id, script_id, |script| {
        script.update_parameters(block_id, parameters).then_some(())
      })
      .is_some()
  }

  pub fn remove_block(&mut self, entity_id: &str, script_id: &str, block_id: &str) -> bool {
    self
      .edit_script(entity_id, script_id, |script| {
        script.remove(block_id).then_some(())
      })
      .is_some()
  }

  pub fn reorder_block(
    &mut self,
    entity_id: &str,
    script_id: &str,
    source: &str,
    target: &str,
  ) -> bool {
    self
      .edit_script(entity_id, script_id, |script| {
        script.reorder(source, target).then_some(())
      })
      .is_some()
  }

  /// Applies a script edit. A successful edit during execution restarts the owner's contexts so
  /// none of them keeps running against a tree it was not started on.
  fn edit_script<T>(
    &mut self,
    entity_id: &str,
    script_id: &str,
    edit: impl FnOnce(&mut Script) -> Option<T>,
  ) -> Option<T> {
    let playing = self.playing;
    let entity = self.entity_mut(entity_id)?;
    let result = edit(entity.script_mut(script_id)?)?;
    if playing {
      entity.on_execution_start();
    }
    Some(result)
  }
}
