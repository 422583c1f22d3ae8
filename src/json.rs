use std::fs;
use std::io::Write;
use std::path::Path;

use glam::Vec3;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::block::{BlockKind, BlockType, Parameters};
use crate::color::Color;
use crate::entity::{Entity, EntityData, EntityState, ObjectKind, Transform};
use crate::error::{Error, Result};
use crate::preview;
use crate::script::{self, BlockId};
use crate::world::World;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorldFile {
  #[serde(default)]
  objects: Vec<Object>,
  #[serde(default = "default_environment_color")]
  environment_color: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Object {
  id: String,
  #[serde(default)]
  name: String,
  #[serde(rename = "type", default = "default_kind")]
  kind: ObjectKind,
  #[serde(default = "default_zero")]
  position: Vec3,
  #[serde(default = "default_zero")]
  rotation: Vec3,
  #[serde(default = "default_one")]
  scale: Vec3,
  #[serde(default = "default_color")]
  color: String,
  #[serde(default)]
  behaviors: Vec<Behavior>,
  #[serde(default)]
  scripts: Vec<Script>,
  #[serde(default = "default_false")]
  locked: bool,
  #[serde(default)]
  created_by: String,
}

#[derive(Deserialize)]
struct Behavior {
  id: String,
  #[serde(rename = "type")]
  type_name: String,
  #[serde(default)]
  parameters: Parameters,
  description: Option<String>,
}

#[derive(Deserialize)]
struct Script {
  id: String,
  #[serde(default)]
  name: String,
  #[serde(default)]
  blocks: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
  id: String,
  #[serde(rename = "type")]
  type_name: String,
  #[serde(default)]
  parameters: Parameters,
  #[serde(default)]
  children: Option<Vec<Block>>,
}

fn default_environment_color() -> String {
  format!("#f3f4f6")
}

fn default_kind() -> ObjectKind {
  ObjectKind::Cube
}

fn default_zero() -> Vec3 {
  Vec3::ZERO
}

fn default_one() -> Vec3 {
  Vec3::ONE
}

fn default_color() -> String {
  format!("#ffffff")
}

fn default_false() -> bool {
  false
}

pub fn load(path: &Path) -> Result<World> {
  let text = fs::read_to_string(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let world = parse(&text)?;
  info!(
    "loaded {} object(s) from {}",
    world.entities().len(),
    path.display()
  );
  Ok(world)
}

pub fn parse(text: &str) -> Result<World> {
  let file: WorldFile = serde_json::from_str(text)?;
  let entities = file.objects.into_iter().map(entity).collect();
  let environment_color = Color::parse_or(&file.environment_color, Color::WHITE);
  Ok(World::with_entities(entities, environment_color))
}

fn entity(object: Object) -> Entity {
  let behaviors = object
    .behaviors
    .into_iter()
    .filter_map(|behavior| {
      let kind = preview::BehaviorKind::from_parameters(&behavior.type_name, behavior.parameters);
      let Some(kind) = kind else {
        warn!("{}: unknown behavior type {}", object.id, behavior.type_name);
        return None;
      };
      Some(preview::Behavior {
        id: behavior.id,
        kind,
        description: behavior.description,
      })
    })
    .collect();
  let scripts = object
    .scripts
    .into_iter()
    .map(|authored| {
      let mut script = script::Script::new(authored.id, authored.name);
      for block in authored.blocks {
        insert_block(&mut script, block, None);
      }
      script
    })
    .collect();
  Entity::new(
    EntityData {
      id: object.id,
      name: object.name,
      kind: object.kind,
      behaviors,
      scripts,
      locked: object.locked,
      created_by: object.created_by,
    },
    EntityState {
      transform: Transform {
        position: object.position,
        rotation: object.rotation,
        scale: object.scale,
      },
      color: Color::parse_or(&object.color, Color::WHITE),
    },
  )
}

fn insert_block(script: &mut script::Script, block: Block, parent: Option<BlockId>) {
  let kind = match BlockType::from_name(&block.type_name) {
    Some(ty) => BlockKind::from_parameters(ty, &block.parameters),
    None => {
      warn!(
        "script {}: block {} has unsupported type {}",
        script.id, block.id, block.type_name
      );
      BlockKind::Unsupported {
        type_name: block.type_name,
      }
    }
  };
  let Some(id) = script.insert(block.id.clone(), kind, parent) else {
    warn!(
      "script {}: dropping duplicate block {} and its children",
      script.id, block.id
    );
    return;
  };
  for child in block.children.unwrap_or_default() {
    insert_block(script, child, Some(id));
  }
}

#[derive(Debug, Serialize)]
pub struct Snapshot {
  pub objects: Vec<ObjectSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct ObjectSnapshot {
  pub id: String,
  pub position: Vec3,
  pub rotation: Vec3,
  pub scale: Vec3,
  pub color: Color,
}

pub fn snapshot(world: &World) -> Snapshot {
  Snapshot {
    objects: world
      .entities()
      .iter()
      .map(|entity| ObjectSnapshot {
        id: entity.data.id.clone(),
        position: entity.state.transform.position,
        rotation: entity.state.transform.rotation,
        scale: entity.state.transform.scale,
        color: entity.state.color,
      })
      .collect(),
  }
}

pub fn write_snapshot(snapshot: &Snapshot, writer: impl Write) -> Result<()> {
  serde_json::to_writer_pretty(writer, snapshot).map_err(Error::Snapshot)
}

pub fn save_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
  let text = serde_json::to_string_pretty(snapshot).map_err(Error::Snapshot)?;
  fs::write(path, text).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::Axis;
  use crate::preview::BehaviorKind;

  const WORLD: &str = r##"{
    "objects": [
      {
        "id": "crate",
        "name": "Crate",
        "type": "CUBE",
        "position": [1, 0.5, -1],
        "rotation": [0, 0, 0],
        "scale": [1, 1, 1],
        "color": "#3b82f6",
        "behaviors": [
          { "id": "spin", "type": "SPIN", "parameters": { "speed": 2, "axis": "y" } }
        ],
        "scripts": [
          {
            "id": "s1",
            "name": "Patrol",
            "blocks": [
              {
                "id": "start",
                "type": "EVENT_START",
                "parameters": {},
                "children": [
                  {
                    "id": "loop",
                    "type": "CONTROL_REPEAT",
                    "parameters": { "times": "3" },
                    "children": [
                      { "id": "step", "type": "ACTION_MOVE", "parameters": { "axis": "x", "distance": 1, "duration": 0 } }
                    ]
                  },
                  { "id": "mystery", "type": "CONTROL_WHILE", "parameters": {} }
                ]
              }
            ]
          }
        ],
        "locked": false,
        "createdBy": "me"
      },
      { "id": "bare" }
    ],
    "environmentColor": "#101010"
  }"##;

  #[test]
  fn parses_the_authored_world_shape() {
    let world = parse(WORLD).unwrap();
    assert_eq!(world.entities().len(), 2);
    assert_eq!(world.environment_color, Color::rgb(16, 16, 16));

    let crate_ = world.entity("crate").unwrap();
    assert_eq!(crate_.state.transform.position, Vec3::new(1., 0.5, -1.));
    assert_eq!(crate_.state.color, Color::rgb(0x3b, 0x82, 0xf6));
    assert_eq!(
      crate_.data.behaviors[0].kind,
      BehaviorKind::Spin {
        speed: 2.,
        axis: Axis::Y
      }
    );

    let script = crate_.script("s1").unwrap();
    assert_eq!(script.name, "Patrol");
    assert_eq!(script.len(), 4);
    let repeat = script.lookup("loop").unwrap();
    assert_eq!(script.kind(repeat), Some(&BlockKind::Repeat { times: 3 }));
    let mystery = script.lookup("mystery").unwrap();
    assert_eq!(
      script.kind(mystery),
      Some(&BlockKind::Unsupported {
        type_name: "CONTROL_WHILE".to_string()
      })
    );
  }

  #[test]
  fn missing_object_fields_take_defaults() {
    let world = parse(WORLD).unwrap();
    let bare = world.entity("bare").unwrap();
    assert_eq!(bare.data.kind, ObjectKind::Cube);
    assert_eq!(bare.state.transform, Transform::IDENTITY);
    assert_eq!(bare.state.color, Color::WHITE);
    assert!(!bare.data.locked);
    assert!(bare.data.scripts.is_empty());
  }

  #[test]
  fn duplicate_block_ids_drop_the_later_subtree() {
    let world = parse(
      r#"{ "objects": [ { "id": "o", "scripts": [ { "id": "s", "blocks": [
        { "id": "a", "type": "EVENT_START", "children": [ { "id": "a", "type": "CONTROL_FOREVER" } ] }
      ] } ] } ] }"#,
    )
    .unwrap();
    let script = world.entity("o").unwrap().script("s").unwrap();
    assert_eq!(script.len(), 1);
  }

  #[test]
  fn rejects_malformed_json() {
    assert!(matches!(parse("{ \"objects\": 3 }"), Err(Error::Json(_))));
  }

  #[test]
  fn null_and_nested_parameters_fall_back() {
    let world = parse(
      r#"{ "objects": [ { "id": "o", "scripts": [ { "id": "s", "blocks": [
        { "id": "w", "type": "CONTROL_WAIT", "parameters": { "duration": null } },
        { "id": "m", "type": "ACTION_MOVE", "parameters": { "distance": [1, 2], "axis": { "x": 1 } } }
      ] } ] } ] }"#,
    )
    .unwrap();
    let script = world.entity("o").unwrap().script("s").unwrap();
    let wait = script.lookup("w").unwrap();
    assert_eq!(
      script.kind(wait),
      Some(&BlockKind::fallback(BlockType::ControlWait))
    );
    let step = script.lookup("m").unwrap();
    assert_eq!(
      script.kind(step),
      Some(&BlockKind::fallback(BlockType::ActionMove))
    );
  }

  struct BrokenPipe;

  impl Write for BrokenPipe {
    fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
      Err(std::io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> std::io::Result<()> {
      Ok(())
    }
  }

  #[test]
  fn snapshot_write_failures_are_not_reported_as_bad_worlds() {
    let world = parse(WORLD).unwrap();
    let error = write_snapshot(&snapshot(&world), BrokenPipe).unwrap_err();
    assert!(matches!(error, Error::Snapshot(_)));
    assert!(error.to_string().starts_with("failed to write snapshot"));
  }

  #[test]
  fn load_reports_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    assert!(matches!(load(&missing), Err(Error::Io { .. })));
  }

  #[test]
  fn demo_world_patrols_and_reacts_to_clicks() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/patrol.json");
    let mut world = load(&path).unwrap();
    world.set_playing(true);
    let delta = 1. / 60.;
    for frame in 0..=60 {
      world.tick(frame as f64 * delta, delta);
    }
    let guard = world.entity("guard").unwrap();
    assert!(guard
      .state
      .transform
      .position
      .abs_diff_eq(Vec3::new(0., 0.5, 2.), 1e-5));
    assert_eq!(guard.state.transform.rotation, Vec3::ZERO);

    assert!(world.click("guard"));
    world.tick(61. * delta, delta);
    let guard = world.entity("guard").unwrap();
    assert_eq!(guard.state.color, Color::rgb(0xef, 0x44, 0x44));
    assert!(guard.context("alarm").unwrap().action.is_some());
    assert!(guard.context("patrol").unwrap().active);
  }

  #[test]
  fn snapshot_round_trips_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let world_path = dir.path().join("world.json");
    fs::write(&world_path, WORLD).unwrap();
    let mut world = load(&world_path).unwrap();
    world.set_playing(true);
    world.tick(0., 0.);

    let out = dir.path().join("snapshot.json");
    save_snapshot(&snapshot(&world), &out).unwrap();
    let text = fs::read_to_string(out).unwrap();
    let written: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(written["objects"][0]["id"], "crate");
    assert_eq!(written["objects"][0]["position"], serde_json::json!([2.0, 0.5, -1.0]));
    assert_eq!(written["objects"][0]["color"], "#3b82f6");
  }
}
