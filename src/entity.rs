use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::block::BlockType;
use crate::color::Color;
use crate::context::ScriptContext;
use crate::preview::{self, Behavior};
use crate::script::Script;
use crate::stepper;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectKind {
  Cube,
  Sphere,
  Cylinder,
  Plane,
  Model,
  Spawn,
}

impl ObjectKind {
  pub fn name(self) -> &'static str {
    match self {
      ObjectKind::Cube => "CUBE",
      ObjectKind::Sphere => "SPHERE",
      ObjectKind::Cylinder => "CYLINDER",
      ObjectKind::Plane => "PLANE",
      ObjectKind::Model => "MODEL",
      ObjectKind::Spawn => "SPAWN",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
  pub position: Vec3,
  /// XYZ Euler angles in radians.
  pub rotation: Vec3,
  pub scale: Vec3,
}

impl Transform {
  pub const IDENTITY: Transform = Transform {
    position: Vec3::ZERO,
    rotation: Vec3::ZERO,
    scale: Vec3::ONE,
  };

  pub fn orientation(&self) -> Quat {
    Quat::from_rotation_x(self.rotation.x)
      * Quat::from_rotation_y(self.rotation.y)
      * Quat::from_rotation_z(self.rotation.z)
  }

  /// Expresses a displacement given in the entity's own axes in world axes.
  pub fn local_offset(&self, displacement: Vec3) -> Vec3 {
    self.orientation() * displacement
  }
}

impl Default for Transform {
  fn default() -> Self {
    Transform::IDENTITY
  }
}

/// What scripts mutate and the renderer reads back every frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityState {
  pub transform: Transform,
  pub color: Color,
}

/// Everything about an entity that stays fixed while it ticks.
#[derive(Debug, Clone)]
pub struct EntityData {
  pub id: String,
  pub name: String,
  pub kind: ObjectKind,
  pub behaviors: Vec<Behavior>,
  pub scripts: Vec<Script>,
  pub locked: bool,
  pub created_by: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
  Start,
  Click,
}

impl Trigger {
  pub fn block_type(self) -> BlockType {
    match self {
      Trigger::Start => BlockType::EventStart,
      Trigger::Click => BlockType::EventOnClick,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Entity {
  pub data: EntityData,
  pub state: EntityState,
  contexts: BTreeMap<String, ScriptContext>,
}

impl Entity {
  pub fn new(data: EntityData, state: EntityState) -> Entity {
    Entity {
      data,
      state,
      contexts: BTreeMap::new(),
    }
  }

  pub fn id(&self) -> &str {
    &self.data.id
  }

  pub fn script(&self, id: &str) -> Option<&Script> {
    self.data.scripts.iter().find(|script| script.id == id)
  }

  pub fn script_mut(&mut self, id: &str) -> Option<&mut Script> {
    self.data.scripts.iter_mut().find(|script| script.id == id)
  }

  /// Running contexts keyed by script id.
  pub fn contexts(&self) -> &BTreeMap<String, ScriptContext> {
    &self.contexts
  }

  pub fn context(&self, script_id: &str) -> Option<&ScriptContext> {
    self.contexts.get(script_id)
  }

  pub fn on_execution_start(&mut self) {
    self.contexts.clear();
    let started = self.start_contexts(Trigger::Start);
    debug!("{}: started {started} script(s)", self.data.id);
  }

  /// Restarts every script with an `EVENT_ON_CLICK` root, dropping whatever those scripts were
  /// doing. Returns how many scripts were (re)started.
  pub fn on_interaction(&mut self) -> usize {
    let started = self.start_contexts(Trigger::Click);
    debug!("{}: click restarted {started} script(s)", self.data.id);
    started
  }

  pub fn on_execution_stop(&mut self) {
    self.contexts.clear();
  }

  fn start_contexts(&mut self, trigger: Trigger) -> usize {
    let mut started = 0;
    for script in &self.data.scripts {
      if let Some(root) = script.first_root(trigger.block_type()) {
        self.contexts.insert(script.id.clone(), ScriptContext::new(root));
        started += 1;
      }
    }
    started
  }

  pub fn tick(&mut self, now: f64, delta: f64, playing: bool) {
    if self.data.locked {
      return;
    }
    if playing {
      self.execute_scripts(now);
    } else {
      preview::apply(&self.data.behaviors, &mut self.state, delta);
    }
  }

  pub fn execute_scripts(&mut self, now: f64) {
    for (script_id, context) in &mut self.contexts {
      let Some(script) = self.data.scripts.iter().find(|script| &script.id == script_id) else {
        continue;
      };
      stepper::step_context(script, &mut self.state, context, now);
    }
  }
}
