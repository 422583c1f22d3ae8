use glam::Vec3;

use crate::entity::EntityState;
use crate::script::BlockId;
use crate::tween::{ease, lerp, lerp_vec3, progress};

/// Position within one container block's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
  pub block: BlockId,
  pub child_index: usize,
  /// Completed iterations of a `CONTROL_REPEAT` body.
  pub loop_counter: Option<u32>,
}

impl Frame {
  pub fn new(block: BlockId) -> Frame {
    Frame {
      block,
      child_index: 0,
      loop_counter: None,
    }
  }

  pub fn repeat(block: BlockId, loop_counter: u32) -> Frame {
    Frame {
      block,
      child_index: 0,
      loop_counter: Some(loop_counter),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tween {
  Move { start: Vec3, target: Vec3 },
  Rotate { start: Vec3, target: Vec3 },
  Scale { start: f32, target: f32 },
}

impl Tween {
  pub fn apply(&self, state: &mut EntityState, eased: f32) {
    let transform = &mut state.transform;
    match *self {
      Tween::Move { start, target } => transform.position = lerp_vec3(start, target, eased),
      Tween::Rotate { start, target } => transform.rotation = lerp_vec3(start, target, eased),
      Tween::Scale { start, target } => transform.scale = Vec3::splat(lerp(start, target, eased)),
    }
  }

  /// Writes the exact target value.
  pub fn finish(&self, state: &mut EntityState) {
    let transform = &mut state.transform;
    match *self {
      Tween::Move { target, .. } => transform.position = target,
      Tween::Rotate { target, .. } => transform.rotation = target,
      Tween::Scale { target, .. } => transform.scale = Vec3::splat(target),
    }
  }
}

/// A timed transform change in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
  pub tween: Tween,
  pub start_time: f64,
  pub duration: f64,
}

impl Action {
  /// Applies the eased value for `now` and reports whether the tween has completed.
  pub fn resume(&self, state: &mut EntityState, now: f64) -> bool {
    let t = progress(self.start_time, self.duration, now);
    if t >= 1. {
      self.tween.finish(state);
      true
    } else {
      self.tween.apply(state, ease(t));
      false
    }
  }
}

/// Live, resumable execution state of one running script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptContext {
  pub stack: Vec<Frame>,
  pub wait_until: f64,
  pub action: Option<Action>,
  pub active: bool,
}

impl ScriptContext {
  pub fn new(trigger: BlockId) -> ScriptContext {
    ScriptContext {
      stack: vec![Frame::new(trigger)],
      wait_until: 0.,
      action: None,
      active: true,
    }
  }

  pub fn depth(&self) -> usize {
    self.stack.len()
  }
}
