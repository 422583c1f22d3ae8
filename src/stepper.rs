use log::{debug, trace};

use crate::block::BlockKind;
use crate::context::{Action, Frame, ScriptContext, Tween};
use crate::entity::EntityState;
use crate::script::{BlockId, Script};

/// Most block dispatches a single context may make in one tick.
pub const INSTRUCTION_BUDGET: usize = 20;

enum Flow {
  Continue,
  Suspend,
}

/// Advances one context by a single tick and returns how many instruction steps it took.
///
/// An in-flight tween owns the tick until it completes; a pending wait blocks everything. After
/// that, frames are popped and children dispatched until a suspension point is reached, the stack
/// empties, or the budget runs out. Loop re-entry always spends the rest of the budget so that a
/// tight `forever` cannot monopolize a frame.
pub fn step_context(
  script: &Script,
  state: &mut EntityState,
  context: &mut ScriptContext,
  now: f64,
) -> usize {
  if !context.active {
    return 0;
  }
  if let Some(action) = context.action {
    if !action.resume(state, now) {
      return 0;
    }
    context.action = None;
  }
  if now < context.wait_until {
    return 0;
  }

  let mut executed = 0;
  while executed < INSTRUCTION_BUDGET {
    let Some(frame) = context.stack.last_mut() else {
      break;
    };
    executed += 1;
    let children = script.children(frame.block);
    let Some(&child) = children.get(frame.child_index) else {
      let Some(frame) = context.stack.pop() else {
        break;
      };
      if reenter(script, context, frame) {
        executed = INSTRUCTION_BUDGET;
      }
      continue;
    };
    frame.child_index += 1;
    if let Flow::Suspend = execute_block(script, state, context, child, now) {
      break;
    }
  }

  if context.stack.is_empty() {
    context.active = false;
    debug!("script {} ran to completion", script.id);
  }
  executed
}

/// Decides what happens after a container's children are exhausted. Returns true when the
/// container was pushed again for another iteration.
fn reenter(script: &Script, context: &mut ScriptContext, frame: Frame) -> bool {
  match script.kind(frame.block) {
    Some(BlockKind::Forever) => {
      context.stack.push(Frame::new(frame.block));
      true
    }
    Some(BlockKind::Repeat { times }) => {
      let next = frame.loop_counter.unwrap_or(0) + 1;
      if next < *times {
        context.stack.push(Frame::repeat(frame.block, next));
        true
      } else {
        false
      }
    }
    _ => false,
  }
}

fn execute_block(
  script: &Script,
  state: &mut EntityState,
  context: &mut ScriptContext,
  id: BlockId,
  now: f64,
) -> Flow {
  let Some(kind) = script.kind(id) else {
    return Flow::Continue;
  };
  trace!("script {}: {}", script.id, kind.type_name());
  let transform = &state.transform;
  match *kind {
    BlockKind::Wait { duration } => {
      context.wait_until = now + duration;
      Flow::Suspend
    }
    BlockKind::Forever => {
      context.stack.push(Frame::new(id));
      Flow::Continue
    }
    BlockKind::Repeat { .. } => {
      context.stack.push(Frame::repeat(id, 0));
      Flow::Continue
    }
    BlockKind::Color { color } => {
      state.color = color;
      Flow::Continue
    }
    BlockKind::Move {
      axis,
      distance,
      duration,
    } => {
      let start = transform.position;
      let target = start + transform.local_offset(axis.unit() * distance);
      start_tween(state, context, Tween::Move { start, target }, duration, now)
    }
    BlockKind::Rotate {
      axis,
      angle,
      duration,
    } => {
      let start = transform.rotation;
      let target = start + axis.unit() * angle.to_radians();
      start_tween(state, context, Tween::Rotate { start, target }, duration, now)
    }
    BlockKind::Scale { scale, duration } => {
      let start = transform.scale.x;
      let tween = Tween::Scale {
        start,
        target: scale,
      };
      start_tween(state, context, tween, duration, now)
    }
    BlockKind::EventStart
    | BlockKind::EventOnClick
    | BlockKind::If
    | BlockKind::Unsupported { .. } => Flow::Continue,
  }
}

fn start_tween(
  state: &mut EntityState,
  context: &mut ScriptContext,
  tween: Tween,
  duration: f64,
  now: f64,
) -> Flow {
  if duration > 0. {
    context.action = Some(Action {
      tween,
      start_time: now,
      duration,
    });
    Flow::Suspend
  } else {
    tween.finish(state);
    Flow::Continue
  }
}
