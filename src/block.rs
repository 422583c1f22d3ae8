use std::collections::HashMap;
use std::fmt;

use glam::Vec3;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::color::Color;

/// A raw authored parameter value. The editor stores numbers as either JSON numbers or strings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Value {
  Integer(i64),
  Float(f64),
  Bool(bool),
  String(String),
  /// Anything else the editor managed to store, such as `null` or a nested array.
  Other(serde_json::Value),
}

impl Value {
  pub fn to_f64(&self) -> Option<f64> {
    let number = match self {
      Value::Integer(integer) => *integer as f64,
      Value::Float(float) => *float,
      Value::Bool(_) | Value::Other(_) => return None,
      Value::String(string) => string.trim().parse::<f64>().ok()?,
    };
    number.is_finite().then_some(number)
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(string) => Some(string.as_str()),
      _ => None,
    }
  }
}

impl From<f64> for Value {
  fn from(value: f64) -> Self {
    Value::Float(value)
  }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Value::String(value.to_string())
  }
}

pub type Parameters = HashMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
  X,
  Y,
  Z,
}

impl Axis {
  pub fn parse(text: &str) -> Option<Axis> {
    match text.trim() {
      "x" | "X" => Some(Axis::X),
      "y" | "Y" => Some(Axis::Y),
      "z" | "Z" => Some(Axis::Z),
      _ => None,
    }
  }

  pub fn unit(self) -> Vec3 {
    match self {
      Axis::X => Vec3::X,
      Axis::Y => Vec3::Y,
      Axis::Z => Vec3::Z,
    }
  }
}

/// The closed set of block types the editor can author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
  EventStart,
  EventOnClick,
  ControlForever,
  ControlRepeat,
  ControlWait,
  ControlIf,
  ActionMove,
  ActionRotate,
  ActionScale,
  ActionColor,
}

impl BlockType {
  pub const ALL: [BlockType; 10] = [
    BlockType::EventStart,
    BlockType::EventOnClick,
    BlockType::ControlForever,
    BlockType::ControlRepeat,
    BlockType::ControlWait,
    BlockType::ControlIf,
    BlockType::ActionMove,
    BlockType::ActionRotate,
    BlockType::ActionScale,
    BlockType::ActionColor,
  ];

  pub fn name(self) -> &'static str {
    match self {
      BlockType::EventStart => "EVENT_START",
      BlockType::EventOnClick => "EVENT_ON_CLICK",
      BlockType::ControlForever => "CONTROL_FOREVER",
      BlockType::ControlRepeat => "CONTROL_REPEAT",
      BlockType::ControlWait => "CONTROL_WAIT",
      BlockType::ControlIf => "CONTROL_IF",
      BlockType::ActionMove => "ACTION_MOVE",
      BlockType::ActionRotate => "ACTION_ROTATE",
      BlockType::ActionScale => "ACTION_SCALE",
      BlockType::ActionColor => "ACTION_COLOR",
    }
  }

  pub fn from_name(name: &str) -> Option<BlockType> {
    BlockType::ALL.into_iter().find(|ty| ty.name() == name)
  }
}

impl fmt::Display for BlockType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Typed payload of a block. Parameters are resolved once, when the block is loaded or edited, so
/// the stepper never has to substitute defaults.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
  EventStart,
  EventOnClick,
  Forever,
  Repeat { times: u32 },
  Wait { duration: f64 },
  If,
  Move { axis: Axis, distance: f32, duration: f64 },
  /// `angle` is in degrees.
  Rotate { axis: Axis, angle: f32, duration: f64 },
  Scale { scale: f32, duration: f64 },
  Color { color: Color },
  Unsupported { type_name: String },
}

impl BlockKind {
  /// Engine fallbacks, used for whatever an authored block leaves out.
  pub fn fallback(ty: BlockType) -> BlockKind {
    match ty {
      BlockType::EventStart => BlockKind::EventStart,
      BlockType::EventOnClick => BlockKind::EventOnClick,
      BlockType::ControlForever => BlockKind::Forever,
      BlockType::ControlRepeat => BlockKind::Repeat { times: 1 },
      BlockType::ControlWait => BlockKind::Wait { duration: 0. },
      BlockType::ControlIf => BlockKind::If,
      BlockType::ActionMove => BlockKind::Move {
        axis: Axis::Z,
        distance: 1.,
        duration: 0.,
      },
      BlockType::ActionRotate => BlockKind::Rotate {
        axis: Axis::Y,
        angle: 1.,
        duration: 0.,
      },
      BlockType::ActionScale => BlockKind::Scale {
        scale: 1.,
        duration: 0.,
      },
      BlockType::ActionColor => BlockKind::Color {
        color: Color::WHITE,
      },
    }
  }

  /// What the editor puts in a freshly dropped block.
  pub fn authoring_default(ty: BlockType) -> BlockKind {
    match ty {
      BlockType::ControlRepeat => BlockKind::Repeat { times: 5 },
      BlockType::ControlWait => BlockKind::Wait { duration: 1. },
      BlockType::ActionMove => BlockKind::Move {
        axis: Axis::Z,
        distance: 1.,
        duration: 1.,
      },
      BlockType::ActionRotate => BlockKind::Rotate {
        axis: Axis::Y,
        angle: 90.,
        duration: 1.,
      },
      BlockType::ActionScale => BlockKind::Scale {
        scale: 1.5,
        duration: 0.5,
      },
      BlockType::ActionColor => BlockKind::Color {
        color: Color::rgb(255, 0, 0),
      },
      ty => BlockKind::fallback(ty),
    }
  }

  pub fn from_parameters(ty: BlockType, parameters: &Parameters) -> BlockKind {
    let mut kind = BlockKind::fallback(ty);
    kind.apply_parameters(parameters);
    kind
  }

  /// Merges authored parameters into the payload. Names the block does not know and values of
  /// the wrong shape leave the current value in place.
  pub fn apply_parameters(&mut self, parameters: &Parameters) {
    for (name, value) in parameters {
      let applied = match (&mut *self, name.as_str()) {
        (BlockKind::Repeat { times }, "times") => value
          .to_f64()
          .map(|count| *times = repeat_count(count))
          .is_some(),
        (
          BlockKind::Wait { duration }
          | BlockKind::Move { duration, .. }
          | BlockKind::Rotate { duration, .. }
          | BlockKind::Scale { duration, .. },
          "duration",
        ) => value
          .to_f64()
          .map(|seconds| *duration = seconds.max(0.))
          .is_some(),
        (BlockKind::Move { axis, .. } | BlockKind::Rotate { axis, .. }, "axis") => value
          .as_str()
          .and_then(Axis::parse)
          .map(|parsed| *axis = parsed)
          .is_some(),
        (BlockKind::Move { distance, .. }, "distance") => value
          .to_f64()
          .map(|parsed| *distance = parsed as f32)
          .is_some(),
        (BlockKind::Rotate { angle, .. }, "angle") => value
          .to_f64()
          .map(|parsed| *angle = parsed as f32)
          .is_some(),
        (BlockKind::Scale { scale, .. }, "scale") => value
          .to_f64()
          .map(|parsed| *scale = parsed as f32)
          .is_some(),
        (BlockKind::Color { color }, "color") => value
          .as_str()
          .and_then(Color::parse)
          .map(|parsed| *color = parsed)
          .is_some(),
        _ => false,
      };
      if !applied {
        warn!("ignoring parameter {name}={value:?} on {}", self.type_name());
      }
    }
  }

  pub fn block_type(&self) -> Option<BlockType> {
    Some(match self {
      BlockKind::EventStart => BlockType::EventStart,
      BlockKind::EventOnClick => BlockType::EventOnClick,
      BlockKind::Forever => BlockType::ControlForever,
      BlockKind::Repeat { .. } => BlockType::ControlRepeat,
      BlockKind::Wait { .. } => BlockType::ControlWait,
      BlockKind::If => BlockType::ControlIf,
      BlockKind::Move { .. } => BlockType::ActionMove,
      BlockKind::Rotate { .. } => BlockType::ActionRotate,
      BlockKind::Scale { .. } => BlockType::ActionScale,
      BlockKind::Color { .. } => BlockType::ActionColor,
      BlockKind::Unsupported { .. } => return None,
    })
  }

  pub fn type_name(&self) -> &str {
    match self {
      BlockKind::Unsupported { type_name } => type_name,
      kind => kind.block_type().map_or("", BlockType::name),
    }
  }

  pub fn is_container(&self) -> bool {
    matches!(
      self,
      BlockKind::EventStart
        | BlockKind::EventOnClick
        | BlockKind::Forever
        | BlockKind::Repeat { .. }
        | BlockKind::If
    )
  }
}

/// Loop bodies run while `iteration + 1 < times`, so fractional counts round up.
fn repeat_count(count: f64) -> u32 {
  if count < 1. {
    1
  } else {
    count.ceil().min(u32::MAX as f64) as u32
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parameters(pairs: &[(&str, Value)]) -> Parameters {
    pairs
      .iter()
      .map(|(name, value)| (name.to_string(), value.clone()))
      .collect()
  }

  #[test]
  fn missing_parameters_take_engine_fallbacks() {
    let kind = BlockKind::from_parameters(BlockType::ActionMove, &Parameters::new());
    assert_eq!(
      kind,
      BlockKind::Move {
        axis: Axis::Z,
        distance: 1.,
        duration: 0.
      }
    );
    assert_eq!(
      BlockKind::from_parameters(BlockType::ControlRepeat, &Parameters::new()),
      BlockKind::Repeat { times: 1 }
    );
    assert_eq!(
      BlockKind::from_parameters(BlockType::ActionColor, &Parameters::new()),
      BlockKind::Color {
        color: Color::WHITE
      }
    );
  }

  #[test]
  fn numeric_strings_are_accepted() {
    let kind = BlockKind::from_parameters(
      BlockType::ActionRotate,
      &parameters(&[
        ("axis", "x".into()),
        ("angle", "45".into()),
        ("duration", Value::Integer(2)),
      ]),
    );
    assert_eq!(
      kind,
      BlockKind::Rotate {
        axis: Axis::X,
        angle: 45.,
        duration: 2.
      }
    );
  }

  #[test]
  fn malformed_values_keep_the_current_payload() {
    let mut kind = BlockKind::authoring_default(BlockType::ActionScale);
    kind.apply_parameters(&parameters(&[
      ("scale", "big".into()),
      ("duration", Value::Bool(true)),
      ("scale", Value::Other(serde_json::Value::Null)),
      ("speed", 3.0.into()),
    ]));
    assert_eq!(kind, BlockKind::authoring_default(BlockType::ActionScale));
  }

  #[test]
  fn repeat_counts_below_one_run_once_and_fractions_round_up() {
    let kind =
      BlockKind::from_parameters(BlockType::ControlRepeat, &parameters(&[("times", 0.0.into())]));
    assert_eq!(kind, BlockKind::Repeat { times: 1 });
    let kind =
      BlockKind::from_parameters(BlockType::ControlRepeat, &parameters(&[("times", 3.7.into())]));
    assert_eq!(kind, BlockKind::Repeat { times: 4 });
    let kind =
      BlockKind::from_parameters(BlockType::ControlRepeat, &parameters(&[("times", 3.0.into())]));
    assert_eq!(kind, BlockKind::Repeat { times: 3 });
  }

  #[test]
  fn negative_durations_clamp_to_zero() {
    let kind = BlockKind::from_parameters(
      BlockType::ControlWait,
      &parameters(&[("duration", (-2.0).into())]),
    );
    assert_eq!(kind, BlockKind::Wait { duration: 0. });
  }

  #[test]
  fn type_names_round_trip_through_serde() {
    for ty in BlockType::ALL {
      let json = serde_json::to_string(&ty).unwrap();
      assert_eq!(json, format!("\"{}\"", ty.name()));
      assert_eq!(BlockType::from_name(ty.name()), Some(ty));
    }
    assert_eq!(BlockType::from_name("CONTROL_WHILE"), None);
  }

  #[test]
  fn only_event_and_control_containers_hold_children() {
    assert!(BlockKind::fallback(BlockType::ControlIf).is_container());
    assert!(BlockKind::fallback(BlockType::EventOnClick).is_container());
    assert!(!BlockKind::fallback(BlockType::ControlWait).is_container());
    assert!(!BlockKind::fallback(BlockType::ActionColor).is_container());
  }
}
