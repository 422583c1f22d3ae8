use crate::block::{Axis, Parameters};
use crate::entity::EntityState;

/// Legacy "easy mode" behaviors, previewed while the world is being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct Behavior {
  pub id: String,
  pub kind: BehaviorKind,
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorKind {
  /// Continuous rotation, `speed` in radians per second.
  Spin { speed: f32, axis: Axis },
  Bounce(Parameters),
  Float(Parameters),
  Hover(Parameters),
}

impl BehaviorKind {
  pub fn from_parameters(type_name: &str, parameters: Parameters) -> Option<BehaviorKind> {
    Some(match type_name {
      "SPIN" => BehaviorKind::Spin {
        speed: parameters
          .get("speed")
          .and_then(|value| value.to_f64())
          .unwrap_or(1.) as f32,
        axis: parameters
          .get("axis")
          .and_then(|value| value.as_str())
          .and_then(Axis::parse)
          .unwrap_or(Axis::Y),
      },
      "BOUNCE" => BehaviorKind::Bounce(parameters),
      "FLOAT" => BehaviorKind::Float(parameters),
      "HOVER" => BehaviorKind::Hover(parameters),
      _ => return None,
    })
  }
}

/// Edit-mode pass; runs without any script context.
pub fn apply(behaviors: &[Behavior], state: &mut EntityState, delta: f64) {
  for behavior in behaviors {
    if let BehaviorKind::Spin { speed, axis } = behavior.kind {
      state.transform.rotation += axis.unit() * speed * delta as f32;
    }
  }
}

#[cfg(test)]
mod tests {
  use glam::Vec3;

  use super::*;
  use crate::block::Value;

  fn spin(parameters: &[(&str, Value)]) -> Behavior {
    let parameters = parameters
      .iter()
      .map(|(name, value)| (name.to_string(), value.clone()))
      .collect();
    Behavior {
      id: "b".to_string(),
      kind: BehaviorKind::from_parameters("SPIN", parameters).unwrap(),
      description: None,
    }
  }

  #[test]
  fn spin_defaults_to_one_radian_per_second_around_y() {
    let mut state = EntityState::default();
    apply(&[spin(&[])], &mut state, 0.5);
    assert_eq!(state.transform.rotation, Vec3::new(0., 0.5, 0.));
  }

  #[test]
  fn spin_honours_speed_and_axis() {
    let mut state = EntityState::default();
    let behaviors = [spin(&[("speed", Value::Integer(2)), ("axis", "x".into())])];
    apply(&behaviors, &mut state, 0.25);
    apply(&behaviors, &mut state, 0.25);
    assert_eq!(state.transform.rotation, Vec3::new(1., 0., 0.));
  }

  #[test]
  fn other_behaviors_do_not_move_the_entity() {
    let mut state = EntityState::default();
    let bounce = Behavior {
      id: "b".to_string(),
      kind: BehaviorKind::from_parameters("BOUNCE", Parameters::new()).unwrap(),
      description: Some("boing".to_string()),
    };
    apply(&[bounce], &mut state, 1.);
    assert_eq!(state, EntityState::default());
    assert!(BehaviorKind::from_parameters("DANCE", Parameters::new()).is_none());
  }
}
