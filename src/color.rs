use std::fmt;

use serde::{Serialize, Serializer};

/// Material color of an entity. Authored as CSS-style strings (`#rgb`, `#rrggbb` or a basic
/// color name).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

const NAMED: &[(&str, Color)] = &[
  ("black", Color::rgb(0, 0, 0)),
  ("white", Color::rgb(255, 255, 255)),
  ("red", Color::rgb(255, 0, 0)),
  ("lime", Color::rgb(0, 255, 0)),
  ("green", Color::rgb(0, 128, 0)),
  ("blue", Color::rgb(0, 0, 255)),
  ("yellow", Color::rgb(255, 255, 0)),
  ("cyan", Color::rgb(0, 255, 255)),
  ("magenta", Color::rgb(255, 0, 255)),
  ("orange", Color::rgb(255, 165, 0)),
  ("purple", Color::rgb(128, 0, 128)),
  ("gray", Color::rgb(128, 128, 128)),
  ("grey", Color::rgb(128, 128, 128)),
];

impl Color {
  pub const WHITE: Color = Color::rgb(255, 255, 255);

  pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color { r, g, b }
  }

  pub fn parse(text: &str) -> Option<Color> {
    let text = text.trim();
    let Some(hex) = text.strip_prefix('#') else {
      return NAMED
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(text))
        .map(|(_, color)| *color);
    };
    if !hex.is_ascii() {
      return None;
    }
    match hex.len() {
      3 => {
        let mut channels = [0u8; 3];
        for (channel, digit) in channels.iter_mut().zip(hex.chars()) {
          let value = digit.to_digit(16)? as u8;
          *channel = value * 17;
        }
        Some(Color::rgb(channels[0], channels[1], channels[2]))
      }
      6 => Some(Color::rgb(
        u8::from_str_radix(&hex[0..2], 16).ok()?,
        u8::from_str_radix(&hex[2..4], 16).ok()?,
        u8::from_str_radix(&hex[4..6], 16).ok()?,
      )),
      _ => None,
    }
  }

  pub fn parse_or(text: &str, fallback: Color) -> Color {
    Color::parse(text).unwrap_or(fallback)
  }
}

impl Default for Color {
  fn default() -> Self {
    Color::WHITE
  }
}

impl fmt::Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
  }
}

impl Serialize for Color {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}
