use std::path::PathBuf;

use clap::Parser;

/// Runs a world's block scripts headlessly and prints where everything ended up.
#[derive(Debug, Parser)]
#[command(name = "coblocks", version)]
pub struct Config {
  /// World file in the editor's JSON shape.
  pub world: PathBuf,
  /// Number of frames to simulate.
  #[arg(long, default_value_t = 300)]
  pub frames: u32,
  #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
  pub frame_rate: u32,
  /// Click an object at a point in time, e.g. `--click door@1.5`. May be repeated.
  #[arg(long = "click", value_name = "OBJECT@SECONDS", value_parser = parse_click)]
  pub clicks: Vec<ScheduledClick>,
  /// Stay in edit mode and only preview ambient behaviors.
  #[arg(long)]
  pub preview: bool,
  /// Sleep between frames instead of running as fast as possible.
  #[arg(long)]
  pub realtime: bool,
  /// Where to write the final snapshot; stdout when absent.
  #[arg(long, short)]
  pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledClick {
  pub object: String,
  pub at: f64,
}

fn parse_click(text: &str) -> Result<ScheduledClick, String> {
  let (object, at) = text
    .rsplit_once('@')
    .ok_or_else(|| format!("expected OBJECT@SECONDS, got {text:?}"))?;
  if object.is_empty() {
    return Err(format!("missing object id in {text:?}"));
  }
  let at = at
    .parse::<f64>()
    .ok()
    .filter(|at| at.is_finite() && *at >= 0.)
    .ok_or_else(|| format!("invalid time in {text:?}"))?;
  Ok(ScheduledClick {
    object: object.to_string(),
    at,
  })
}
