use std::io;
use std::process;
use std::thread;
use std::time::Duration;

use clap::Parser;
use coblocks::{json, Config, Error, Result, World};
use log::{error, info};

fn run(config: Config) -> Result<()> {
  let mut world = World::load(&config.world)?;
  for click in &config.clicks {
    if world.entity(&click.object).is_none() {
      return Err(Error::UnknownEntity(click.object.clone()));
    }
  }
  let mut clicks = config.clicks.clone();
  clicks.sort_by(|a, b| a.at.total_cmp(&b.at));
  let mut clicks = clicks.into_iter().peekable();

  world.set_playing(!config.preview);
  let delta = 1. / config.frame_rate as f64;
  for frame in 0..config.frames {
    let now = frame as f64 * delta;
    while let Some(click) = clicks.next_if(|click| click.at <= now) {
      if !world.click(&click.object) {
        info!("ignored click on {} at {now:.3}s", click.object);
      }
    }
    world.tick(now, delta);
    if config.realtime {
      thread::sleep(Duration::from_secs_f64(delta));
    }
  }

  let snapshot = json::snapshot(&world);
  match &config.output {
    Some(path) => json::save_snapshot(&snapshot, path)?,
    None => json::write_snapshot(&snapshot, io::stdout().lock())?,
  }
  Ok(())
}

fn main() {
  pretty_env_logger::init();
  let config = Config::parse();
  if let Err(error) = run(config) {
    error!("{error}");
    process::exit(1);
  }
}
