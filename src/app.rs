use crate::config::Config;
use crate::input::map_key;
use crate::render::Renderer;
use crate::sim::{Command, World};
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyEventKind},
    execute,
    style::ResetColor,
    terminal::{
        self, DisableLineWrap, EnableLineWrap, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use log::info;
use rand::Rng;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const FIXED_DT: f32 = 1.0 / 60.0;
const MAX_FRAME_DT: f32 = 1.0 / 20.0; // clamp if the system hiccups

#[derive(Parser, Debug)]
#[command(name = "lilyhop")]
#[command(about = "Terminal lane-crossing arcade game", long_about = None)]
pub(crate) struct Args {
    /// JSON config file; compiled-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// RNG seed for deterministic runs; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Render frame-rate cap, overriding the config value.
    #[arg(long)]
    fps: Option<u64>,

    /// Draw the debug cell-grid overlay.
    #[arg(long, default_value_t = false)]
    grid: bool,
}

pub(crate) fn run(args: Args) -> Result<()> {
    let cfg = Config::load(args.config.as_deref())?;
    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let fps = args.fps.unwrap_or(cfg.fps_cap).clamp(10, 240);
    info!(
        "starting: {}x{} grid, {} road + {} water lanes, seed {seed}, {fps} fps cap",
        cfg.grid.cols,
        cfg.grid.rows,
        cfg.road.lanes.len(),
        cfg.water.lanes.len()
    );

    let mut out = io::stdout();
    terminal::enable_raw_mode().context("enabling raw mode")?;
    execute!(
        out,
        EnterAlternateScreen,
        cursor::Hide,
        DisableLineWrap,
        terminal::Clear(terminal::ClearType::All)
    )?;

    let res = run_loop(&mut out, &cfg, seed, fps, args.grid);

    // Restore the terminal even when the loop errored.
    let _ = execute!(
        out,
        EnableLineWrap,
        cursor::Show,
        LeaveAlternateScreen,
        ResetColor
    );
    let _ = terminal::disable_raw_mode();
    res
}

fn run_loop(out: &mut Stdout, cfg: &Config, seed: u64, fps: u64, grid: bool) -> Result<()> {
    let mut world = World::new(cfg, seed);
    let (tw, th) = terminal::size()?;
    let mut renderer = Renderer::new(cfg, tw, th, grid);
    let frame_dt = Duration::from_secs_f64(1.0 / fps as f64);

    let mut last = Instant::now();
    let mut acc = 0.0f32;
    let mut sim_now = 0.0f64;

    loop {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(k) if k.kind == KeyEventKind::Press => {
                    if let Some(cmd) = map_key(world.mode, k.code) {
                        if cmd == Command::Quit {
                            return Ok(());
                        }
                        world.apply(cmd);
                    }
                }
                Event::Resize(w, h) => renderer.resize(w, h),
                _ => {}
            }
        }

        let now = Instant::now();
        let mut dt = (now - last).as_secs_f32();
        last = now;
        if dt > MAX_FRAME_DT {
            dt = MAX_FRAME_DT;
        }

        acc += dt;
        while acc >= FIXED_DT {
            acc -= FIXED_DT;
            // The simulation clock advances only while the core is in a
            // simulating mode, so a paused stretch never counts toward a
            // spawn timer.
            if world.simulating() {
                sim_now += FIXED_DT as f64;
                world.step(sim_now, FIXED_DT);
            }
        }

        renderer.draw(out, &world, sim_now)?;
        spin_sleep(frame_dt, Instant::now());
    }
}

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
