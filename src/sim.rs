use crate::config::Config;
use crate::model::{Frog, Layout, Mode, Mover, MoverKind};
use crate::spawn::{IdGen, RoadSpawner, WaterSpawner};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A decoded player command; keyboard decoding lives in `input`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Move { dcol: i32, drow: i32 },
    Confirm,
    TogglePause,
    Restart,
    Quit,
}

/// The whole simulation: lanes, frog, and coarse game state, advanced by a
/// caller-supplied clock. Owns the only RNG so runs are reproducible from a
/// seed.
pub(crate) struct World {
    pub(crate) layout: Layout,
    pub(crate) mode: Mode,
    pub(crate) lives: u32,
    pub(crate) frog: Frog,
    pub(crate) road: RoadSpawner,
    pub(crate) water: WaterSpawner,
    start_lives: u32,
    /// High-water mark of rows advanced from the start row.
    max_pos: i32,
    ids: IdGen,
    rng: StdRng,
}

impl World {
    pub(crate) fn new(cfg: &Config, seed: u64) -> Self {
        let layout = Layout::from_config(cfg);
        Self {
            frog: Frog::at_start(&layout),
            road: RoadSpawner::new(&cfg.road, layout.cell),
            water: WaterSpawner::new(&cfg.water, layout.cell),
            mode: Mode::Start,
            lives: cfg.start_lives,
            start_lives: cfg.start_lives,
            max_pos: 0,
            ids: IdGen::new(),
            rng: StdRng::seed_from_u64(seed),
            layout,
        }
    }

    /// Score is a pure function of the progress high-water mark.
    pub(crate) fn score(&self) -> u32 {
        self.max_pos.max(0) as u32 * 10
    }

    /// Lanes keep flowing behind the start banner; everything freezes in
    /// paused, game-over and win.
    pub(crate) fn simulating(&self) -> bool {
        matches!(self.mode, Mode::Start | Mode::Playing)
    }

    fn platform(&self) -> Option<Mover> {
        self.frog.attached.and_then(|id| self.water.find(id)).copied()
    }

    pub(crate) fn frog_pixel(&self) -> (f32, f32) {
        let p = self.platform();
        (
            self.frog.pixel_x(&self.layout, p.as_ref()),
            self.frog.pixel_y(&self.layout, p.as_ref()),
        )
    }

    pub(crate) fn apply(&mut self, cmd: Command) {
        match (self.mode, cmd) {
            (Mode::Start, Command::Confirm) => {
                self.mode = Mode::Playing;
                info!("run started");
            }
            (Mode::GameOver | Mode::Win, Command::Restart) => {
                self.mode = Mode::Start;
                self.lives = self.start_lives;
            }
            (Mode::Playing, Command::TogglePause) => self.mode = Mode::Paused,
            (Mode::Paused, Command::TogglePause) => self.mode = Mode::Playing,
            (Mode::Playing, Command::Move { dcol, drow }) => {
                let p = self.platform();
                self.frog.step(dcol, drow, &self.layout, p.as_ref());
            }
            _ => {}
        }
    }

    /// One fixed simulation step: spawners, frog maintenance, riding,
    /// deaths, win, progress, strictly in that order.
    pub(crate) fn step(&mut self, now: f64, dt: f32) {
        if !self.simulating() {
            return;
        }

        self.road
            .update(now, dt, &self.layout, &mut self.ids, &mut self.rng);
        self.water
            .update(now, dt, &self.layout, &mut self.ids, &mut self.rng);

        // A retired platform stops resolving; the frog must detach, not
        // dangle.
        if let Some(id) = self.frog.attached {
            if self.water.find(id).is_none() {
                self.frog.detach();
            }
        }
        let p = self.platform();
        self.frog.sync(&self.layout, p.as_ref());

        self.ride_update();
        if self.check_death() {
            return;
        }
        if self.check_win() {
            return;
        }
        self.update_progress();
    }

    fn ride_update(&mut self) {
        let cell = self.layout.cell;
        let p = self.platform();
        let hb = self.frog.hitbox(&self.layout, p.as_ref());
        match p {
            None => {
                if self.layout.in_water(self.frog.row) {
                    if let Some(m) = self
                        .water
                        .movers()
                        .find(|m| m.kind.is_platform() && m.hitbox(cell).intersects(&hb))
                        .copied()
                    {
                        self.frog.attach_to(&m, &self.layout);
                    }
                }
            }
            Some(cur) => {
                if cur.hitbox(cell).intersects(&hb) {
                    return;
                }
                // Slid off the current platform: try a neighbour before
                // giving up.
                if let Some(m) = self
                    .water
                    .movers()
                    .find(|m| m.kind.is_platform() && m.hitbox(cell).intersects(&hb))
                    .copied()
                {
                    self.frog.attach_to(&m, &self.layout);
                } else {
                    self.frog.detach();
                }
            }
        }
    }

    /// First matching death rule wins; each resets the frog and costs a
    /// life.
    fn check_death(&mut self) -> bool {
        let cell = self.layout.cell;
        let p = self.platform();
        let hb = self.frog.hitbox(&self.layout, p.as_ref());

        if self.road.movers().any(|m| m.hitbox(cell).intersects(&hb)) {
            self.kill("hit by a car");
            return true;
        }
        if self
            .water
            .movers()
            .any(|m| m.kind == MoverKind::Croc && m.hitbox(cell).intersects(&hb))
        {
            self.kill("stepped on a crocodile");
            return true;
        }
        if self.layout.in_water(self.frog.row) {
            if p.is_none() {
                self.kill("fell into the water");
                return true;
            }
            if hb.x1 < 0.0 || hb.x2 > self.layout.width_px() {
                self.kill("carried off the edge");
                return true;
            }
        }
        false
    }

    fn kill(&mut self, why: &str) {
        self.lives = self.lives.saturating_sub(1);
        debug!("frog died ({why}), {} lives left", self.lives);
        if self.lives == 0 {
            self.mode = Mode::GameOver;
            self.max_pos = 0;
            info!("game over");
        }
        self.frog = Frog::at_start(&self.layout);
    }

    /// Reaching the finish banks the win, then sends the frog back to the
    /// start through the regular death path with a compensating life.
    fn check_win(&mut self) -> bool {
        if self.frog.row > self.layout.finish_last {
            return false;
        }
        self.mode = Mode::Win;
        info!("crossing complete, score {}", self.score());
        self.lives += 1;
        self.kill("respawn after the crossing");
        self.max_pos = 0;
        true
    }

    fn update_progress(&mut self) {
        let progress = self.layout.frog_start.1 - self.frog.row;
        if progress > self.max_pos {
            self.max_pos = progress;
        }
    }
}
