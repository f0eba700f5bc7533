use crate::config::{Config, Rgb};
use crate::geom::Rect;
use serde::{Deserialize, Serialize};

/// Hitbox inset from the full cell footprint, in pixels.
const HITBOX_PAD: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Dir {
    Left,
    Right,
}

impl Dir {
    pub(crate) fn sign(self) -> f32 {
        match self {
            Dir::Left => -1.0,
            Dir::Right => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Facing {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Start,
    Playing,
    Paused,
    GameOver,
    Win,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum MoverKind {
    Car,
    Log,
    Croc,
}

impl MoverKind {
    /// The frog can stand on this mover.
    pub(crate) fn is_platform(self) -> bool {
        matches!(self, MoverKind::Log)
    }

    /// Contact kills the frog.
    pub(crate) fn is_lethal(self) -> bool {
        matches!(self, MoverKind::Car | MoverKind::Croc)
    }
}

/// Process-unique mover identity; the frog's attachment is this id, never a
/// reference, so a retired platform simply stops resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MoverId(pub(crate) u64);

/// The immutable board shape, distilled from a validated `Config`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Layout {
    pub(crate) cols: i32,
    pub(crate) rows: i32,
    pub(crate) cell: f32,
    pub(crate) finish_last: i32,
    pub(crate) water_first: i32,
    pub(crate) water_last: i32,
    pub(crate) frog_start: (i32, i32),
}

impl Layout {
    pub(crate) fn from_config(cfg: &Config) -> Self {
        Self {
            cols: cfg.grid.cols as i32,
            rows: cfg.grid.rows as i32,
            cell: cfg.grid.cell_size as f32,
            finish_last: cfg.zones.finish.last as i32,
            water_first: cfg.zones.water.first as i32,
            water_last: cfg.zones.water.last as i32,
            frog_start: (cfg.frog_start.0 as i32, cfg.frog_start.1 as i32),
        }
    }

    pub(crate) fn width_px(&self) -> f32 {
        self.cols as f32 * self.cell
    }

    pub(crate) fn in_water(&self, row: i32) -> bool {
        row >= self.water_first && row <= self.water_last
    }
}

/// A rectangle translating horizontally along one lane at constant speed.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Mover {
    pub(crate) id: MoverId,
    pub(crate) kind: MoverKind,
    /// Continuous x position of the left edge, pixels.
    pub(crate) x: f32,
    pub(crate) row: i32,
    pub(crate) dir: Dir,
    /// Pixels per second, positive.
    pub(crate) speed: f32,
    /// Width in cells.
    pub(crate) size: i32,
    pub(crate) color: Rgb,
}

impl Mover {
    pub(crate) fn y(&self, cell: f32) -> f32 {
        self.row as f32 * cell
    }

    pub(crate) fn width(&self, cell: f32) -> f32 {
        self.size as f32 * cell
    }

    pub(crate) fn hitbox(&self, cell: f32) -> Rect {
        let x1 = self.x + HITBOX_PAD;
        let y1 = self.y(cell) + HITBOX_PAD;
        Rect::new(
            x1,
            y1,
            x1 + self.width(cell) - 2.0 * HITBOX_PAD,
            y1 + cell - 2.0 * HITBOX_PAD,
        )
    }

    pub(crate) fn advance(&mut self, dt: f32) {
        self.x += self.dir.sign() * self.speed * dt;
    }

    /// False once the footprint has fully left the window on the trailing
    /// side; the spawner retires such movers the same frame.
    pub(crate) fn on_screen(&self, cell: f32, window_w: f32) -> bool {
        match self.dir {
            Dir::Right => self.x < window_w,
            Dir::Left => self.x + self.width(cell) > 0.0,
        }
    }

    /// Leftmost occupied cell, floor division so a partially off-screen
    /// platform still reports the correct cell.
    pub(crate) fn start_cell(&self, cell: f32) -> i32 {
        (self.x / cell).floor() as i32
    }
}

/// The player actor. Grounded it lives on a grid cell; riding it is pinned
/// to a platform and positioned by `rel_cell` cells from the platform's
/// leading edge.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Frog {
    pub(crate) col: i32,
    pub(crate) row: i32,
    pub(crate) attached: Option<MoverId>,
    pub(crate) rel_cell: i32,
    pub(crate) facing: Facing,
}

impl Frog {
    pub(crate) fn at_start(layout: &Layout) -> Self {
        Self {
            col: layout.frog_start.0,
            row: layout.frog_start.1,
            attached: None,
            rel_cell: 0,
            facing: Facing::Up,
        }
    }

    pub(crate) fn riding(&self) -> bool {
        self.attached.is_some()
    }

    /// `platform` is the resolved attachment, if any; a stale id simply
    /// falls back to the grounded position.
    pub(crate) fn pixel_x(&self, layout: &Layout, platform: Option<&Mover>) -> f32 {
        match (self.attached, platform) {
            (Some(_), Some(p)) => p.x + self.rel_cell as f32 * layout.cell,
            _ => self.col as f32 * layout.cell,
        }
    }

    pub(crate) fn pixel_y(&self, layout: &Layout, platform: Option<&Mover>) -> f32 {
        match (self.attached, platform) {
            (Some(_), Some(p)) => p.y(layout.cell),
            _ => self.row as f32 * layout.cell,
        }
    }

    pub(crate) fn hitbox(&self, layout: &Layout, platform: Option<&Mover>) -> Rect {
        let x1 = self.pixel_x(layout, platform) + HITBOX_PAD;
        let y1 = self.pixel_y(layout, platform) + HITBOX_PAD;
        Rect::new(
            x1,
            y1,
            x1 + layout.cell - 2.0 * HITBOX_PAD,
            y1 + layout.cell - 2.0 * HITBOX_PAD,
        )
    }

    /// Apply one discrete move command. A vertical move while riding first
    /// freezes the absolute column from the current pixel position and
    /// detaches, so stepping off a platform does not snap back onto it.
    pub(crate) fn step(&mut self, dcol: i32, drow: i32, layout: &Layout, platform: Option<&Mover>) {
        if drow != 0 && self.riding() {
            self.col = (self.pixel_x(layout, platform) / layout.cell).round() as i32;
            self.detach();
        }

        self.row += drow;
        if self.riding() {
            // May leave the platform's width; the ride check next frame
            // decides whether that means falling off.
            self.rel_cell += dcol;
        } else {
            self.col += dcol;
        }

        match (dcol, drow) {
            (0, -1) => self.facing = Facing::Up,
            (0, 1) => self.facing = Facing::Down,
            (-1, 0) => self.facing = Facing::Left,
            (1, 0) => self.facing = Facing::Right,
            _ => {}
        }

        self.clamp_to_grid(layout);
    }

    pub(crate) fn attach_to(&mut self, platform: &Mover, layout: &Layout) {
        let start_cell = platform.start_cell(layout.cell);
        self.attached = Some(platform.id);
        self.rel_cell = (self.col - start_cell).clamp(0, platform.size - 1);
        self.row = platform.row;
        self.col = start_cell + self.rel_cell;
    }

    pub(crate) fn detach(&mut self) {
        self.attached = None;
        self.rel_cell = 0;
    }

    /// Per-frame maintenance: mirror the platform's row while riding, then
    /// clamp the grounded coordinates.
    pub(crate) fn sync(&mut self, layout: &Layout, platform: Option<&Mover>) {
        if let (Some(_), Some(p)) = (self.attached, platform) {
            self.row = p.row;
        }
        self.clamp_to_grid(layout);
    }

    fn clamp_to_grid(&mut self, layout: &Layout) {
        self.col = self.col.clamp(0, layout.cols - 1);
        self.row = self.row.clamp(0, layout.rows - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::rgb;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn layout() -> Layout {
        Layout::from_config(&Config::default())
    }

    fn log_at(x: f32, row: i32, size: i32) -> Mover {
        Mover {
            id: MoverId(1),
            kind: MoverKind::Log,
            x,
            row,
            dir: Dir::Right,
            speed: 50.0,
            size,
            color: rgb(131, 86, 62),
        }
    }

    #[test]
    fn grounded_frog_stays_in_bounds() {
        let layout = layout();
        let mut frog = Frog::at_start(&layout);
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..2000 {
            let (dcol, drow) = match rng.gen_range(0..4) {
                0 => (0, -1),
                1 => (0, 1),
                2 => (-1, 0),
                _ => (1, 0),
            };
            frog.step(dcol, drow, &layout, None);
            assert!((0..layout.cols).contains(&frog.col));
            assert!((0..layout.rows).contains(&frog.row));
        }
    }

    #[test]
    fn attach_clamps_rel_cell_and_snaps_row() {
        let layout = layout();
        let mut frog = Frog::at_start(&layout);
        frog.col = 8;
        frog.row = 4;
        // Log covering cells 7..=9 of row 3.
        let log = log_at(7.0 * layout.cell, 3, 3);
        frog.attach_to(&log, &layout);
        assert_eq!(frog.rel_cell, 1);
        assert_eq!(frog.row, 3);
        assert_eq!(frog.col, 8);

        // Far left of the platform clamps to its first cell.
        let mut frog = Frog::at_start(&layout);
        frog.col = 2;
        frog.attach_to(&log, &layout);
        assert_eq!(frog.rel_cell, 0);
    }

    #[test]
    fn vertical_move_resolves_column_before_detaching() {
        let layout = layout();
        let mut frog = Frog::at_start(&layout);
        frog.col = 5;
        frog.row = 3;
        // Platform drifted to x = 100 px: cells 2.5..; rel_cell 1 puts the
        // frog at 140 px, which rounds to column 4 (within half a cell).
        let log = log_at(100.0, 3, 3);
        frog.attach_to(&log, &layout);
        frog.rel_cell = 1;
        frog.step(0, -1, &layout, Some(&log));
        assert!(!frog.riding());
        assert_eq!(frog.col, 4);
        assert_eq!(frog.row, 2);
    }

    #[test]
    fn horizontal_move_while_riding_can_leave_platform_width() {
        let layout = layout();
        let mut frog = Frog::at_start(&layout);
        frog.col = 8;
        frog.row = 3;
        let log = log_at(7.0 * layout.cell, 3, 2);
        frog.attach_to(&log, &layout);
        frog.step(1, 0, &layout, Some(&log));
        frog.step(1, 0, &layout, Some(&log));
        assert_eq!(frog.rel_cell, 3); // off the 2-cell log, intentionally
        assert!(frog.riding());
    }

    #[test]
    fn start_cell_floors_negative_positions() {
        let layout = layout();
        let mut log = log_at(-10.0, 2, 2);
        assert_eq!(log.start_cell(layout.cell), -1);
        log.x = -layout.cell;
        assert_eq!(log.start_cell(layout.cell), -1);
        log.x = 0.0;
        assert_eq!(log.start_cell(layout.cell), 0);
    }

    #[test]
    fn on_screen_tracks_trailing_edge() {
        let layout = layout();
        let w = layout.width_px();
        let mut m = log_at(0.0, 2, 2);
        m.dir = Dir::Right;
        m.x = w - 1.0;
        assert!(m.on_screen(layout.cell, w));
        m.x = w;
        assert!(!m.on_screen(layout.cell, w));

        m.dir = Dir::Left;
        m.x = -m.width(layout.cell) + 1.0;
        assert!(m.on_screen(layout.cell, w));
        m.x = -m.width(layout.cell);
        assert!(!m.on_screen(layout.cell, w));
    }

    #[test]
    fn riding_row_mirrors_platform() {
        let layout = layout();
        let mut frog = Frog::at_start(&layout);
        frog.col = 8;
        frog.row = 4;
        let log = log_at(7.0 * layout.cell, 2, 3);
        frog.attach_to(&log, &layout);
        frog.sync(&layout, Some(&log));
        assert_eq!(frog.row, log.row);
    }
}
