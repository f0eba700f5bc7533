use crate::config::{Config, Decorations, Rgb, Theme, Zones};
use crate::model::{Dir, Facing, Mode, Mover, MoverKind};
use crate::sim::World;
use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{BeginSynchronizedUpdate, EndSynchronizedUpdate},
};
use std::collections::HashMap;
use std::io::{self, Stdout, Write};

const HUD_ROWS: u16 = 2;
const FOOTER_ROWS: u16 = 1;

fn to_color(c: Rgb) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

/// One grid cell maps to this many terminal columns (and one terminal row).
const CELL_COLS: i32 = 2;

/// Pixel x to terminal column offset within the playfield.
fn px_to_cols(x: f32, cell: f32) -> i32 {
    (x / (cell / CELL_COLS as f32)).round() as i32
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

/// Double-buffered terminal surface; `present` emits only the cells that
/// changed since the previous frame.
struct Screen {
    w: u16,
    h: u16,
    prev: Vec<Cell>,
    cur: Vec<Cell>,
}

impl Screen {
    fn new(w: u16, h: u16) -> Self {
        let blank = Cell {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        };
        Self {
            w,
            h,
            prev: vec![blank; w as usize * h as usize],
            cur: vec![blank; w as usize * h as usize],
        }
    }

    fn resize(&mut self, w: u16, h: u16) {
        *self = Screen::new(w, h);
    }

    fn clear_to(&mut self, fg: Color, bg: Color) {
        for c in &mut self.cur {
            *c = Cell { ch: ' ', fg, bg };
        }
    }

    fn put(&mut self, x: i32, y: i32, ch: char, fg: Color, bg: Color) {
        if x < 0 || y < 0 || x >= self.w as i32 || y >= self.h as i32 {
            return;
        }
        self.cur[y as usize * self.w as usize + x as usize] = Cell { ch, fg, bg };
    }

    fn put_str(&mut self, x: i32, y: i32, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.put(x + i as i32, y, ch, fg, bg);
        }
    }

    fn present(&mut self, out: &mut Stdout) -> io::Result<()> {
        queue!(out, BeginSynchronizedUpdate)?;
        let mut fg = None::<Color>;
        let mut bg = None::<Color>;
        let mut pen: Option<(u16, u16)> = None;

        for y in 0..self.h {
            let row = y as usize * self.w as usize;
            for x in 0..self.w {
                let i = row + x as usize;
                let c = self.cur[i];
                if c == self.prev[i] {
                    continue;
                }
                if pen != Some((x, y)) {
                    queue!(out, cursor::MoveTo(x, y))?;
                }
                if fg != Some(c.fg) {
                    queue!(out, SetForegroundColor(c.fg))?;
                    fg = Some(c.fg);
                }
                if bg != Some(c.bg) {
                    queue!(out, SetBackgroundColor(c.bg))?;
                    bg = Some(c.bg);
                }
                queue!(out, Print(c.ch))?;
                pen = Some((x + 1, y));
            }
        }

        queue!(out, ResetColor, EndSynchronizedUpdate)?;
        out.flush()?;
        self.prev.copy_from_slice(&self.cur);
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum StampKey {
    Mover {
        kind: MoverKind,
        size: i32,
        dir: Dir,
    },
    Frog(Facing),
}

/// A pre-built one-row strip of characters for a mover. `None` accents take
/// the instance color at draw time.
struct Stamp {
    cells: Vec<(char, Option<Rgb>)>,
}

const EYE: Rgb = crate::config::rgb(245, 225, 80);
const GLASS: Rgb = crate::config::rgb(160, 170, 180);

fn car_stamp(size: i32, dir: Dir) -> Stamp {
    let w = (size * CELL_COLS) as usize;
    let mut cells = vec![('█', None); w];
    // Windshield band across the middle fifth-to-fifth span.
    let lo = (w as f32 * 0.25) as usize;
    let hi = (w as f32 * 0.75).ceil() as usize;
    for cell in cells.iter_mut().take(hi.min(w)).skip(lo) {
        *cell = ('▒', Some(GLASS));
    }
    // Headlights at the leading end.
    match dir {
        Dir::Right => cells[w - 1] = ('»', Some(EYE)),
        Dir::Left => cells[0] = ('«', Some(EYE)),
    }
    Stamp { cells }
}

fn log_stamp(size: i32) -> Stamp {
    let w = (size * CELL_COLS) as usize;
    let mut cells: Vec<(char, Option<Rgb>)> = (0..w)
        .map(|i| if i % 2 == 1 { ('▓', None) } else { ('█', None) })
        .collect();
    cells[0] = ('▐', None);
    cells[w - 1] = ('▌', None);
    Stamp { cells }
}

fn croc_stamp(size: i32, dir: Dir) -> Stamp {
    let w = (size * CELL_COLS) as usize;
    let mut cells = vec![('█', None); w];
    match dir {
        Dir::Right => {
            cells[w - 1] = ('o', Some(EYE));
            cells[0] = ('▞', None);
        }
        Dir::Left => {
            cells[0] = ('o', Some(EYE));
            cells[w - 1] = ('▚', None);
        }
    }
    Stamp { cells }
}

fn frog_stamp(facing: Facing) -> Stamp {
    let cells = match facing {
        Facing::Up => vec![('▛', None), ('▜', None)],
        Facing::Down => vec![('▙', None), ('▟', None)],
        Facing::Left => vec![('◀', None), ('█', None)],
        Facing::Right => vec![('█', None), ('▶', None)],
    };
    Stamp { cells }
}

/// Built once from the config; the simulation never touches it. A missed
/// lookup falls back to a bare colored rectangle.
fn build_stamps(cfg: &Config) -> HashMap<StampKey, Stamp> {
    let mut map = HashMap::new();
    for dir in [Dir::Left, Dir::Right] {
        for e in &cfg.road.car_sizes {
            let size = e.size as i32;
            map.insert(
                StampKey::Mover {
                    kind: MoverKind::Car,
                    size,
                    dir,
                },
                car_stamp(size, dir),
            );
        }
        for e in &cfg.water.log_sizes {
            let size = e.size as i32;
            map.insert(
                StampKey::Mover {
                    kind: MoverKind::Log,
                    size,
                    dir,
                },
                log_stamp(size),
            );
        }
        for e in &cfg.water.croc_sizes {
            let size = e.size as i32;
            map.insert(
                StampKey::Mover {
                    kind: MoverKind::Croc,
                    size,
                    dir,
                },
                croc_stamp(size, dir),
            );
        }
    }
    for facing in [Facing::Up, Facing::Down, Facing::Left, Facing::Right] {
        map.insert(StampKey::Frog(facing), frog_stamp(facing));
    }
    map
}

struct Viewport {
    ox: i32,
    oy: i32,
}

pub(crate) struct Renderer {
    screen: Screen,
    stamps: HashMap<StampKey, Stamp>,
    theme: Theme,
    zones: Zones,
    deco: Decorations,
    grid_overlay: bool,
}

impl Renderer {
    pub(crate) fn new(cfg: &Config, term_w: u16, term_h: u16, grid_overlay: bool) -> Self {
        Self {
            screen: Screen::new(term_w, term_h),
            stamps: build_stamps(cfg),
            theme: cfg.theme,
            zones: cfg.zones,
            deco: cfg.decorations.clone(),
            grid_overlay,
        }
    }

    pub(crate) fn resize(&mut self, w: u16, h: u16) {
        self.screen.resize(w, h);
    }

    fn fit(&self, world: &World) -> Option<Viewport> {
        let pw = world.layout.cols * CELL_COLS;
        let ph = world.layout.rows + (HUD_ROWS + FOOTER_ROWS) as i32;
        let (tw, th) = (self.screen.w as i32, self.screen.h as i32);
        if tw < pw || th < ph {
            return None;
        }
        Some(Viewport {
            ox: (tw - pw) / 2,
            oy: (th - ph) / 2 + HUD_ROWS as i32,
        })
    }

    fn zone_bg(&self, row: i32) -> Rgb {
        let row = row as u32;
        let z = &self.zones;
        if row <= z.finish.last {
            self.theme.finish_bg
        } else if row <= z.water.last {
            self.theme.water_bg
        } else if row <= z.road.last {
            self.theme.road_bg
        } else {
            self.theme.start_bg
        }
    }

    pub(crate) fn draw(&mut self, out: &mut Stdout, world: &World, now: f64) -> io::Result<()> {
        let hud_fg = to_color(self.theme.hud_fg);
        let hud_bg = to_color(self.theme.hud_bg);
        self.screen.clear_to(hud_fg, hud_bg);

        let Some(vp) = self.fit(world) else {
            self.screen.put_str(
                0,
                0,
                "Terminal too small for the playfield. Enlarge and retry.",
                hud_fg,
                hud_bg,
            );
            return self.screen.present(out);
        };

        self.draw_background(world, &vp, now);
        let water: Vec<Mover> = world.water.movers().copied().collect();
        for m in &water {
            self.draw_mover(world, &vp, m);
        }
        if matches!(world.mode, Mode::Playing | Mode::Paused) {
            self.draw_frog(world, &vp);
        }
        let road: Vec<Mover> = world.road.movers().copied().collect();
        for m in &road {
            self.draw_mover(world, &vp, m);
        }
        if self.grid_overlay {
            self.draw_grid(world, &vp);
        }
        self.draw_hud(world, &vp);

        self.screen.present(out)
    }

    fn draw_background(&mut self, world: &World, vp: &Viewport, now: f64) {
        let layout = &world.layout;
        let accent = to_color(self.theme.accent);
        for row in 0..layout.rows {
            let bg = to_color(self.zone_bg(row));
            let y = vp.oy + row;
            for tx in 0..layout.cols * CELL_COLS {
                self.screen.put(vp.ox + tx, y, ' ', accent, bg);
            }

            let zone_row = row as u32;
            if zone_row <= self.zones.finish.last {
                let pads = self.deco.lilypad_cols.clone();
                let frog = to_color(self.theme.frog);
                for col in pads {
                    self.screen
                        .put(vp.ox + col as i32 * CELL_COLS, y, '(', frog, bg);
                    self.screen
                        .put(vp.ox + col as i32 * CELL_COLS + 1, y, ')', frog, bg);
                }
            } else if zone_row <= self.zones.water.last {
                // Ripples drift with the simulation clock, so they freeze
                // when the game does.
                for tx in 0..layout.cols * CELL_COLS {
                    let phase = now * 2.2 + row as f64 * 0.9 + tx as f64 * 0.35;
                    if phase.sin() > 0.86 {
                        self.screen.put(vp.ox + tx, y, '~', accent, bg);
                    }
                }
            } else if zone_row < self.zones.road.last && zone_row >= self.zones.road.first {
                // Dashed lane separators under each road row but the last.
                for tx in (0..layout.cols * CELL_COLS).step_by(4) {
                    self.screen.put(vp.ox + tx, y, '_', accent, bg);
                }
            }
        }

        let grass = to_color(crate::config::rgb(60, 140, 50));
        let cells = self.deco.grass_cells.clone();
        for (col, row) in cells {
            let bg = to_color(self.zone_bg(row as i32));
            self.screen.put(
                vp.ox + col as i32 * CELL_COLS,
                vp.oy + row as i32,
                '"',
                grass,
                bg,
            );
        }
    }

    fn draw_mover(&mut self, world: &World, vp: &Viewport, m: &Mover) {
        let layout = &world.layout;
        let key = StampKey::Mover {
            kind: m.kind,
            size: m.size,
            dir: m.dir,
        };
        let bg = to_color(self.zone_bg(m.row));
        let body = to_color(m.color);
        let tx = px_to_cols(m.x, layout.cell);
        let y = vp.oy + m.row;
        let max_tx = layout.cols * CELL_COLS;

        match self.stamps.get(&key) {
            Some(stamp) => {
                for (i, &(ch, accent)) in stamp.cells.iter().enumerate() {
                    let x = tx + i as i32;
                    if x < 0 || x >= max_tx {
                        continue;
                    }
                    let fg = accent.map(to_color).unwrap_or(body);
                    self.screen.put(vp.ox + x, y, ch, fg, bg);
                }
            }
            None => {
                // Unknown kind/size combination: bare rectangle fallback.
                for i in 0..m.size * CELL_COLS {
                    let x = tx + i;
                    if x < 0 || x >= max_tx {
                        continue;
                    }
                    self.screen.put(vp.ox + x, y, '█', body, bg);
                }
            }
        }
    }

    fn draw_frog(&mut self, world: &World, vp: &Viewport) {
        let layout = &world.layout;
        let (fx, fy) = world.frog_pixel();
        let tx = px_to_cols(fx, layout.cell);
        let row = (fy / layout.cell).round() as i32;
        let y = vp.oy + row;
        let bg = to_color(self.zone_bg(row.clamp(0, layout.rows - 1)));
        let fg = to_color(self.theme.frog);
        let max_tx = layout.cols * CELL_COLS;

        let cells: Vec<(char, Option<Rgb>)> = match self.stamps.get(&StampKey::Frog(world.frog.facing))
        {
            Some(stamp) => stamp.cells.clone(),
            None => vec![('█', None); CELL_COLS as usize],
        };
        for (i, &(ch, _)) in cells.iter().enumerate() {
            let x = tx + i as i32;
            if x < 0 || x >= max_tx {
                continue;
            }
            self.screen.put(vp.ox + x, y, ch, fg, bg);
        }
    }

    fn draw_grid(&mut self, world: &World, vp: &Viewport) {
        let layout = &world.layout;
        let fg = to_color(crate::config::rgb(90, 90, 90));
        for row in 0..layout.rows {
            let bg = to_color(self.zone_bg(row));
            for col in 0..layout.cols {
                self.screen
                    .put(vp.ox + col * CELL_COLS, vp.oy + row, '·', fg, bg);
            }
        }
    }

    fn draw_hud(&mut self, world: &World, vp: &Viewport) {
        let hud_fg = to_color(self.theme.hud_fg);
        let hud_bg = to_color(self.theme.hud_bg);
        let y0 = vp.oy - HUD_ROWS as i32;

        let hearts = "♥".repeat(world.lives as usize);
        let line1 = format!("LILYHOP  Score {:05}  Lives {}", world.score(), hearts);
        let line2 = match world.mode {
            Mode::Start => "Press ENTER to start".to_string(),
            Mode::Paused => "PAUSED - P to resume".to_string(),
            Mode::GameOver => "GAME OVER - any key to restart".to_string(),
            Mode::Win => "YOU MADE IT! - any key to restart".to_string(),
            Mode::Playing => String::new(),
        };
        self.screen.put_str(vp.ox, y0, &line1, hud_fg, hud_bg);
        self.screen.put_str(vp.ox, y0 + 1, &line2, hud_fg, hud_bg);

        let footer_y = vp.oy + world.layout.rows;
        self.screen.put_str(
            vp.ox,
            footer_y,
            "WASD/arrows move   P pause   Q quit",
            hud_fg,
            hud_bg,
        );
    }
}
