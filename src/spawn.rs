use crate::config::{LaneSpec, Rgb, RoadConfig, SizeWeight, WaterConfig};
use crate::geom::weighted_index;
use crate::model::{Dir, Layout, Mover, MoverId, MoverKind};
use rand::rngs::StdRng;
use rand::Rng;

/// Monotonic id source shared by all spawners so mover ids are
/// process-unique.
pub(crate) struct IdGen {
    next: u64,
}

impl IdGen {
    pub(crate) fn new() -> Self {
        Self { next: 0 }
    }

    fn alloc(&mut self) -> MoverId {
        let id = MoverId(self.next);
        self.next += 1;
        id
    }
}

/// Weighted size table in pick-friendly form.
struct SizeTable {
    sizes: Vec<i32>,
    weights: Vec<f32>,
}

impl SizeTable {
    fn new(table: &[SizeWeight]) -> Self {
        Self {
            sizes: table.iter().map(|e| e.size as i32).collect(),
            weights: table.iter().map(|e| e.prob).collect(),
        }
    }

    fn pick(&self, rng: &mut StdRng) -> i32 {
        self.sizes[weighted_index(rng, &self.weights)]
    }
}

/// One lane's live state: its movers plus the spawn timer.
pub(crate) struct Lane {
    pub(crate) row: i32,
    pub(crate) dir: Dir,
    pub(crate) speed: f32,
    pub(crate) movers: Vec<Mover>,
    pub(crate) next_spawn: f64,
    pub(crate) interval: f64,
    pub(crate) consec_crocs: u32,
}

impl Lane {
    fn new(spec: &LaneSpec) -> Self {
        Self {
            row: spec.row as i32,
            dir: spec.dir,
            speed: spec.speed,
            movers: Vec::new(),
            next_spawn: 0.0,
            interval: 1.0,
            consec_crocs: 0,
        }
    }
}

fn entry_x(dir: Dir, width: f32, window_w: f32) -> f32 {
    match dir {
        Dir::Right => -width,
        Dir::Left => window_w,
    }
}

/// Would a mover of `width` px fit at the lane's entry edge without coming
/// within `min_gap` px of any live mover's span?
fn gap_clear(lane: &Lane, width: f32, min_gap: f32, cell: f32, window_w: f32) -> bool {
    let spawn_x = entry_x(lane.dir, width, window_w);
    match lane.dir {
        Dir::Right => lane.movers.iter().all(|m| {
            !(m.x + m.width(cell) > spawn_x && m.x < spawn_x + width + min_gap)
        }),
        Dir::Left => lane.movers.iter().all(|m| {
            !(m.x < spawn_x + width && m.x + m.width(cell) > spawn_x - min_gap)
        }),
    }
}

/// Re-arm the lane's spawn timer. The interval is tuned so the expected
/// on-screen gap stays near the target regardless of lane speed or the
/// width just rolled.
fn schedule(lane: &mut Lane, now: f64, width: f32, target_gap_px: f32, rng: &mut StdRng) {
    let mean = (target_gap_px + width) as f64 / lane.speed.max(1e-6) as f64;
    lane.interval = rng.gen_range(0.8..1.2) * mean;
    lane.next_spawn = now + lane.interval;
}

fn advance_and_retire(lane: &mut Lane, dt: f32, cell: f32, window_w: f32) {
    for m in &mut lane.movers {
        m.advance(dt);
    }
    lane.movers.retain(|m| m.on_screen(cell, window_w));
}

fn make_mover(
    lane: &Lane,
    kind: MoverKind,
    size: i32,
    colors: &[Rgb],
    layout: &Layout,
    ids: &mut IdGen,
    rng: &mut StdRng,
) -> Mover {
    let width = size as f32 * layout.cell;
    Mover {
        id: ids.alloc(),
        kind,
        x: entry_x(lane.dir, width, layout.width_px()),
        row: lane.row,
        dir: lane.dir,
        speed: lane.speed,
        size,
        color: colors[rng.gen_range(0..colors.len())],
    }
}

/// Road lanes: one species (cars), weighted sizes, minimum-gap spacing.
pub(crate) struct RoadSpawner {
    pub(crate) lanes: Vec<Lane>,
    sizes: SizeTable,
    colors: Vec<Rgb>,
    min_gap_px: f32,
    target_gap_px: f32,
}

impl RoadSpawner {
    pub(crate) fn new(cfg: &RoadConfig, cell: f32) -> Self {
        Self {
            lanes: cfg.lanes.iter().map(Lane::new).collect(),
            sizes: SizeTable::new(&cfg.car_sizes),
            colors: cfg.car_colors.clone(),
            min_gap_px: cfg.min_gap_cells as f32 * cell,
            target_gap_px: cfg.target_gap_cells * cell,
        }
    }

    pub(crate) fn update(
        &mut self,
        now: f64,
        dt: f32,
        layout: &Layout,
        ids: &mut IdGen,
        rng: &mut StdRng,
    ) {
        let window_w = layout.width_px();
        for lane in &mut self.lanes {
            if now >= lane.next_spawn {
                // One size roll per opportunity: the size tested for
                // clearance is the size spawned.
                let size = self.sizes.pick(rng);
                let width = size as f32 * layout.cell;
                if gap_clear(lane, width, self.min_gap_px, layout.cell, window_w) {
                    let car =
                        make_mover(lane, MoverKind::Car, size, &self.colors, layout, ids, rng);
                    lane.movers.push(car);
                }
                schedule(lane, now, width, self.target_gap_px, rng);
            }
            advance_and_retire(lane, dt, layout.cell, window_w);
        }
    }

    pub(crate) fn movers(&self) -> impl Iterator<Item = &Mover> + '_ {
        self.lanes.iter().flat_map(|l| l.movers.iter())
    }
}

/// Water lanes: logs and crocodiles share the lane; the kind is chosen
/// first, and a lane is forced back to a log once it has spawned the
/// configured maximum of consecutive crocodiles.
pub(crate) struct WaterSpawner {
    pub(crate) lanes: Vec<Lane>,
    log_sizes: SizeTable,
    log_colors: Vec<Rgb>,
    croc_sizes: SizeTable,
    croc_colors: Vec<Rgb>,
    croc_prob: f32,
    max_consec_crocs: u32,
    min_gap_px: f32,
    target_gap_px: f32,
}

impl WaterSpawner {
    pub(crate) fn new(cfg: &WaterConfig, cell: f32) -> Self {
        Self {
            lanes: cfg.lanes.iter().map(Lane::new).collect(),
            log_sizes: SizeTable::new(&cfg.log_sizes),
            log_colors: cfg.log_colors.clone(),
            croc_sizes: SizeTable::new(&cfg.croc_sizes),
            croc_colors: cfg.croc_colors.clone(),
            croc_prob: cfg.croc_prob,
            max_consec_crocs: cfg.max_consec_crocs,
            min_gap_px: cfg.min_gap_cells as f32 * cell,
            target_gap_px: cfg.target_gap_cells * cell,
        }
    }

    fn choose_kind(&self, lane: &Lane, rng: &mut StdRng) -> MoverKind {
        if lane.consec_crocs >= self.max_consec_crocs {
            return MoverKind::Log;
        }
        if rng.gen::<f32>() < self.croc_prob {
            MoverKind::Croc
        } else {
            MoverKind::Log
        }
    }

    pub(crate) fn update(
        &mut self,
        now: f64,
        dt: f32,
        layout: &Layout,
        ids: &mut IdGen,
        rng: &mut StdRng,
    ) {
        let window_w = layout.width_px();
        for i in 0..self.lanes.len() {
            if now >= self.lanes[i].next_spawn {
                let kind = self.choose_kind(&self.lanes[i], rng);
                let (table, colors) = match kind {
                    MoverKind::Croc => (&self.croc_sizes, &self.croc_colors),
                    _ => (&self.log_sizes, &self.log_colors),
                };
                let size = table.pick(rng);
                let width = size as f32 * layout.cell;
                let lane = &mut self.lanes[i];
                if gap_clear(lane, width, self.min_gap_px, layout.cell, window_w) {
                    let m = make_mover(lane, kind, size, colors, layout, ids, rng);
                    lane.movers.push(m);
                    // A blocked spawn leaves the run counter untouched.
                    if kind == MoverKind::Croc {
                        lane.consec_crocs += 1;
                    } else {
                        lane.consec_crocs = 0;
                    }
                }
                schedule(lane, now, width, self.target_gap_px, rng);
            }
            advance_and_retire(&mut self.lanes[i], dt, layout.cell, window_w);
        }
    }

    pub(crate) fn movers(&self) -> impl Iterator<Item = &Mover> + '_ {
        self.lanes.iter().flat_map(|l| l.movers.iter())
    }

    pub(crate) fn find(&self, id: MoverId) -> Option<&Mover> {
        self.movers().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{rgb, Config};
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn setup() -> (Config, Layout, IdGen, StdRng) {
        let cfg = Config::default();
        let layout = Layout::from_config(&cfg);
        (cfg, layout, IdGen::new(), StdRng::seed_from_u64(0xF406))
    }

    fn lane_gaps_ok(lane: &Lane, min_gap: f32, cell: f32) -> bool {
        let mut spans: Vec<(f32, f32)> = lane
            .movers
            .iter()
            .map(|m| (m.x, m.x + m.width(cell)))
            .collect();
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));
        spans
            .windows(2)
            .all(|w| w[1].0 - w[0].1 >= min_gap - 0.5)
    }

    #[test]
    fn road_spacing_never_violated() {
        let (cfg, layout, mut ids, mut rng) = setup();
        let mut road = RoadSpawner::new(&cfg.road, layout.cell);
        let min_gap = cfg.road.min_gap_cells as f32 * layout.cell;
        let mut now = 0.0;
        for _ in 0..4000 {
            now += 1.0 / 60.0;
            road.update(now, 1.0 / 60.0, &layout, &mut ids, &mut rng);
            for lane in &road.lanes {
                assert!(lane_gaps_ok(lane, min_gap, layout.cell));
            }
        }
    }

    #[test]
    fn water_spacing_never_violated() {
        let (cfg, layout, mut ids, mut rng) = setup();
        let mut water = WaterSpawner::new(&cfg.water, layout.cell);
        let min_gap = cfg.water.min_gap_cells as f32 * layout.cell;
        let mut now = 0.0;
        for _ in 0..4000 {
            now += 1.0 / 60.0;
            water.update(now, 1.0 / 60.0, &layout, &mut ids, &mut rng);
            for lane in &water.lanes {
                assert!(lane_gaps_ok(lane, min_gap, layout.cell));
            }
        }
    }

    #[test]
    fn consecutive_crocodiles_bounded() {
        let (mut cfg, layout, mut ids, mut rng) = setup();
        cfg.water.croc_prob = 0.9; // stress the run limit
        let mut water = WaterSpawner::new(&cfg.water, layout.cell);
        let max_run = cfg.water.max_consec_crocs;

        let mut seen: HashSet<u64> = HashSet::new();
        let mut runs = vec![0u32; water.lanes.len()];
        let mut now = 0.0;
        let mut croc_spawns = 0u32;
        for _ in 0..8000 {
            now += 0.05;
            water.update(now, 0.05, &layout, &mut ids, &mut rng);
            for (li, lane) in water.lanes.iter().enumerate() {
                for m in &lane.movers {
                    if seen.insert(m.id.0) {
                        if m.kind == MoverKind::Croc {
                            runs[li] += 1;
                            croc_spawns += 1;
                            assert!(
                                runs[li] <= max_run,
                                "lane {li} spawned {} crocodiles in a row",
                                runs[li]
                            );
                        } else {
                            runs[li] = 0;
                        }
                    }
                }
            }
        }
        assert!(croc_spawns > 0, "stress run never spawned a crocodile");
    }

    #[test]
    fn interval_stays_within_jitter_band() {
        let (cfg, layout, mut ids, mut rng) = setup();
        let mut road = RoadSpawner::new(&cfg.road, layout.cell);
        road.update(0.0, 0.0, &layout, &mut ids, &mut rng);

        let gap_px = cfg.road.target_gap_cells * layout.cell;
        let min_w = layout.cell; // smallest car
        let max_w = 3.0 * layout.cell; // largest car
        for lane in &road.lanes {
            let lo = 0.8 * (gap_px + min_w) as f64 / lane.speed as f64;
            let hi = 1.2 * (gap_px + max_w) as f64 / lane.speed as f64;
            assert!(lane.interval >= lo && lane.interval <= hi);
            assert!((lane.next_spawn - lane.interval).abs() < 1e-9);
        }
    }

    #[test]
    fn movers_spawn_at_off_screen_edges() {
        let (cfg, layout, mut ids, mut rng) = setup();
        let mut road = RoadSpawner::new(&cfg.road, layout.cell);
        road.update(0.0, 0.0, &layout, &mut ids, &mut rng);
        for lane in &road.lanes {
            for m in &lane.movers {
                match m.dir {
                    Dir::Right => assert_eq!(m.x, -m.width(layout.cell)),
                    Dir::Left => assert_eq!(m.x, layout.width_px()),
                }
            }
        }
    }

    #[test]
    fn fully_exited_mover_retired_within_one_frame() {
        let (cfg, layout, mut ids, mut rng) = setup();
        let mut water = WaterSpawner::new(&cfg.water, layout.cell);
        for lane in &mut water.lanes {
            lane.next_spawn = f64::MAX;
        }
        // Row 2 moves right; park a log exactly at the trailing boundary.
        let gone = Mover {
            id: MoverId(7001),
            kind: MoverKind::Log,
            x: layout.width_px(),
            row: 2,
            dir: Dir::Right,
            speed: 55.0,
            size: 2,
            color: rgb(131, 86, 62),
        };
        water.lanes[1].movers.push(gone);
        water.update(100.0, 1.0 / 60.0, &layout, &mut ids, &mut rng);
        assert!(water.find(MoverId(7001)).is_none());
    }

    #[test]
    fn blocked_spawn_still_reschedules() {
        let (cfg, layout, mut ids, mut rng) = setup();
        let mut road = RoadSpawner::new(&cfg.road, layout.cell);
        // Jam the entry edge of every lane so no spawn can clear the gap.
        for lane in &mut road.lanes {
            let width = 3.0 * layout.cell;
            lane.movers.push(Mover {
                id: MoverId(9000 + lane.row as u64),
                kind: MoverKind::Car,
                x: entry_x(lane.dir, width, layout.width_px()),
                row: lane.row,
                dir: lane.dir,
                speed: lane.speed,
                size: 3,
                color: rgb(1, 2, 3),
            });
        }
        road.update(0.0, 0.0, &layout, &mut ids, &mut rng);
        for lane in &road.lanes {
            assert_eq!(lane.movers.len(), 1, "blocked lane must not spawn");
            assert!(lane.next_spawn > 0.0, "timer must re-arm after a block");
        }
    }
}
