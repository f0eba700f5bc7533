use crate::model::Dir;
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

pub(crate) const fn rgb(r: u8, g: u8, b: u8) -> Rgb {
    Rgb { r, g, b }
}

/// One entry of a weighted size table: a mover width in cells and the
/// probability of picking it at a spawn opportunity.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub(crate) struct SizeWeight {
    pub(crate) size: u32,
    pub(crate) prob: f32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub(crate) struct LaneSpec {
    pub(crate) row: u32,
    pub(crate) dir: Dir,
    /// Pixels per second.
    pub(crate) speed: f32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct GridConfig {
    pub(crate) cols: u32,
    pub(crate) rows: u32,
    /// Logical pixels per cell edge.
    pub(crate) cell_size: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: 17,
            rows: 12,
            cell_size: 40,
        }
    }
}

/// Inclusive row range.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub(crate) struct ZoneRows {
    pub(crate) first: u32,
    pub(crate) last: u32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Zones {
    pub(crate) finish: ZoneRows,
    pub(crate) water: ZoneRows,
    pub(crate) road: ZoneRows,
    pub(crate) start: ZoneRows,
}

impl Default for Zones {
    fn default() -> Self {
        Self {
            finish: ZoneRows { first: 0, last: 0 },
            water: ZoneRows { first: 1, last: 4 },
            road: ZoneRows { first: 5, last: 8 },
            start: ZoneRows { first: 9, last: 11 },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RoadConfig {
    pub(crate) lanes: Vec<LaneSpec>,
    pub(crate) target_gap_cells: f32,
    pub(crate) min_gap_cells: u32,
    pub(crate) car_sizes: Vec<SizeWeight>,
    pub(crate) car_colors: Vec<Rgb>,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            lanes: vec![
                LaneSpec { row: 5, dir: Dir::Left, speed: 65.0 },
                LaneSpec { row: 6, dir: Dir::Right, speed: 90.0 },
                LaneSpec { row: 7, dir: Dir::Left, speed: 105.0 },
                LaneSpec { row: 8, dir: Dir::Right, speed: 80.0 },
            ],
            target_gap_cells: 6.5,
            min_gap_cells: 1,
            car_sizes: vec![
                SizeWeight { size: 1, prob: 0.35 },
                SizeWeight { size: 2, prob: 0.45 },
                SizeWeight { size: 3, prob: 0.20 },
            ],
            car_colors: vec![
                rgb(200, 50, 100),
                rgb(240, 210, 50),
                rgb(60, 120, 230),
                rgb(80, 200, 120),
                rgb(255, 140, 40),
                rgb(170, 80, 200),
            ],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WaterConfig {
    pub(crate) lanes: Vec<LaneSpec>,
    pub(crate) target_gap_cells: f32,
    pub(crate) min_gap_cells: u32,
    pub(crate) log_sizes: Vec<SizeWeight>,
    pub(crate) log_colors: Vec<Rgb>,
    pub(crate) croc_sizes: Vec<SizeWeight>,
    pub(crate) croc_colors: Vec<Rgb>,
    /// Probability that a spawn opportunity picks a crocodile.
    pub(crate) croc_prob: f32,
    /// A lane never spawns more than this many crocodiles in a row.
    pub(crate) max_consec_crocs: u32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            lanes: vec![
                LaneSpec { row: 1, dir: Dir::Left, speed: 45.0 },
                LaneSpec { row: 2, dir: Dir::Right, speed: 55.0 },
                LaneSpec { row: 3, dir: Dir::Left, speed: 60.0 },
                LaneSpec { row: 4, dir: Dir::Right, speed: 50.0 },
            ],
            target_gap_cells: 3.0,
            min_gap_cells: 1,
            log_sizes: vec![
                SizeWeight { size: 2, prob: 0.50 },
                SizeWeight { size: 3, prob: 0.30 },
                SizeWeight { size: 4, prob: 0.20 },
            ],
            log_colors: vec![rgb(131, 86, 62)],
            croc_sizes: vec![
                SizeWeight { size: 2, prob: 0.70 },
                SizeWeight { size: 3, prob: 0.30 },
            ],
            croc_colors: vec![rgb(20, 120, 20)],
            croc_prob: 0.25,
            max_consec_crocs: 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Theme {
    pub(crate) finish_bg: Rgb,
    pub(crate) water_bg: Rgb,
    pub(crate) road_bg: Rgb,
    pub(crate) start_bg: Rgb,
    pub(crate) hud_fg: Rgb,
    pub(crate) hud_bg: Rgb,
    pub(crate) frog: Rgb,
    pub(crate) accent: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            finish_bg: rgb(90, 12, 110),
            water_bg: rgb(12, 28, 80),
            road_bg: rgb(42, 42, 46),
            start_bg: rgb(10, 70, 14),
            hud_fg: rgb(225, 225, 210),
            hud_bg: rgb(10, 10, 10),
            frog: rgb(110, 230, 80),
            accent: rgb(210, 200, 130),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Decorations {
    /// Lily pad columns along the finish row.
    pub(crate) lilypad_cols: Vec<u32>,
    /// Grass tufts as (col, row) cells in the start zone.
    pub(crate) grass_cells: Vec<(u32, u32)>,
}

impl Default for Decorations {
    fn default() -> Self {
        Self {
            lilypad_cols: vec![2, 5, 8, 11, 14],
            grass_cells: vec![
                (1, 9),
                (6, 9),
                (12, 9),
                (4, 10),
                (10, 10),
                (15, 10),
                (2, 11),
                (8, 11),
                (13, 11),
            ],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) grid: GridConfig,
    pub(crate) zones: Zones,
    pub(crate) road: RoadConfig,
    pub(crate) water: WaterConfig,
    pub(crate) start_lives: u32,
    /// Canonical respawn cell as (col, row).
    pub(crate) frog_start: (u32, u32),
    pub(crate) fps_cap: u64,
    pub(crate) theme: Theme,
    pub(crate) decorations: Decorations,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            zones: Zones::default(),
            road: RoadConfig::default(),
            water: WaterConfig::default(),
            start_lives: 3,
            frog_start: (8, 10),
            fps_cap: 60,
            theme: Theme::default(),
            decorations: Decorations::default(),
        }
    }
}

impl Config {
    /// Defaults when no path is given; otherwise read + parse + validate.
    /// A broken file is an error, never silently replaced by defaults.
    pub(crate) fn load(path: Option<&Path>) -> Result<Config> {
        let cfg: Config = match path {
            None => Config::default(),
            Some(p) => {
                let text = fs::read_to_string(p)
                    .with_context(|| format!("reading config file {}", p.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config file {}", p.display()))?
            }
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(self.grid.cols >= 1, "grid needs at least one column");
        ensure!(self.grid.rows >= 4, "grid needs at least one row per zone");
        ensure!(self.grid.cell_size >= 2, "cell size must be at least 2 px");
        ensure!(self.fps_cap > 0, "fps cap must be positive");
        ensure!(self.start_lives > 0, "starting lives must be positive");

        // The four zones must tile the grid top to bottom, in order.
        let z = &self.zones;
        for (name, zone) in [
            ("finish", z.finish),
            ("water", z.water),
            ("road", z.road),
            ("start", z.start),
        ] {
            ensure!(
                zone.first <= zone.last,
                "{name} zone rows are inverted ({}..={})",
                zone.first,
                zone.last
            );
        }
        ensure!(z.finish.first == 0, "finish zone must begin at row 0");
        ensure!(
            z.water.first == z.finish.last + 1,
            "water zone must follow the finish zone"
        );
        ensure!(
            z.road.first == z.water.last + 1,
            "road zone must follow the water zone"
        );
        ensure!(
            z.start.first == z.road.last + 1,
            "start zone must follow the road zone"
        );
        ensure!(
            z.start.last == self.grid.rows - 1,
            "start zone must end at the last row"
        );

        check_lanes("road", &self.road.lanes, z.road)?;
        check_lanes("water", &self.water.lanes, z.water)?;
        ensure!(
            self.road.target_gap_cells.is_finite() && self.road.target_gap_cells >= 0.0,
            "road target gap must be a non-negative number"
        );
        ensure!(
            self.water.target_gap_cells.is_finite() && self.water.target_gap_cells >= 0.0,
            "water target gap must be a non-negative number"
        );

        check_table("car", &self.road.car_sizes)?;
        check_table("log", &self.water.log_sizes)?;
        check_table("crocodile", &self.water.croc_sizes)?;
        ensure!(!self.road.car_colors.is_empty(), "car palette is empty");
        ensure!(!self.water.log_colors.is_empty(), "log palette is empty");
        ensure!(
            !self.water.croc_colors.is_empty(),
            "crocodile palette is empty"
        );
        ensure!(
            (0.0..=1.0).contains(&self.water.croc_prob),
            "crocodile probability {} is outside [0, 1]",
            self.water.croc_prob
        );

        let (col, row) = self.frog_start;
        ensure!(col < self.grid.cols, "frog start column {col} is off-grid");
        ensure!(
            row >= z.start.first && row <= z.start.last,
            "frog start row {row} is outside the start zone"
        );

        for &(col, row) in &self.decorations.grass_cells {
            ensure!(
                col < self.grid.cols && row < self.grid.rows,
                "grass cell ({col}, {row}) is off-grid"
            );
        }
        Ok(())
    }
}

fn check_lanes(name: &str, lanes: &[LaneSpec], zone: ZoneRows) -> Result<()> {
    ensure!(!lanes.is_empty(), "{name} lane list is empty");
    for lane in lanes {
        ensure!(
            lane.speed.is_finite() && lane.speed > 0.0,
            "{name} lane at row {} has non-positive speed {}",
            lane.row,
            lane.speed
        );
        ensure!(
            lane.row >= zone.first && lane.row <= zone.last,
            "{name} lane row {} is outside its zone ({}..={})",
            lane.row,
            zone.first,
            zone.last
        );
    }
    Ok(())
}

fn check_table(name: &str, table: &[SizeWeight]) -> Result<()> {
    ensure!(!table.is_empty(), "{name} size table is empty");
    let mut sum = 0.0f32;
    for entry in table {
        ensure!(entry.size >= 1, "{name} size table contains a zero size");
        ensure!(
            entry.prob.is_finite() && entry.prob > 0.0 && entry.prob <= 1.0,
            "{name} size table has weight {} outside (0, 1]",
            entry.prob
        );
        sum += entry.prob;
    }
    ensure!(
        (sum - 1.0).abs() < 1e-3,
        "{name} size table weights sum to {sum}, expected 1"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().expect("defaults must be valid");
    }

    #[test]
    fn zero_speed_lane_rejected() {
        let mut cfg = Config::default();
        cfg.road.lanes[0].speed = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_size_table_rejected() {
        let mut cfg = Config::default();
        cfg.water.log_sizes.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_weight_sum_rejected() {
        let mut cfg = Config::default();
        cfg.road.car_sizes[0].prob = 0.9;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn croc_prob_out_of_range_rejected() {
        let mut cfg = Config::default();
        cfg.water.croc_prob = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn lane_outside_zone_rejected() {
        let mut cfg = Config::default();
        cfg.road.lanes[0].row = 2; // water zone
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zones_must_tile_grid() {
        let mut cfg = Config::default();
        cfg.zones.start.last = 10; // leaves row 11 unassigned
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.zones.road.first = 6; // gap after water
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn frog_start_must_be_in_start_zone() {
        let mut cfg = Config::default();
        cfg.frog_start = (8, 4);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"start_lives": 5}"#).unwrap();
        assert_eq!(cfg.start_lives, 5);
        assert_eq!(cfg.grid.cols, 17);
        cfg.validate().unwrap();
    }
}
