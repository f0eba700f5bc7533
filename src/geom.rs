use rand::Rng;

/// Axis-aligned rectangle with inclusive edges: touching counts as contact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rect {
    pub(crate) x1: f32,
    pub(crate) y1: f32,
    pub(crate) x2: f32,
    pub(crate) y2: f32,
}

impl Rect {
    pub(crate) fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub(crate) fn intersects(&self, other: &Rect) -> bool {
        if self.x2 < other.x1 || other.x2 < self.x1 {
            return false;
        }
        if self.y2 < other.y1 || other.y2 < self.y1 {
            return false;
        }
        true
    }
}

/// Cumulative weighted pick over `weights`. Weights are validated at config
/// load to be positive and sum to ~1; the last index is the fallback for
/// float rounding at the tail.
pub(crate) fn weighted_index<R: Rng>(rng: &mut R, weights: &[f32]) -> usize {
    let r: f32 = rng.gen();
    let mut cur = 0.0f32;
    for (i, w) in weights.iter().enumerate() {
        cur += w;
        if r <= cur {
            return i;
        }
    }
    weights.len() - 1
}
