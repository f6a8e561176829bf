use serde::Serialize;

/// 網格配置（列 x 欄）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridSpec {
    pub rows: u32,
    pub columns: u32,
}

impl GridSpec {
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.rows * self.columns
    }
}

struct GridAnchor {
    ratio: f64,
    grid: GridSpec,
}

const fn anchor(ratio: f64, rows: u32, columns: u32) -> GridAnchor {
    GridAnchor {
        ratio,
        grid: GridSpec { rows, columns },
    }
}

/// 常見比例對應的網格，依序比對，距離相同時取前者
const GRID_ANCHORS: [GridAnchor; 9] = [
    anchor(21.0 / 9.0, 8, 3),
    anchor(16.0 / 9.0, 7, 4),
    anchor(3.0 / 2.0, 6, 5),
    anchor(4.0 / 3.0, 6, 5),
    anchor(1.0, 6, 6),
    anchor(9.0 / 21.0, 3, 8),
    anchor(9.0 / 16.0, 4, 7),
    anchor(2.0 / 3.0, 5, 6),
    anchor(3.0 / 4.0, 5, 6),
];

/// 依影片寬高比選取最接近的網格
#[must_use]
pub fn select_grid(ratio: f64) -> GridSpec {
    let mut best = &GRID_ANCHORS[0];
    if !ratio.is_finite() {
        return best.grid;
    }

    let mut min_distance = f64::INFINITY;
    for candidate in &GRID_ANCHORS {
        let distance = (candidate.ratio - ratio).abs();
        if distance < min_distance {
            min_distance = distance;
            best = candidate;
        }
    }

    best.grid
}
