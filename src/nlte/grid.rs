//! # NLTE 网格存储
//!
//! 加载并校验 O I 777 nm 三重线的预计算 NLTE 修正网格。
//!
//! ## 网格布局
//! 行按 Teff (16) ⊃ [Fe/H] (10) ⊃ logg (4) ⊃ A(O) (7) 嵌套排列，
//! 共 `NODE_COUNT` 个丰度节点、`GRID_ROWS` 行。
//!
//! ## CSV 列
//! `teff, logg, feh, dao0, dao1, dao2`，外加共享的 `ao` 列或逐线的 `ao0, ao1, ao2`。
//!
//! ## 依赖关系
//! - 被 `nlte/triplet.rs`, `commands/` 使用
//! - 使用 `csv` + `serde` 读取

use crate::error::{AbundanceError, Result};

use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 每个节点沿丰度轴的点数
pub const ABUNDANCE_BLOCK: usize = 7;
/// 每个节点沿 logg 轴的点数
pub const GRAVITY_BLOCK: usize = 4;
/// 每个节点沿 [Fe/H] 轴的点数
pub const METALLICITY_BLOCK: usize = 10;
/// 丰度节点总数
pub const NODE_COUNT: usize = 640;
/// 网格总行数
pub const GRID_ROWS: usize = NODE_COUNT * ABUNDANCE_BLOCK;
/// 默认网格文件名
pub const GRID_FILE: &str = "nlte_triplet.csv";

/// 网格点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub teff: f64,
    pub logg: f64,
    pub feh: f64,
    /// 三条谱线各自的 LTE 丰度
    pub ao: [f64; 3],
    /// 三条谱线的修正量
    pub dao: [f64; 3],
}

/// CSV 行
#[derive(Debug, Deserialize)]
struct GridRow {
    teff: f64,
    logg: f64,
    feh: f64,
    ao: Option<f64>,
    ao0: Option<f64>,
    ao1: Option<f64>,
    ao2: Option<f64>,
    dao0: f64,
    dao1: f64,
    dao2: f64,
}

impl GridRow {
    fn into_point(self) -> Option<GridPoint> {
        let ao = match (self.ao0, self.ao1, self.ao2, self.ao) {
            (Some(a0), Some(a1), Some(a2), _) => [a0, a1, a2],
            (_, _, _, Some(a)) => [a, a, a],
            _ => return None,
        };
        Some(GridPoint {
            teff: self.teff,
            logg: self.logg,
            feh: self.feh,
            ao,
            dao: [self.dao0, self.dao1, self.dao2],
        })
    }
}

/// 只读 NLTE 网格
#[derive(Debug, Clone)]
pub struct NlteGrid {
    points: Vec<GridPoint>,
}

impl NlteGrid {
    /// 从网格点构建并校验布局
    pub fn from_points(points: Vec<GridPoint>) -> Result<Self> {
        if points.len() != GRID_ROWS {
            return Err(AbundanceError::InvalidGrid(format!(
                "expected {} rows ({} nodes x {}), found {}",
                GRID_ROWS,
                NODE_COUNT,
                ABUNDANCE_BLOCK,
                points.len()
            )));
        }

        for (i, p) in points.iter().enumerate() {
            let finite = [p.teff, p.logg, p.feh]
                .iter()
                .chain(p.ao.iter())
                .chain(p.dao.iter())
                .all(|v| v.is_finite());
            if !finite {
                return Err(AbundanceError::InvalidGrid(format!(
                    "non-finite value in row {}",
                    i + 1
                )));
            }
        }

        // 每个丰度节点内 (Teff, logg, [Fe/H]) 必须相同
        for (n, node) in points.chunks(ABUNDANCE_BLOCK).enumerate() {
            let head = node[0];
            if node
                .iter()
                .any(|p| p.teff != head.teff || p.logg != head.logg || p.feh != head.feh)
            {
                return Err(AbundanceError::InvalidGrid(format!(
                    "node {} mixes stellar parameters within its abundance block",
                    n
                )));
            }
        }

        Ok(NlteGrid { points })
    }

    /// 从 CSV 文件加载
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AbundanceError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let file = File::open(path).map_err(|e| AbundanceError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let grid = Self::from_reader(file, &path.display().to_string())?;
        log::info!("Loaded NLTE grid from {} ({} rows)", path.display(), GRID_ROWS);
        Ok(grid)
    }

    /// 从任意 CSV 读取器加载
    pub fn from_reader<R: Read>(reader: R, label: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut points = Vec::with_capacity(GRID_ROWS);

        for (i, row) in rdr.deserialize::<GridRow>().enumerate() {
            let row = row?;
            let point = row.into_point().ok_or_else(|| AbundanceError::ParseError {
                format: "NLTE grid".to_string(),
                path: label.to_string(),
                reason: format!("row {} has neither 'ao' nor 'ao0..ao2' columns", i + 1),
            })?;
            points.push(point);
        }

        Self::from_points(points)
    }

    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    /// 按丰度块切分的节点
    pub fn nodes(&self) -> std::slice::ChunksExact<'_, GridPoint> {
        self.points.chunks_exact(ABUNDANCE_BLOCK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_layout_constants() {
        assert_eq!(NODE_COUNT % GRAVITY_BLOCK, 0);
        assert_eq!((NODE_COUNT / GRAVITY_BLOCK) % METALLICITY_BLOCK, 0);
        assert_eq!(NODE_COUNT / GRAVITY_BLOCK / METALLICITY_BLOCK, 16);
        assert_eq!(GRID_ROWS, 4480);
    }

    #[test]
    fn test_rejects_wrong_row_count() {
        let mut points = testing::linear_grid_points();
        points.pop();
        let err = NlteGrid::from_points(points).unwrap_err();
        assert!(matches!(err, AbundanceError::InvalidGrid(_)));
    }

    #[test]
    fn test_rejects_mixed_block() {
        let mut points = testing::linear_grid_points();
        points[3].logg += 0.1;
        assert!(NlteGrid::from_points(points).is_err());
    }

    #[test]
    fn test_csv_shared_ao_column() {
        let mut csv_text = String::from("teff,logg,feh,ao,dao0,dao1,dao2\n");
        for p in testing::linear_grid_points() {
            csv_text.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                p.teff, p.logg, p.feh, p.ao[0], p.dao[0], p.dao[1], p.dao[2]
            ));
        }
        let grid = NlteGrid::from_reader(csv_text.as_bytes(), "inline").unwrap();
        assert_eq!(grid.points().len(), GRID_ROWS);
        assert_eq!(grid.nodes().count(), NODE_COUNT);
        assert_eq!(grid.points()[0].ao, [7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_csv_per_line_ao_columns() {
        let mut csv_text = String::from("teff,logg,feh,ao0,dao0,ao1,dao1,ao2,dao2\n");
        for p in testing::linear_grid_points() {
            csv_text.push_str(&format!(
                "{},{},{},{},{},{},{},{},{}\n",
                p.teff, p.logg, p.feh, p.ao[0], p.dao[0], p.ao[1], p.dao[1], p.ao[2], p.dao[2]
            ));
        }
        let grid = NlteGrid::from_reader(csv_text.as_bytes(), "inline").unwrap();
        assert_eq!(grid.points()[8].dao, testing::linear_grid_points()[8].dao);
    }

    #[test]
    fn test_missing_file() {
        let err = NlteGrid::load(Path::new("/nonexistent/nlte_triplet.csv")).unwrap_err();
        assert!(matches!(err, AbundanceError::FileNotFound { .. }));
    }
}
