//! # O I 777 nm 三重线 NLTE 修正
//!
//! 对三条谱线的 LTE 丰度做逐级三次插值约化：
//!
//! 1. 丰度轴：640 个节点 × 7 点，在各线原始丰度处插值
//! 2. logg 轴：160 个节点 × 4 点
//! 3. [Fe/H] 轴：16 个节点 × 10 点（[Fe/H] 上限截断为 0.4）
//! 4. Teff 轴：16 点
//!
//! 然后减去经验零点、由原始丰度减去修正量并保留 3 位小数。
//! 任一级插值失败（查询点超出该节点范围）结果为未知，沿后续各级传递。
//!
//! ## 依赖关系
//! - 被 `abundance/pipeline.rs`, `commands/nlte.rs` 使用
//! - 使用 `nlte/grid.rs`, `nlte/spline.rs`

use crate::models::LineRecord;
use crate::nlte::grid::{NlteGrid, GRAVITY_BLOCK, METALLICITY_BLOCK, NODE_COUNT};
use crate::nlte::spline;

/// 三重线波长 (Å)
pub const TRIPLET_WAVELENGTHS: [f64; 3] = [7771.94, 7774.16, 7775.39];
/// 各线经验零点
pub const ZERO_POINTS: [f64; 3] = [0.0355, 0.0180, 0.0000];
/// 网格 [Fe/H] 上限
pub const FEH_CEILING: f64 = 0.4;
/// 从谱线表中识别三重线的波长容差 (Å)
pub const MATCH_TOLERANCE: f64 = 0.05;

/// 温度轴节点数
const TEMPERATURE_NODES: usize = NODE_COUNT / GRAVITY_BLOCK / METALLICITY_BLOCK;

/// 单条三重线的修正结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripletLine {
    /// 波长 (Å)
    pub wavelength: f64,
    /// LTE 丰度
    pub lte: f64,
    /// 修正量（含零点），未知为 None
    pub correction: Option<f64>,
    /// NLTE 丰度（3 位小数），未知为 None
    pub nlte: Option<f64>,
}

/// 约化过程中的节点
#[derive(Debug, Clone, Copy)]
struct Node {
    teff: f64,
    logg: f64,
    feh: f64,
    delta: [Option<f64>; 3],
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Gravity,
    Metallicity,
    Temperature,
}

impl Axis {
    fn of(self, n: &Node) -> f64 {
        match self {
            Axis::Gravity => n.logg,
            Axis::Metallicity => n.feh,
            Axis::Temperature => n.teff,
        }
    }
}

/// 三重线修正器
pub struct TripletCorrector<'g> {
    grid: &'g NlteGrid,
}

impl<'g> TripletCorrector<'g> {
    pub fn new(grid: &'g NlteGrid) -> Self {
        Self { grid }
    }

    /// 修正三重线丰度，缺失的谱线不出现在结果中
    pub fn correct(
        &self,
        raw: [Option<f64>; 3],
        teff: f64,
        logg: f64,
        feh: f64,
    ) -> Vec<TripletLine> {
        let deltas = self.deltas(raw, teff, logg, feh);

        (0..3)
            .filter_map(|j| {
                let lte = raw[j]?;
                let correction = deltas[j].map(|d| d - ZERO_POINTS[j]);
                Some(TripletLine {
                    wavelength: TRIPLET_WAVELENGTHS[j],
                    lte,
                    correction,
                    nlte: correction.map(|c| round3(lte - c)),
                })
            })
            .collect()
    }

    /// 网格修正量（未扣零点）
    pub fn deltas(
        &self,
        raw: [Option<f64>; 3],
        teff: f64,
        logg: f64,
        feh: f64,
    ) -> [Option<f64>; 3] {
        let feh = if feh >= FEH_CEILING { FEH_CEILING } else { feh };

        let nodes = self.collapse_abundance(raw);
        let nodes = reduce(&nodes, GRAVITY_BLOCK, Axis::Gravity, logg);
        let nodes = reduce(&nodes, METALLICITY_BLOCK, Axis::Metallicity, feh);
        let nodes = reduce(&nodes, TEMPERATURE_NODES, Axis::Temperature, teff);

        debug_assert_eq!(nodes.len(), 1);
        nodes.first().map(|n| n.delta).unwrap_or([None; 3])
    }

    fn collapse_abundance(&self, raw: [Option<f64>; 3]) -> Vec<Node> {
        self.grid
            .nodes()
            .map(|block| {
                let head = block[0];
                let mut delta = [None; 3];
                for (j, d) in delta.iter_mut().enumerate() {
                    if let Some(ab) = raw[j] {
                        let xs: Vec<f64> = block.iter().map(|p| p.ao[j]).collect();
                        let ys: Vec<f64> = block.iter().map(|p| p.dao[j]).collect();
                        *d = spline::cubic_at(&xs, &ys, ab);
                    }
                }
                Node {
                    teff: head.teff,
                    logg: head.logg,
                    feh: head.feh,
                    delta,
                }
            })
            .collect()
    }
}

/// 按块沿某一轴插值，每块坍缩为首点坐标 + 插值结果
fn reduce(nodes: &[Node], block: usize, axis: Axis, at: f64) -> Vec<Node> {
    nodes
        .chunks(block)
        .map(|chunk| {
            let xs: Vec<f64> = chunk.iter().map(|n| axis.of(n)).collect();
            let mut delta = [None; 3];
            for (j, d) in delta.iter_mut().enumerate() {
                let ys: Option<Vec<f64>> = chunk.iter().map(|n| n.delta[j]).collect();
                *d = ys.and_then(|ys| spline::cubic_at(&xs, &ys, at));
            }
            Node { delta, ..chunk[0] }
        })
        .collect()
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// 从 O I 逐线结果中取出三重线 LTE 丰度
///
/// 每个三重线波长在容差内恰好匹配一条记录时才算存在。
pub fn extract_triplet(records: &[LineRecord]) -> [Option<f64>; 3] {
    for wx in ambiguous_wavelengths(records) {
        log::warn!(
            "More than one O I line within {} A of {:.2}; left in LTE",
            MATCH_TOLERANCE,
            wx
        );
    }

    let mut raw = [None; 3];
    for (j, wx) in TRIPLET_WAVELENGTHS.iter().enumerate() {
        let mut hits = records
            .iter()
            .filter(|r| (r.wavelength - wx).abs() < MATCH_TOLERANCE);
        if let (Some(hit), None) = (hits.next(), hits.next()) {
            raw[j] = Some(hit.abundance);
        }
    }
    raw
}

/// 匹配到多条记录的三重线波长
pub fn ambiguous_wavelengths(records: &[LineRecord]) -> Vec<f64> {
    TRIPLET_WAVELENGTHS
        .iter()
        .copied()
        .filter(|wx| {
            records
                .iter()
                .filter(|r| (r.wavelength - wx).abs() < MATCH_TOLERANCE)
                .count()
                > 1
        })
        .collect()
}

/// 将修正结果写回逐线记录，未知修正写为 NaN
pub fn apply_to(records: &mut [LineRecord], lines: &[TripletLine]) {
    for line in lines {
        let mut hits = records
            .iter_mut()
            .filter(|r| (r.wavelength - line.wavelength).abs() < MATCH_TOLERANCE);
        if let (Some(rec), None) = (hits.next(), hits.next()) {
            rec.abundance = line.nlte.unwrap_or(f64::NAN);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    const TOL: f64 = 6e-4;

    fn expected(raw: f64, j: usize, teff: f64, logg: f64, feh: f64) -> f64 {
        raw - (testing::linear_delta(j, teff, logg, feh, raw) - ZERO_POINTS[j])
    }

    #[test]
    fn test_linear_grid_reproduces_analytic_correction() {
        let grid = testing::linear_grid();
        let corrector = TripletCorrector::new(&grid);
        let lines = corrector.correct([Some(7.50), Some(7.62), Some(7.31)], 5777.0, 4.44, 0.1);

        assert_eq!(lines.len(), 3);
        for (j, (line, raw)) in lines.iter().zip([7.50, 7.62, 7.31]).enumerate() {
            assert_eq!(line.wavelength, TRIPLET_WAVELENGTHS[j]);
            let got = line.nlte.unwrap();
            let want = expected(raw, j, 5777.0, 4.44, 0.1);
            assert!((got - want).abs() < TOL, "line {}: {} vs {}", j, got, want);
        }
    }

    #[test]
    fn test_deterministic() {
        let grid = testing::linear_grid();
        let corrector = TripletCorrector::new(&grid);
        let raw = [Some(7.50), Some(7.50), Some(7.50)];
        let first = corrector.correct(raw, 5777.0, 4.44, 0.0);
        for _ in 0..3 {
            assert_eq!(corrector.correct(raw, 5777.0, 4.44, 0.0), first);
        }
    }

    #[test]
    fn test_metallicity_clamped_at_ceiling() {
        let grid = testing::linear_grid();
        let corrector = TripletCorrector::new(&grid);
        let raw = [Some(7.50), Some(7.50), Some(7.50)];
        let at_ceiling = corrector.correct(raw, 5777.0, 4.44, 0.4);
        assert!(at_ceiling.iter().all(|l| l.nlte.is_some()));
        for feh in [0.4, 0.41, 0.6, 1.5] {
            assert_eq!(corrector.correct(raw, 5777.0, 4.44, feh), at_ceiling);
        }
    }

    #[test]
    fn test_absent_lines_are_dropped() {
        let grid = testing::linear_grid();
        let corrector = TripletCorrector::new(&grid);
        let lines = corrector.correct([Some(7.50), None, Some(7.40)], 5777.0, 4.44, 0.0);
        let waves: Vec<f64> = lines.iter().map(|l| l.wavelength).collect();
        assert_eq!(waves, vec![7771.94, 7775.39]);
    }

    #[test]
    fn test_out_of_range_is_unknown_not_zero() {
        let grid = testing::linear_grid();
        let corrector = TripletCorrector::new(&grid);

        let hot = corrector.correct([Some(7.50); 3], 9000.0, 4.44, 0.0);
        assert_eq!(hot.len(), 3);
        assert!(hot.iter().all(|l| l.nlte.is_none() && l.correction.is_none()));

        // 单条谱线的丰度超出丰度轴，只影响该线
        let lines = corrector.correct([Some(7.50), Some(9.9), Some(7.50)], 5777.0, 4.44, 0.0);
        assert!(lines[0].nlte.is_some());
        assert!(lines[1].nlte.is_none());
        assert!(lines[2].nlte.is_some());
    }

    #[test]
    fn test_extract_and_apply() {
        let mut records = vec![
            LineRecord::new(7771.95, 7.60),
            LineRecord::new(7774.16, 7.55),
            LineRecord::new(6300.30, 8.70),
        ];
        let raw = extract_triplet(&records);
        assert_eq!(raw, [Some(7.60), Some(7.55), None]);

        let lines = vec![
            TripletLine {
                wavelength: TRIPLET_WAVELENGTHS[0],
                lte: 7.60,
                correction: Some(0.2),
                nlte: Some(7.40),
            },
            TripletLine {
                wavelength: TRIPLET_WAVELENGTHS[1],
                lte: 7.55,
                correction: None,
                nlte: None,
            },
        ];
        apply_to(&mut records, &lines);
        assert_eq!(records[0].abundance, 7.40);
        assert!(records[1].abundance.is_nan());
        assert_eq!(records[2].abundance, 8.70);
    }

    #[test]
    fn test_ambiguous_match_is_absent() {
        let records = vec![LineRecord::new(7771.93, 7.6), LineRecord::new(7771.96, 7.7)];
        assert_eq!(extract_triplet(&records)[0], None);
        assert_eq!(ambiguous_wavelengths(&records), vec![7771.94]);
    }

    #[test]
    fn test_unique_matches_are_not_ambiguous() {
        let records = vec![LineRecord::new(7771.94, 7.6), LineRecord::new(7774.16, 7.7)];
        assert!(ambiguous_wavelengths(&records).is_empty());
    }
}
