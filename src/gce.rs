//! # 银河系化学演化 (GCE) 年龄修正
//!
//! 对差分丰度做与年龄相关的 GCE 修正：
//!
//! ```text
//! Δ = sqrt((age - b)² / c² + 1) - sqrt((age_ref - b)² / c² + 1)
//! ```
//!
//! 其中 (b, c) 为各物种的拟合系数，无系数的物种不修正。
//! 凝聚温度相同的物种（如 FeI/FeII）以逆方差加权合并为一点，
//! 供 [X/H]-Tc 趋势分析使用。
//!
//! ## 依赖关系
//! - 被 `commands/abund.rs` 调用
//! - 使用 `models/species.rs` 的凝聚温度表

use crate::error::{AbundanceError, Result};
use crate::models::{species, Star};

use std::path::Path;

/// 各物种 GCE 系数 (b, c)
const GCE_COEFFICIENTS: &[(&str, f64, f64)] = &[
    ("CI", 16.3, 22.8),
    ("CH", 16.3, 22.8),
    ("OI", 48.0, 45.8),
    ("NaI", 5.0, -6.3),
    ("MgI", 8.0, 18.2),
    ("MgII", 8.0, 18.2),
    ("AlI", 8.2, 15.5),
    ("SiI", 5.9, 15.2),
    ("SI", 5.8, 15.1),
    ("CaI", 5.0, 14.2),
    ("ScI", 5.6, 10.2),
    ("ScII", 5.6, 10.2),
    ("TiI", 15.0, 41.2),
    ("TiII", 15.0, 41.2),
    ("VI", 4.7, 12.6),
    ("CrI", 6.2, 25.0),
    ("CrII", 6.2, 25.0),
    ("MnI", 4.8, 9.8),
    ("CoI", 5.2, 8.8),
    ("NiI", 5.0, 8.6),
    ("CuI", 7.1, 11.0),
    ("ZnI", 6.3, 11.4),
];

/// 修正后的一个 Tc 点
#[derive(Debug, Clone, PartialEq)]
pub struct GceRow {
    /// 参与合并的物种
    pub species: Vec<String>,
    /// 凝聚温度 (K)
    pub tc: f64,
    /// 修正后的差分丰度 (dex)
    pub abundance: f64,
    /// 误差 (dex)
    pub error: f64,
}

/// 某物种的 GCE 系数
pub fn coefficients(species_id: &str) -> Option<(f64, f64)> {
    GCE_COEFFICIENTS
        .iter()
        .find(|(id, _, _)| *id == species_id)
        .map(|&(_, b, c)| (b, c))
}

/// 年龄 `age` 相对 `ref_age` 的修正量；无系数时为 0
pub fn correction(species_id: &str, age: f64, ref_age: f64) -> f64 {
    match coefficients(species_id) {
        Some((b, c)) => {
            let term = |t: f64| ((t - b).powi(2) / c.powi(2) + 1.0).sqrt();
            term(age) - term(ref_age)
        }
        None => 0.0,
    }
}

/// 对一颗星的差分丰度做 GCE 修正并按 Tc 合并
pub fn correct(star: &Star, species_ids: &[String], age: f64, ref_age: f64) -> Result<Vec<GceRow>> {
    if !star.abundances.values().any(|r| r.reference.is_some()) {
        return Err(AbundanceError::NotComputed {
            star: star.name.clone(),
            species: "differential".to_string(),
        });
    }

    let mut rows: Vec<GceRow> = Vec::new();

    for id in species_ids {
        let Some(tc) = species::condensation_temperature(id) else {
            log::warn!("species id not recognized: {}", id);
            continue;
        };
        let Some(result) = star.result(id).filter(|r| r.reference.is_some()) else {
            log::warn!("No differential {} abundances for {}", id, star.name);
            continue;
        };

        let summary = result.lines.differential_summary();
        if summary.count == 0 {
            log::warn!("No differential {} abundances for {}", id, star.name);
            continue;
        }

        let delta = correction(id, age, ref_age);
        if coefficients(id).is_none() {
            log::debug!("No GCE correction available for {}", id);
        } else {
            log::debug!("GCE correction of {:6.3} dex made for {}", -delta, id);
        }

        let point = GceRow {
            species: vec![id.clone()],
            tc,
            abundance: summary.mean - delta,
            error: summary.standard_error(),
        };

        match rows.iter_mut().find(|r| r.tc == tc) {
            Some(existing) => merge(existing, point),
            None => rows.push(point),
        }
    }

    Ok(rows)
}

/// 逆方差加权合并；任一误差非正时退化为等权平均
fn merge(into: &mut GceRow, other: GceRow) {
    let (a, ea) = (into.abundance, into.error);
    let (b, eb) = (other.abundance, other.error);

    if ea > 0.0 && eb > 0.0 && ea.is_finite() && eb.is_finite() {
        let (wa, wb) = (1.0 / ea.powi(2), 1.0 / eb.powi(2));
        into.abundance = (a * wa + b * wb) / (wa + wb);
        into.error = 1.0 / (wa + wb).sqrt();
    } else {
        into.abundance = (a + b) / 2.0;
        into.error = (ea.powi(2) + eb.powi(2)).sqrt() / 2.0;
    }
    into.species.extend(other.species);
}

/// 导出多颗星的 GCE 结果
pub fn to_csv(entries: &[(String, Vec<GceRow>)], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(AbundanceError::CsvError)?;

    wtr.write_record(["id", "species", "tc", "abundance", "error"])
        .map_err(AbundanceError::CsvError)?;

    for (star, rows) in entries {
        for row in rows {
            wtr.write_record(&[
                star.clone(),
                row.species.join("+"),
                format!("{:.1}", row.tc),
                format!("{:.3}", row.abundance),
                format!("{:.3}", row.error),
            ])
            .map_err(AbundanceError::CsvError)?;
        }
    }

    wtr.flush().map_err(|e| AbundanceError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
