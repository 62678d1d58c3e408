//! # 丰度结果数据模型
//!
//! 逐谱线丰度、差分丰度（三态）与误差预算。
//!
//! ## 约定
//! - `LineAbundances` 的顺序与谱线表一致，任何地方都不得重新排序
//! - 差分值 `Absent` 表示参考星无此谱线，统计时排除，不等同于 0
//! - NLTE 插值失败的丰度以 NaN 表示“未知”，统计时同样排除
//!
//! ## 依赖关系
//! - 被 `models/star.rs`, `abundance/`, `batch/`, `gce.rs` 使用

use serde::{Deserialize, Serialize};

/// 单条谱线的差分丰度
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Differential {
    /// 未做差分分析
    #[default]
    NotComputed,
    /// 目标星 - 参考星 (dex)
    Value(f64),
    /// 参考星在该波长无谱线
    Absent,
}

impl Differential {
    pub fn value(&self) -> Option<f64> {
        match self {
            Differential::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// 单条谱线丰度记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    /// 波长 (Å)
    pub wavelength: f64,
    /// 丰度 A(X) (dex)，NaN 表示未知
    pub abundance: f64,
    /// 差分丰度
    #[serde(default)]
    pub differential: Differential,
    /// 激发势 (eV)
    pub ep: Option<f64>,
    /// log gf
    pub gf: Option<f64>,
    /// 等值宽度 (mÅ)
    pub ew: Option<f64>,
}

impl LineRecord {
    pub fn new(wavelength: f64, abundance: f64) -> Self {
        LineRecord {
            wavelength,
            abundance,
            differential: Differential::NotComputed,
            ep: None,
            gf: None,
            ew: None,
        }
    }
}

/// 某一物种的逐谱线丰度（有序）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineAbundances {
    pub records: Vec<LineRecord>,
}

impl LineAbundances {
    pub fn new(records: Vec<LineRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn wavelengths(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.wavelength).collect()
    }

    pub fn abundances(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.abundance).collect()
    }

    /// 绝对丰度统计（排除未知值）
    pub fn absolute_summary(&self) -> Summary {
        Summary::from_values(self.records.iter().map(|r| r.abundance))
    }

    /// 差分丰度统计（排除 Absent 与未知值）
    pub fn differential_summary(&self) -> Summary {
        Summary::from_values(self.records.iter().filter_map(|r| r.differential.value()))
    }
}

/// 误差预算针对的量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// 绝对丰度 A(X)
    Absolute,
    /// 差分丰度 [X/H]
    Differential,
}

/// 单物种误差预算
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorBudget {
    pub kind: ErrorKind,
    /// 谱线间弥散（均值标准误差）
    pub line_scatter: f64,
    pub teff: f64,
    pub logg: f64,
    pub feh: f64,
    pub vt: f64,
    /// 五项的平方和开方
    pub total: f64,
}

impl ErrorBudget {
    pub fn new(kind: ErrorKind, line_scatter: f64, teff: f64, logg: f64, feh: f64, vt: f64) -> Self {
        let total = (teff.powi(2) + logg.powi(2) + feh.powi(2) + vt.powi(2) + line_scatter.powi(2))
            .sqrt();
        ErrorBudget {
            kind,
            line_scatter,
            teff,
            logg,
            feh,
            vt,
            total,
        }
    }
}

/// 单物种结果
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesResult {
    /// 物种标识
    pub species_id: String,
    /// 逐谱线丰度
    pub lines: LineAbundances,
    /// 差分分析所用参考星（来源记录）
    pub reference: Option<String>,
    /// 误差预算
    pub error: Option<ErrorBudget>,
}

impl SpeciesResult {
    pub fn new(species_id: impl Into<String>, lines: LineAbundances) -> Self {
        SpeciesResult {
            species_id: species_id.into(),
            lines,
            reference: None,
            error: None,
        }
    }
}

/// 均值、总体标准差与计数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

impl Summary {
    /// 仅统计有限值；无值时均值和标准差为 NaN
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let vals: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        let count = vals.len();
        if count == 0 {
            return Summary {
                mean: f64::NAN,
                std: f64::NAN,
                count,
            };
        }
        let mean = vals.iter().sum::<f64>() / count as f64;
        let var = vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        Summary {
            mean,
            std: var.sqrt(),
            count,
        }
    }

    /// 均值标准误差，计数下限为 2
    pub fn standard_error(&self) -> f64 {
        self.std / ((self.count.max(2) - 1) as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_excludes_absent_and_unknown() {
        let mut records = vec![
            LineRecord::new(5000.0, 7.40),
            LineRecord::new(5001.0, f64::NAN),
            LineRecord::new(5002.0, 7.60),
        ];
        records[0].differential = Differential::Value(0.10);
        records[1].differential = Differential::Absent;
        records[2].differential = Differential::Value(0.0);
        let la = LineAbundances::new(records);

        let abs = la.absolute_summary();
        assert_eq!(abs.count, 2);
        assert!((abs.mean - 7.50).abs() < 1e-12);

        let dif = la.differential_summary();
        assert_eq!(dif.count, 2);
        assert!((dif.mean - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_standard_error_uses_floor() {
        let s = Summary::from_values([7.5]);
        assert_eq!(s.count, 1);
        assert_eq!(s.std, 0.0);
        assert_eq!(s.standard_error(), 0.0);

        let s = Summary::from_values([1.0, 3.0]);
        assert!((s.standard_error() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_error_budget_total_is_euclidean_norm() {
        let b = ErrorBudget::new(ErrorKind::Differential, 0.015, 0.02, 0.01, 0.03, 0.0);
        let expected =
            (0.02f64.powi(2) + 0.01f64.powi(2) + 0.03f64.powi(2) + 0.0f64.powi(2) + 0.015f64.powi(2))
                .sqrt();
        assert!((b.total - expected).abs() < 1e-15);
    }

    #[test]
    fn test_empty_summary_is_nan() {
        let s = Summary::from_values(Vec::<f64>::new());
        assert_eq!(s.count, 0);
        assert!(s.mean.is_nan());
    }
}
