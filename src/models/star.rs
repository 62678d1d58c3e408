//! # 恒星数据模型
//!
//! 恒星参数（Teff, logg, [Fe/H], vt 及其 1σ 误差）、谱线测量值，
//! 以及按物种存放的丰度结果。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `abundance/`, `batch/`, `gce.rs` 使用
//! - 使用 `models/abundance.rs`

use crate::models::abundance::SpeciesResult;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 带可选 1σ 误差的测量值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measured {
    pub value: f64,
    pub error: Option<f64>,
}

impl Measured {
    pub fn new(value: f64, error: Option<f64>) -> Self {
        Self { value, error }
    }

    /// 仅在声明了正误差时返回 σ
    pub fn sigma(&self) -> Option<f64> {
        self.error.filter(|e| *e > 0.0)
    }
}

/// 恒星大气参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StellarParameters {
    /// 有效温度 (K)
    pub teff: Measured,
    /// 表面重力 log g (cgs)
    pub logg: Measured,
    /// 金属丰度 [Fe/H] (dex)
    pub feh: Measured,
    /// 微湍流速度 (km/s)
    pub vt: Measured,
}

/// 可扰动的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Teff,
    Logg,
    Feh,
    Vt,
}

impl Parameter {
    pub const ALL: [Parameter; 4] = [
        Parameter::Teff,
        Parameter::Logg,
        Parameter::Feh,
        Parameter::Vt,
    ];
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Parameter::Teff => write!(f, "Teff"),
            Parameter::Logg => write!(f, "logg"),
            Parameter::Feh => write!(f, "[Fe/H]"),
            Parameter::Vt => write!(f, "vt"),
        }
    }
}

impl StellarParameters {
    pub fn get(&self, p: Parameter) -> &Measured {
        match p {
            Parameter::Teff => &self.teff,
            Parameter::Logg => &self.logg,
            Parameter::Feh => &self.feh,
            Parameter::Vt => &self.vt,
        }
    }

    pub fn get_mut(&mut self, p: Parameter) -> &mut Measured {
        match p {
            Parameter::Teff => &mut self.teff,
            Parameter::Logg => &mut self.logg,
            Parameter::Feh => &mut self.feh,
            Parameter::Vt => &mut self.vt,
        }
    }
}

/// 单条谱线测量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineMeasurement {
    /// 波长 (Å)
    pub wavelength: f64,
    /// 物种代码
    pub species: f64,
    /// 激发势 (eV)
    pub ep: f64,
    /// log gf
    pub gf: f64,
    /// 等值宽度 (mÅ)
    pub ew: f64,
}

/// 恒星
#[derive(Debug, Clone)]
pub struct Star {
    /// 恒星标识
    pub name: String,
    /// 大气参数
    pub params: StellarParameters,
    /// 年龄 (Gyr)，用于 GCE 修正
    pub age: Option<f64>,
    /// 按星表顺序的谱线测量
    pub lines: Vec<LineMeasurement>,
    /// 物种标识 -> 丰度结果
    pub abundances: BTreeMap<String, SpeciesResult>,
}

impl Star {
    pub fn new(name: impl Into<String>, params: StellarParameters) -> Self {
        Star {
            name: name.into(),
            params,
            age: None,
            lines: Vec::new(),
            abundances: BTreeMap::new(),
        }
    }

    pub fn with_lines(mut self, lines: Vec<LineMeasurement>) -> Self {
        self.lines = lines;
        self
    }

    /// 某一物种的谱线（保持原始顺序）
    pub fn lines_for(&self, code: f64) -> Vec<&LineMeasurement> {
        self.lines.iter().filter(|l| l.species == code).collect()
    }

    /// 星表中出现的物种代码（升序去重）
    pub fn species_codes(&self) -> Vec<f64> {
        let mut codes: Vec<f64> = self.lines.iter().map(|l| l.species).collect();
        codes.sort_by(|a, b| a.total_cmp(b));
        codes.dedup();
        codes
    }

    pub fn result(&self, species_id: &str) -> Option<&SpeciesResult> {
        self.abundances.get(species_id)
    }
}
