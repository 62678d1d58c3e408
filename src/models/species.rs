//! # 物种（元素 + 电离态）查找表
//!
//! 提供物种标识（如 `FeII`）与数值代码（如 `26.1`）之间的双向映射，
//! 以及 50% 凝聚温度 Tc（Lodders 2003, Table 8）。
//!
//! ## 依赖关系
//! - 被 `abundance/pipeline.rs`, `gce.rs`, `commands/species.rs` 使用
//! - 使用 `regex` 拆分元素与电离态

use regex::Regex;
use std::sync::OnceLock;

/// 物种条目
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Species {
    /// 文本标识，如 "FeII"
    pub id: &'static str,
    /// 数值代码：原子序数 + 0.1 × 电离级次（分子为 100+）
    pub code: f64,
    /// 50% 凝聚温度 (K)
    pub tc: f64,
}

/// 物种的化学描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeciesKind {
    /// 原子/离子：元素符号与电离级次（1 = 中性）
    Atomic { element: String, stage: u8 },
    /// 分子
    Molecule,
}

const fn sp(id: &'static str, code: f64, tc: f64) -> Species {
    Species { id, code, tc }
}

/// 静态物种表
///
/// Y, Pr, Gd, Dy 的 Tc 在末位加了微小偏移，避免与 Sc/Ti 合并。
pub static SPECIES_TABLE: &[Species] = &[
    sp("LiI", 3.0, 1142.0),
    sp("BeI", 4.0, 1452.0),
    sp("BeII", 4.1, 1452.0),
    sp("BI", 5.0, 908.0),
    sp("CI", 6.0, 40.0),
    sp("CI2", 6.1, 40.0),
    sp("CH", 106.0, 40.0),
    sp("CH2", 106.1, 40.0),
    sp("NI", 7.0, 123.0),
    sp("OI", 8.0, 180.0),
    sp("OI2", 8.1, 180.0),
    sp("FI", 9.0, 734.0),
    sp("NaI", 11.0, 958.0),
    sp("MgI", 12.0, 1336.0),
    sp("MgII", 12.1, 1336.0),
    sp("AlI", 13.0, 1653.0),
    sp("SiI", 14.0, 1310.0),
    sp("PI", 15.0, 1229.0),
    sp("SI", 16.0, 664.0),
    sp("KI", 19.0, 1006.0),
    sp("CaI", 20.0, 1517.0),
    sp("ScI", 21.0, 1659.0),
    sp("ScII", 21.1, 1659.0),
    sp("TiI", 22.0, 1582.0),
    sp("TiII", 22.1, 1582.0),
    sp("VI", 23.0, 1429.0),
    sp("CrI", 24.0, 1296.0),
    sp("CrII", 24.1, 1296.0),
    sp("MnI", 25.0, 1158.0),
    sp("FeI", 26.0, 1334.0),
    sp("FeII", 26.1, 1334.0),
    sp("CoI", 27.0, 1352.0),
    sp("NiI", 28.0, 1353.0),
    sp("CuI", 29.0, 1037.0),
    sp("ZnI", 30.0, 726.0),
    sp("RbI", 37.0, 800.0),
    sp("SrI", 38.0, 1464.0),
    sp("SrII", 38.1, 1464.0),
    sp("YII", 39.1, 1659.0001),
    sp("ZrII", 40.1, 1741.0),
    sp("BaII", 56.1, 1455.0),
    sp("LaII", 57.1, 1578.0),
    sp("CeII", 58.1, 1478.0),
    sp("PrII", 59.1, 1582.0001),
    sp("NdII", 60.1, 1602.0),
    sp("SmII", 62.1, 1590.0),
    sp("EuII", 63.1, 1356.0),
    sp("GdII", 64.1, 1659.0002),
    sp("DyII", 66.1, 1659.0003),
];

/// 全部支持的物种，按原子序数排列
pub fn all() -> &'static [Species] {
    SPECIES_TABLE
}

/// 按文本标识查找物种
pub fn lookup(id: &str) -> Option<&'static Species> {
    SPECIES_TABLE.iter().find(|s| s.id == id)
}

/// 按数值代码查找物种
pub fn from_code(code: f64) -> Option<&'static Species> {
    SPECIES_TABLE.iter().find(|s| s.code == code)
}

/// 将一组数值代码转换为物种标识，未知代码记录警告后跳过
pub fn ids_for_codes(codes: &[f64]) -> Vec<String> {
    codes
        .iter()
        .filter_map(|&code| match from_code(code) {
            Some(s) => Some(s.id.to_string()),
            None => {
                log::warn!("species_code {} not found", code);
                None
            }
        })
        .collect()
}

/// 凝聚温度 (K)
pub fn condensation_temperature(id: &str) -> Option<f64> {
    lookup(id).map(|s| s.tc)
}

impl Species {
    /// 拆分元素与电离态
    ///
    /// `FeII` -> (Fe, 2)；末尾数字表示同一物种的第二套谱线（如 `CI2`）。
    pub fn kind(&self) -> SpeciesKind {
        if self.code >= 100.0 {
            return SpeciesKind::Molecule;
        }
        parse_atomic(self.id).unwrap_or(SpeciesKind::Molecule)
    }

    /// 光谱记号，如 "Fe II"
    pub fn notation(&self) -> String {
        match self.kind() {
            SpeciesKind::Atomic { element, stage } => {
                format!("{} {}", element, "I".repeat(stage as usize))
            }
            SpeciesKind::Molecule => self.id.trim_end_matches(char::is_numeric).to_string(),
        }
    }
}

fn atomic_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<el>[A-Z][a-z]?)(?P<ion>I{1,3})\d?$").expect("valid species pattern")
    })
}

fn parse_atomic(id: &str) -> Option<SpeciesKind> {
    let caps = atomic_pattern().captures(id)?;
    Some(SpeciesKind::Atomic {
        element: caps["el"].to_string(),
        stage: caps["ion"].len() as u8,
    })
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
