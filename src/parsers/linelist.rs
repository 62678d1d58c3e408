//! # 谱线表解析器
//!
//! 读取谱线表 CSV：`wavelength, species, ep, gf, <star id>...`，
//! 每个恒星列为该星的等值宽度 (mÅ)，空单元格表示未测量。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `commands/abund.rs` 使用
//! - 使用 `models/star.rs`

use crate::error::{AbundanceError, Result};
use crate::models::LineMeasurement;

use std::fs::File;
use std::io::Read;
use std::path::Path;

const FIXED_COLUMNS: [&str; 4] = ["wavelength", "species", "ep", "gf"];

/// 谱线表中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct LineListRow {
    pub wavelength: f64,
    pub species: f64,
    pub ep: f64,
    pub gf: f64,
    /// 与 `LineList::stars` 对齐的等值宽度
    pub ews: Vec<Option<f64>>,
}

/// 多星谱线表
#[derive(Debug, Clone, Default)]
pub struct LineList {
    /// 恒星列名
    pub stars: Vec<String>,
    pub rows: Vec<LineListRow>,
}

impl LineList {
    pub fn has_star(&self, id: &str) -> bool {
        self.stars.iter().any(|s| s == id)
    }

    /// 某颗星测量到的谱线（保持表中顺序）
    pub fn lines_for_star(&self, id: &str) -> Option<Vec<LineMeasurement>> {
        let col = self.stars.iter().position(|s| s == id)?;
        Some(
            self.rows
                .iter()
                .filter_map(|r| {
                    r.ews[col].map(|ew| LineMeasurement {
                        wavelength: r.wavelength,
                        species: r.species,
                        ep: r.ep,
                        gf: r.gf,
                        ew,
                    })
                })
                .collect(),
        )
    }

    /// 表中出现的物种代码（升序去重）
    pub fn species_codes(&self) -> Vec<f64> {
        let mut codes: Vec<f64> = self.rows.iter().map(|r| r.species).collect();
        codes.sort_by(|a, b| a.total_cmp(b));
        codes.dedup();
        codes
    }
}

/// 读取谱线表文件
pub fn parse_linelist_file(path: &Path) -> Result<LineList> {
    let file = File::open(path).map_err(|e| AbundanceError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_linelist(file, &path.display().to_string())
}

/// 从读取器解析谱线表
pub fn parse_linelist<R: Read>(reader: R, label: &str) -> Result<LineList> {
    let parse_err = |reason: String| AbundanceError::ParseError {
        format: "line list".to_string(),
        path: label.to_string(),
        reason,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for (i, name) in FIXED_COLUMNS.iter().enumerate() {
        if headers.get(i) != Some(*name) {
            return Err(parse_err(format!(
                "column {} must be '{}', found '{}'",
                i + 1,
                name,
                headers.get(i).unwrap_or("")
            )));
        }
    }
    let stars: Vec<String> = headers
        .iter()
        .skip(FIXED_COLUMNS.len())
        .map(|s| s.to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let number = |col: usize| -> Result<f64> {
            let cell = record.get(col).unwrap_or("");
            cell.parse::<f64>().map_err(|_| {
                parse_err(format!(
                    "row {}: invalid {} '{}'",
                    i + 1,
                    headers.get(col).unwrap_or("value"),
                    cell
                ))
            })
        };

        let wavelength = number(0)?;
        let species = number(1)?;
        let ep = number(2)?;
        let gf = number(3)?;

        let mut ews = Vec::with_capacity(stars.len());
        for col in FIXED_COLUMNS.len()..FIXED_COLUMNS.len() + stars.len() {
            let cell = record.get(col).unwrap_or("");
            if cell.is_empty() {
                ews.push(None);
            } else {
                ews.push(Some(number(col)?));
            }
        }

        rows.push(LineListRow {
            wavelength,
            species,
            ep,
            gf,
            ews,
        });
    }

    Ok(LineList { stars, rows })
}
