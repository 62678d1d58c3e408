//! # 恒星参数表解析器
//!
//! 读取恒星参数 CSV：
//! `id, teff, err_teff, logg, err_logg, feh, err_feh, vt, err_vt[, feh_model][, age]`。
//! 空单元格表示未声明；`feh_model` 存在时替代 `feh` 用于模型大气。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `commands/abund.rs` 使用
//! - 使用 `models/star.rs`

use crate::error::{AbundanceError, Result};
use crate::models::{Measured, StellarParameters};

use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 参数表中的一行
#[derive(Debug, Clone, Deserialize)]
pub struct StarDataRow {
    pub id: String,
    pub teff: Option<f64>,
    pub err_teff: Option<f64>,
    pub logg: Option<f64>,
    pub err_logg: Option<f64>,
    pub feh: Option<f64>,
    pub err_feh: Option<f64>,
    pub vt: Option<f64>,
    pub err_vt: Option<f64>,
    #[serde(default)]
    pub feh_model: Option<f64>,
    #[serde(default)]
    pub age: Option<f64>,
}

impl StarDataRow {
    /// 转换为大气参数，缺少任一参数值时报错
    pub fn to_params(&self) -> Result<StellarParameters> {
        let need = |v: Option<f64>, field: &str| {
            v.filter(|x| x.is_finite())
                .ok_or_else(|| AbundanceError::MissingStarData {
                    star: self.id.clone(),
                    field: field.to_string(),
                })
        };

        let feh = match self.feh_model {
            Some(m) if m.is_finite() => m,
            _ => need(self.feh, "feh")?,
        };

        Ok(StellarParameters {
            teff: Measured::new(need(self.teff, "teff")?, self.err_teff),
            logg: Measured::new(need(self.logg, "logg")?, self.err_logg),
            feh: Measured::new(feh, self.err_feh),
            vt: Measured::new(need(self.vt, "vt")?, self.err_vt),
        })
    }
}

/// 读取恒星参数表文件
pub fn parse_star_data_file(path: &Path) -> Result<Vec<StarDataRow>> {
    let file = File::open(path).map_err(|e| AbundanceError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_star_data(file, &path.display().to_string())
}

/// 从读取器解析恒星参数表
pub fn parse_star_data<R: Read>(reader: R, label: &str) -> Result<Vec<StarDataRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, row) in rdr.deserialize::<StarDataRow>().enumerate() {
        let row = row.map_err(|e| AbundanceError::ParseError {
            format: "star data".to_string(),
            path: label.to_string(),
            reason: format!("row {}: {}", i + 1, e),
        })?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(AbundanceError::ParseError {
            format: "star data".to_string(),
            path: label.to_string(),
            reason: "no stars found".to_string(),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DATA: &str = "\
id,teff,err_teff,logg,err_logg,feh,err_feh,vt,err_vt,feh_model,age
sun,5777,,4.44,,0.0,,1.00,,,4.6
hip1,5800,50,4.40,0.05,0.05,0.03,1.10,0.08,0.07,3.2
hip2,,,4.30,,-0.1,,1.0,,,
";

    #[test]
    fn test_parse_rows() {
        let rows = parse_star_data(DATA.as_bytes(), "inline").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].id, "sun");
        assert_eq!(rows[0].err_teff, None);
        assert_eq!(rows[1].age, Some(3.2));
    }

    #[test]
    fn test_feh_model_overrides_feh() {
        let rows = parse_star_data(DATA.as_bytes(), "inline").unwrap();
        let p = rows[1].to_params().unwrap();
        assert_eq!(p.feh.value, 0.07);
        assert_eq!(p.feh.error, Some(0.03));
        assert_eq!(p.teff.sigma(), Some(50.0));
    }

    #[test]
    fn test_missing_parameter() {
        let rows = parse_star_data(DATA.as_bytes(), "inline").unwrap();
        let err = rows[2].to_params().unwrap_err();
        assert!(matches!(err, AbundanceError::MissingStarData { ref field, .. } if field == "teff"));
    }

    #[test]
    fn test_optional_columns_absent() {
        let text = "id,teff,err_teff,logg,err_logg,feh,err_feh,vt,err_vt\nsun,5777,,4.44,,0.0,,1.0,\n";
        let rows = parse_star_data(text.as_bytes(), "inline").unwrap();
        assert_eq!(rows[0].feh_model, None);
        assert_eq!(rows[0].age, None);
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DATA.as_bytes()).unwrap();
        let rows = parse_star_data_file(file.path()).unwrap();
        assert_eq!(rows.len(), 3);
    }
}
