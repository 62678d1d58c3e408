//! # 解析器模块
//!
//! 提供恒星参数表与谱线表的解析器，并组装 `Star`。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: star_data, linelist

pub mod linelist;
pub mod star_data;

pub use linelist::{parse_linelist_file, LineList};
pub use star_data::{parse_star_data_file, StarDataRow};

use crate::error::{AbundanceError, Result};
use crate::models::Star;

/// 由参数表行与谱线表组装恒星
pub fn build_star(row: &StarDataRow, lines: &LineList) -> Result<Star> {
    let params = row.to_params()?;
    let measured = lines
        .lines_for_star(&row.id)
        .ok_or_else(|| AbundanceError::MissingStarData {
            star: row.id.clone(),
            field: "line list column".to_string(),
        })?;

    let mut star = Star::new(row.id.clone(), params).with_lines(measured);
    star.age = row.age;
    Ok(star)
}

/// 在参数表中按标识查找并组装恒星
pub fn find_star(rows: &[StarDataRow], lines: &LineList, id: &str) -> Result<Star> {
    let row = rows
        .iter()
        .find(|r| r.id == id)
        .ok_or_else(|| AbundanceError::MissingStarData {
            star: id.to_string(),
            field: "star data row".to_string(),
        })?;
    build_star(row, lines)
}
