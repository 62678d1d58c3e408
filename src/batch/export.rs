//! # 批量结果导出
//!
//! 每颗星一行的 CSV 表。每个物种依次输出：
//! `X, e_X, n_X`，有参考星时 `[X], e_[X], n_[X]`，计算误差时 `err_X`。
//! 失败的恒星或缺失的物种输出空单元格。
//!
//! ## 依赖关系
//! - 被 `commands/abund.rs` 调用
//! - 使用 `batch/runner.rs` 的 BatchResult
//! - 使用 `csv` 库写入 CSV 文件

use crate::batch::{BatchResult, StarRow};
use crate::error::{AbundanceError, Result};
use crate::models::{SpeciesResult, Summary};

use std::path::Path;

/// 输出列布局
#[derive(Debug, Clone)]
pub struct ExportLayout {
    pub species_ids: Vec<String>,
    pub differential: bool,
    pub errors: bool,
}

impl ExportLayout {
    fn columns_per_species(&self) -> usize {
        3 + if self.differential { 3 } else { 0 } + usize::from(self.errors)
    }

    /// 表头
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["id".to_string()];
        for id in &self.species_ids {
            header.push(id.clone());
            header.push(format!("e_{}", id));
            header.push(format!("n_{}", id));
            if self.differential {
                header.push(format!("[{}]", id));
                header.push(format!("e_[{}]", id));
                header.push(format!("n_[{}]", id));
            }
            if self.errors {
                header.push(format!("err_{}", id));
            }
        }
        header
    }

    /// 一行记录
    pub fn record(&self, row: &StarRow) -> Vec<String> {
        let mut record = vec![row.name.clone()];
        for id in &self.species_ids {
            match row.star.as_ref().and_then(|s| s.result(id)) {
                Some(result) => self.species_cells(result, &mut record),
                None => {
                    record.extend(std::iter::repeat(String::new()).take(self.columns_per_species()))
                }
            }
        }
        record
    }

    fn species_cells(&self, result: &SpeciesResult, record: &mut Vec<String>) {
        push_summary(record, &result.lines.absolute_summary());
        if self.differential {
            push_summary(record, &result.lines.differential_summary());
        }
        if self.errors {
            record.push(
                result
                    .error
                    .map(|b| fmt3(b.total))
                    .unwrap_or_default(),
            );
        }
    }
}

fn fmt3(v: f64) -> String {
    if v.is_finite() {
        format!("{:.3}", v)
    } else {
        String::new()
    }
}

fn push_summary(record: &mut Vec<String>, s: &Summary) {
    record.push(fmt3(s.mean));
    record.push(fmt3(s.std));
    record.push(s.count.to_string());
}

/// 导出为 CSV
pub fn to_csv(result: &BatchResult, layout: &ExportLayout, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(AbundanceError::CsvError)?;

    wtr.write_record(layout.header())
        .map_err(AbundanceError::CsvError)?;

    for row in &result.rows {
        wtr.write_record(layout.record(row))
            .map_err(AbundanceError::CsvError)?;
    }

    wtr.flush().map_err(|e| AbundanceError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
