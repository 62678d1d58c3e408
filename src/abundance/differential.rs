//! # 差分丰度匹配
//!
//! 按波长精确相等（非最近邻）匹配目标星与参考星的逐线丰度。
//! 两者来自同一谱线表，因此浮点相等比较是可靠的。
//!
//! ## 约定
//! - 输出长度与顺序和目标星输入完全一致
//! - 参考星无对应谱线时为 `Differential::Absent`，绝不写为 0
//! - 参考星完全没有该物种谱线时全部为 `Absent`，不视为错误
//!
//! ## 依赖关系
//! - 被 `abundance/pipeline.rs` 调用
//! - 使用 `models/abundance.rs`

use crate::models::{Differential, LineAbundances, SpeciesResult};

/// 逐线差分：目标 - 参考
pub fn match_lines(target: &LineAbundances, reference: &LineAbundances) -> Vec<Differential> {
    target
        .records
        .iter()
        .map(|t| {
            reference
                .records
                .iter()
                .find(|r| r.wavelength == t.wavelength)
                .map(|r| Differential::Value(t.abundance - r.abundance))
                .unwrap_or(Differential::Absent)
        })
        .collect()
}

/// 写入差分结果并记录参考星来源
pub fn apply(result: &mut SpeciesResult, reference: &LineAbundances, reference_name: &str) {
    let diffs = match_lines(&result.lines, reference);
    for (rec, d) in result.lines.records.iter_mut().zip(diffs) {
        rec.differential = d;
    }
    result.reference = Some(reference_name.to_string());
}
