//! # 误差传递
//!
//! 对每个声明了正 1σ 误差的恒星参数做 ±1σ 扰动，重跑该物种的完整流水线，
//! 取两次平均丰度之差的一半作为该参数的贡献；谱线间弥散为均值标准误差。
//! 总误差为五项的平方和开方。
//!
//! ## 约定
//! - 只做后处理：物种丰度未计算时返回 `NotComputed` 错误
//! - 扰动在同一个工作副本上依次进行，每个参数用完后恢复原值（逐位相同）
//! - 目标星自身的参数与逐线结果不被扰动计算覆盖
//!
//! ## 依赖关系
//! - 被 `abundance/pipeline.rs` 调用
//! - 使用 `models/abundance.rs` 的 `ErrorBudget`, `Summary`

use crate::abundance::pipeline::{AnalysisContext, Reference};
use crate::error::{AbundanceError, Result};
use crate::models::{ErrorBudget, ErrorKind, LineAbundances, Parameter, Star, Summary};

fn summary(lines: &LineAbundances, kind: ErrorKind) -> Summary {
    match kind {
        ErrorKind::Absolute => lines.absolute_summary(),
        ErrorKind::Differential => lines.differential_summary(),
    }
}

/// 谱线间弥散：std / sqrt(max(n, 2) - 1)
pub fn line_scatter(lines: &LineAbundances, kind: ErrorKind) -> f64 {
    summary(lines, kind).standard_error()
}

/// 计算并记录某物种的误差预算
pub fn propagate(
    ctx: &AnalysisContext<'_>,
    star: &mut Star,
    species_id: &str,
    mut reference: Option<&mut Reference>,
) -> Result<ErrorBudget> {
    let result = star
        .abundances
        .get(species_id)
        .ok_or_else(|| AbundanceError::NotComputed {
            star: star.name.clone(),
            species: species_id.to_string(),
        })?;

    let kind = if reference.is_some() {
        ErrorKind::Differential
    } else {
        ErrorKind::Absolute
    };
    let l2l = line_scatter(&result.lines, kind);

    let inner = ctx.for_perturbation();
    let ids = [species_id.to_string()];
    let mut work = star.clone();
    let mut contributions = [0.0; 4];

    for (k, param) in Parameter::ALL.iter().enumerate() {
        let Some(sigma) = star.params.get(*param).sigma() else {
            continue;
        };
        let original = work.params.get(*param).value;

        work.params.get_mut(*param).value = original + sigma;
        let plus = perturbed_mean(&inner, &mut work, &ids, kind, reference.as_deref_mut());

        work.params.get_mut(*param).value = original - sigma;
        let minus = perturbed_mean(&inner, &mut work, &ids, kind, reference.as_deref_mut());

        work.params.get_mut(*param).value = original;

        contributions[k] = (plus? - minus?).abs() / 2.0;
    }

    let [teff, logg, feh, vt] = contributions;
    let budget = ErrorBudget::new(kind, l2l, teff, logg, feh, vt);

    let level = if ctx.options.silent {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    log::log!(level, "Error propagation for {} ({}):", species_id, star.name);
    log::log!(level, "Line to line scatter:  {:.3}", budget.line_scatter);
    log::log!(level, "Error from Teff:       {:.3}", budget.teff);
    log::log!(level, "Error from logg:       {:.3}", budget.logg);
    log::log!(level, "Error from [Fe/H]:     {:.3}", budget.feh);
    log::log!(level, "Error from vt:         {:.3}", budget.vt);
    log::log!(level, "Total abundance error: {:.3}", budget.total);

    if let Some(result) = star.abundances.get_mut(species_id) {
        result.error = Some(budget);
    }
    Ok(budget)
}

fn perturbed_mean(
    ctx: &AnalysisContext<'_>,
    work: &mut Star,
    ids: &[String],
    kind: ErrorKind,
    reference: Option<&mut Reference>,
) -> Result<f64> {
    ctx.get_one(work, ids, reference)?;
    match work.result(&ids[0]) {
        Some(r) => Ok(summary(&r.lines, kind).mean),
        None => {
            log::warn!(
                "Perturbed run for {} of {} produced no lines",
                ids[0],
                work.name
            );
            Ok(f64::NAN)
        }
    }
}
