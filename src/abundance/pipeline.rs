//! # 丰度计算流水线
//!
//! 逐物种调用合成引擎，按需对 O I 三重线做 NLTE 修正，
//! 提供参考星时计算差分丰度，并可选地进行误差传递。
//!
//! ## 参考星缓存
//! 参考星每个物种的丰度在整个批次中至多计算一次，
//! 缓存状态显式记录为 `CacheState::{NotComputed, Computed}`。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs`, `abundance/uncertainty.rs` 调用
//! - 使用 `abundance/synth.rs`, `abundance/differential.rs`
//! - 使用 `nlte/` 与 `models/`

use crate::abundance::synth::Synthesizer;
use crate::abundance::{differential, uncertainty};
use crate::error::Result;
use crate::models::{species, LineAbundances, Species, SpeciesResult, Star};
use crate::nlte::{triplet, NlteGrid, TripletCorrector};

use log::Level;
use std::collections::BTreeMap;

/// 需要 NLTE 修正的物种
pub const NLTE_SPECIES: &str = "OI";

/// 全局运行选项
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// 对 O I 三重线做 NLTE 修正
    pub nlte: bool,
    /// 计算误差预算
    pub errors: bool,
    /// 静默模式：逐物种细节只在 debug 级别输出
    pub silent: bool,
    /// 模型大气网格名称（转交合成引擎）
    pub atmosphere: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            nlte: true,
            errors: false,
            silent: true,
            atmosphere: "odfnew".to_string(),
        }
    }
}

/// 参考星单物种缓存状态
#[derive(Debug, Clone, PartialEq)]
pub enum CacheState {
    NotComputed,
    Computed(LineAbundances),
}

/// 参考星及其丰度缓存
#[derive(Debug, Clone)]
pub struct Reference {
    pub star: Star,
    cache: BTreeMap<String, CacheState>,
}

impl Reference {
    pub fn new(star: Star) -> Self {
        Reference {
            star,
            cache: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.star.name
    }

    pub fn state(&self, species_id: &str) -> &CacheState {
        self.cache
            .get(species_id)
            .unwrap_or(&CacheState::NotComputed)
    }
}

/// 分析上下文：合成引擎、NLTE 网格与运行选项
#[derive(Clone)]
pub struct AnalysisContext<'a> {
    synthesizer: &'a dyn Synthesizer,
    grid: Option<&'a NlteGrid>,
    pub options: AnalysisOptions,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        synthesizer: &'a dyn Synthesizer,
        grid: Option<&'a NlteGrid>,
        options: AnalysisOptions,
    ) -> Self {
        AnalysisContext {
            synthesizer,
            grid,
            options,
        }
    }

    /// 误差传递内部重算所用的上下文：不再嵌套误差计算，静默输出
    pub(crate) fn for_perturbation(&self) -> AnalysisContext<'a> {
        AnalysisContext {
            options: AnalysisOptions {
                errors: false,
                silent: true,
                ..self.options.clone()
            },
            ..self.clone()
        }
    }

    fn detail_level(&self) -> Level {
        if self.options.silent {
            Level::Debug
        } else {
            Level::Info
        }
    }

    /// 计算一颗星的若干物种丰度，结果写入 `star.abundances`
    ///
    /// 合成引擎失败时返回错误（由调用方按星隔离）；
    /// 无可用谱线的物种记录警告后跳过。
    pub fn get_one(
        &self,
        star: &mut Star,
        species_ids: &[String],
        mut reference: Option<&mut Reference>,
    ) -> Result<()> {
        log::info!("Working on: {}", star.name);

        for species_id in species_ids {
            let Some(sp) = species::lookup(species_id) else {
                log::warn!("Not doing calculations for: {}", species_id);
                continue;
            };
            log::debug!("Working on: {}", species_id);

            let lines = match self.compute_species(star, sp)? {
                Some(lines) if !lines.is_empty() => lines,
                _ => {
                    log::warn!(
                        "Did not calculate {} abundances for {}",
                        species_id,
                        star.name
                    );
                    star.abundances.remove(species_id);
                    continue;
                }
            };

            let mut result = SpeciesResult::new(species_id.as_str(), lines);

            if let Some(r) = reference.as_deref_mut() {
                log::debug!("Differential analysis: {}", r.name());
                if r.name() == star.name {
                    log::warn!("Reference star object redefined!");
                    let own = result.lines.clone();
                    differential::apply(&mut result, &own, &star.name);
                } else {
                    let ref_lines = self.reference_lines(r, sp)?;
                    differential::apply(&mut result, &ref_lines, &r.star.name);
                }
            }

            self.log_summary(species_id, &result, reference.is_some());
            star.abundances.insert(species_id.clone(), result);

            if self.options.errors {
                uncertainty::propagate(self, star, species_id, reference.as_deref_mut())?;
            }
        }

        Ok(())
    }

    /// 单物种：合成 + (O I) NLTE 修正
    pub fn compute_species(&self, star: &Star, sp: &Species) -> Result<Option<LineAbundances>> {
        let Some(mut lines) = self
            .synthesizer
            .abfind(star, sp, &self.options.atmosphere)?
        else {
            return Ok(None);
        };

        if sp.id == NLTE_SPECIES && self.options.nlte {
            match self.grid {
                Some(grid) => self.correct_triplet(star, &mut lines, grid),
                None => log::warn!("No NLTE grid loaded; {} left in LTE", sp.id),
            }
        }

        Ok(Some(lines))
    }

    fn correct_triplet(&self, star: &Star, lines: &mut LineAbundances, grid: &NlteGrid) {
        let level = self.detail_level();
        log::log!(level, "777 nm oxygen abundances will be NLTE corrected ({})", star.name);

        let raw = triplet::extract_triplet(&lines.records);
        let p = &star.params;
        let corrected =
            TripletCorrector::new(grid).correct(raw, p.teff.value, p.logg.value, p.feh.value);

        log::log!(level, "Wavelength (A) | A(O) LTE | Correction | A(O) NLTE");
        for line in &corrected {
            log::log!(
                level,
                "   {:7.1}     |  {:6.3}  |   {:>6}   | {:>6}",
                line.wavelength,
                line.lte,
                fmt_opt(line.correction, 3),
                fmt_opt(line.nlte, 3)
            );
        }
        if corrected.iter().any(|l| l.nlte.is_none()) {
            log::warn!(
                "NLTE correction undefined for some O I lines of {} (outside grid)",
                star.name
            );
        }

        triplet::apply_to(&mut lines.records, &corrected);
    }

    /// 参考星某物种的逐线丰度，至多计算一次
    fn reference_lines(&self, reference: &mut Reference, sp: &Species) -> Result<LineAbundances> {
        if let CacheState::Computed(lines) = reference.state(sp.id) {
            log::debug!(
                "Reference star has {} abundances computed already: {}",
                sp.id,
                reference.name()
            );
            return Ok(lines.clone());
        }

        log::info!("Calculating reference star abundances: {}", reference.name());
        let lines = match self.compute_species(&reference.star, sp) {
            Ok(Some(lines)) => lines,
            Ok(None) => {
                log::warn!("Reference star {} has no {} lines", reference.name(), sp.id);
                LineAbundances::default()
            }
            Err(e) => {
                log::warn!(
                    "Reference star {} {} abundances failed: {}",
                    reference.name(),
                    sp.id,
                    e
                );
                LineAbundances::default()
            }
        };

        reference
            .cache
            .insert(sp.id.to_string(), CacheState::Computed(lines.clone()));
        Ok(lines)
    }

    fn log_summary(&self, species_id: &str, result: &SpeciesResult, differential: bool) {
        let level = self.detail_level();
        let abs = result.lines.absolute_summary();
        log::log!(
            level,
            "A({}) = {:6.3} +/- {:5.3} (# of lines = {})",
            species_id,
            abs.mean,
            abs.std,
            abs.count
        );
        if differential {
            let dif = result.lines.differential_summary();
            log::log!(
                level,
                "[{}/H] = {:6.3} +/- {:5.3} (# of lines = {})",
                species_id,
                dif.mean,
                dif.std,
                dif.count
            );
        }
    }
}

/// 星表中出现的全部物种
pub fn species_in(star: &Star) -> Vec<String> {
    species::ids_for_codes(&star.species_codes())
}

fn fmt_opt(v: Option<f64>, prec: usize) -> String {
    v.map(|x| format!("{:.*}", prec, x))
        .unwrap_or_else(|| "nan".to_string())
}
