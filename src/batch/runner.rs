//! # 批量执行器
//!
//! 依次分析多颗恒星，每颗星输出一行结果。
//!
//! ## 功能
//! - 以恒星为单位隔离失败：数据缺失或合成引擎失败时该行全部留空，继续下一颗
//! - 进度条显示
//! - 错误收集与汇总报告
//!
//! ## 依赖关系
//! - 被 `commands/abund.rs` 调用
//! - 使用 `abundance/pipeline.rs` 计算丰度
//! - 使用 `utils/progress.rs` 创建进度条

use crate::abundance::{AnalysisContext, Reference};
use crate::error::Result;
use crate::models::Star;
use crate::utils::progress;

use indicatif::ProgressBar;

/// 批量输入：恒星标识与组装结果
pub struct StarInput {
    pub name: String,
    pub star: Result<Star>,
}

/// 单颗星处理结果
#[derive(Debug, Clone)]
pub enum StarOutcome {
    /// 处理成功
    Success(String),
    /// 处理失败
    Failed(String, String), // (恒星, 错误信息)
}

/// 输出行：失败时 `star` 为 None
#[derive(Debug, Clone)]
pub struct StarRow {
    pub name: String,
    pub star: Option<Star>,
}

/// 批量处理结果统计
#[derive(Debug, Default)]
pub struct BatchResult {
    /// 按输入顺序的输出行
    pub rows: Vec<StarRow>,
    /// 成功数量
    pub success: usize,
    /// 失败数量
    pub failed: usize,
    /// 失败详情
    pub failures: Vec<(String, String)>,
}

impl BatchResult {
    /// 合并处理结果
    pub fn merge(&mut self, outcome: StarOutcome, row: StarRow) {
        match outcome {
            StarOutcome::Success(_) => self.success += 1,
            StarOutcome::Failed(name, err) => {
                self.failed += 1;
                self.failures.push((name, err));
            }
        }
        self.rows.push(row);
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.success + self.failed
    }
}

/// 批量执行器
pub struct BatchRunner<'c, 'a> {
    ctx: &'c AnalysisContext<'a>,
    species_ids: Vec<String>,
    show_progress: bool,
}

impl<'c, 'a> BatchRunner<'c, 'a> {
    /// 创建新的批量执行器
    pub fn new(ctx: &'c AnalysisContext<'a>, species_ids: Vec<String>) -> Self {
        Self {
            ctx,
            species_ids,
            show_progress: false,
        }
    }

    /// 设置是否显示进度条
    pub fn progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn species_ids(&self) -> &[String] {
        &self.species_ids
    }

    /// 依次处理全部恒星；参考星缓存在整个批次内复用
    pub fn run(&self, inputs: Vec<StarInput>, mut reference: Option<&mut Reference>) -> BatchResult {
        let pb = if self.show_progress {
            progress::create_progress_bar(inputs.len() as u64, "Analyzing")
        } else {
            ProgressBar::hidden()
        };

        let mut batch_result = BatchResult::default();

        for input in inputs {
            pb.set_message(input.name.clone());
            let (outcome, row) = self.process(input, reference.as_deref_mut());
            batch_result.merge(outcome, row);
            pb.inc(1);
        }

        pb.finish_and_clear();
        batch_result
    }

    fn process(&self, input: StarInput, reference: Option<&mut Reference>) -> (StarOutcome, StarRow) {
        let name = input.name;
        let failed = |name: String, reason: String| {
            (
                StarOutcome::Failed(name.clone(), reason),
                StarRow { name, star: None },
            )
        };

        let mut star = match input.star {
            Ok(star) => star,
            Err(e) => {
                log::warn!("Could not get all the necessary data for {}: {}", name, e);
                return failed(name, e.to_string());
            }
        };

        log::info!(
            "Using [Fe/H] = {:6.3} for the model atmosphere of {}",
            star.params.feh.value,
            name
        );

        match self.ctx.get_one(&mut star, &self.species_ids, reference) {
            Ok(()) => {
                for id in &self.species_ids {
                    if star.result(id).is_none() {
                        log::warn!("There are no {} abundances for {}", id, name);
                    }
                }
                (
                    StarOutcome::Success(name.clone()),
                    StarRow {
                        name,
                        star: Some(star),
                    },
                )
            }
            Err(e) => {
                log::warn!("Abundance calculation failed for {}: {}", name, e);
                failed(name, e.to_string())
            }
        }
    }
}
