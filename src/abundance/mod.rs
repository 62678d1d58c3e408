//! # 丰度分析模块
//!
//! 合成引擎接口、差分匹配、计算流水线与误差传递。
//!
//! ## 依赖关系
//! - 被 `batch/` 和 `commands/` 使用
//! - 使用 `models/`, `nlte/`
//! - 子模块: synth, differential, pipeline, uncertainty

pub mod differential;
pub mod pipeline;
pub mod synth;
pub mod uncertainty;

pub use pipeline::{AnalysisContext, AnalysisOptions, CacheState, Reference};
pub use synth::{ExternalSynthesizer, Synthesizer};
