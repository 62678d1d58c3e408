//! # 数据模型模块
//!
//! 定义恒星、谱线丰度结果与物种表。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `abundance/`, `batch/` 和 `commands/` 使用
//! - 子模块: star, abundance, species

pub mod abundance;
pub mod species;
pub mod star;

pub use abundance::{
    Differential, ErrorBudget, ErrorKind, LineAbundances, LineRecord, SpeciesResult, Summary,
};
pub use species::Species;
pub use star::{LineMeasurement, Measured, Parameter, Star, StellarParameters};
