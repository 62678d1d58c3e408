//! # 批量处理模块
//!
//! 对整个恒星样本统一执行丰度分析。
//!
//! ## 功能
//! - 按星隔离失败，每颗星一行输出
//! - 参考星缓存跨星复用
//! - 进度反馈与统计
//! - CSV 导出
//!
//! ## 依赖关系
//! - 被 `commands/abund.rs` 使用
//! - 使用 `abundance/` 进行计算
//! - 使用 `indicatif` 显示进度

pub mod export;
pub mod runner;

pub use export::ExportLayout;
pub use runner::{BatchResult, BatchRunner, StarInput, StarOutcome, StarRow};
