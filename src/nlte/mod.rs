//! # NLTE 修正模块
//!
//! O I 777 nm 三重线的 NLTE 修正：网格存储、一维三次样条与逐级约化。
//!
//! ## 依赖关系
//! - 被 `abundance/pipeline.rs`, `commands/nlte.rs` 使用
//! - 子模块: grid, spline, triplet

pub mod grid;
pub mod spline;
pub mod triplet;

pub use grid::NlteGrid;
pub use triplet::{TripletCorrector, TripletLine};
