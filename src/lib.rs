//! # starabund - 恒星差分丰度分析工具
//!
//! 由等值宽度测量计算恒星元素丰度，支持：
//! - 相对参考星的逐线差分丰度
//! - O I 777 nm 三重线 NLTE 修正
//! - 恒星参数误差传递
//! - 按年龄的 GCE 修正
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── batch/     (批量执行与导出)
//!   │     ├── abundance/ (丰度流水线、误差传递)
//!   │     ├── nlte/      (NLTE 网格与插值)
//!   │     ├── parsers/   (输入表解析)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

pub mod abundance;
pub mod batch;
pub mod cli;
pub mod commands;
pub mod error;
pub mod gce;
pub mod models;
pub mod nlte;
pub mod parsers;
pub mod utils;

#[cfg(test)]
mod testing;
