//! # species 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/species.rs`

use clap::Args;
use std::path::PathBuf;

/// species 子命令参数
#[derive(Args, Debug)]
pub struct SpeciesArgs {
    /// Only list species present in this line list CSV
    #[arg(long)]
    pub lines: Option<PathBuf>,
}
