//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `batch/`, `nlte/`, `utils/`
//! - 子模块: abund, nlte, species

pub mod abund;
pub mod nlte;
pub mod species;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Abund(args) => abund::execute(args),
        Commands::Nlte(args) => nlte::execute(args),
        Commands::Species(args) => species::execute(args),
    }
}
