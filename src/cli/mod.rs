//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `abund`: 批量丰度计算
//! - `nlte`: 单点 O I 三重线 NLTE 修正
//! - `species`: 物种表
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: abund, nlte, species

pub mod abund;
pub mod nlte;
pub mod species;

use clap::{ArgAction, Parser, Subcommand};

/// starabund - 恒星差分丰度分析工具
#[derive(Parser)]
#[command(name = "starabund")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Differential stellar abundances with NLTE oxygen correction", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Compute abundances for every star in a star data table
    Abund(abund::AbundArgs),

    /// Apply the O I triplet NLTE correction at one set of parameters
    Nlte(nlte::NlteArgs),

    /// List supported species with codes and condensation temperatures
    Species(species::SpeciesArgs),
}
