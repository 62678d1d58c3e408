//! # starabund 命令行入口
//!
//! ## 子命令
//! - `abund`   - 批量计算丰度（差分、NLTE、误差、GCE）
//! - `nlte`    - 单点 O I 三重线 NLTE 修正
//! - `species` - 列出支持的物种

use anyhow::Context;
use clap::Parser;
use starabund::cli::Cli;
use starabund::{commands, utils};

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let result = commands::run(cli.command).context("starabund failed");

    if let Err(e) = result {
        utils::output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
