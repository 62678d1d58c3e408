//! # abund 子命令 CLI 定义
//!
//! 批量计算恒星丰度，可选差分、NLTE、误差与 GCE 修正
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/abund.rs`

use crate::nlte::grid::GRID_FILE;
use clap::Args;
use std::path::PathBuf;

/// abund 子命令参数
#[derive(Args, Debug)]
pub struct AbundArgs {
    /// Star data CSV (id, teff, err_teff, logg, err_logg, feh, err_feh, vt, err_vt, ...)
    pub star_data: PathBuf,

    /// Line list CSV (wavelength, species, ep, gf, <star id>...)
    pub lines: PathBuf,

    /// External abundance engine invoked once per star and species
    #[arg(long, env = "STARABUND_SYNTH")]
    pub synth: String,

    /// Extra argument passed to the abundance engine (repeatable)
    #[arg(long = "synth-arg", allow_hyphen_values = true)]
    pub synth_args: Vec<String>,

    /// Reference star id for line-by-line differential abundances
    #[arg(long)]
    pub reference: Option<String>,

    /// Comma-separated species ids (default: every species in the line list)
    #[arg(long, value_delimiter = ',')]
    pub species: Option<Vec<String>>,

    /// Propagate stellar parameter errors into the abundances
    #[arg(long, default_value_t = false)]
    pub errors: bool,

    /// Disable the O I triplet NLTE correction
    #[arg(long, default_value_t = false)]
    pub no_nlte: bool,

    /// NLTE grid CSV for the O I triplet
    #[arg(long, env = "STARABUND_GRID", default_value = GRID_FILE)]
    pub nlte_grid: PathBuf,

    /// Model atmosphere grid name passed to the abundance engine
    #[arg(long, default_value = "odfnew")]
    pub atmosphere: String,

    /// Output CSV file
    #[arg(short, long, default_value = "abundances.csv")]
    pub output: PathBuf,

    /// Write GCE-corrected [X/H] vs Tc points to this CSV (requires --reference and ages)
    #[arg(long)]
    pub gce_output: Option<PathBuf>,

    /// Log per-species details at info level instead of debug
    #[arg(long, default_value_t = false)]
    pub details: bool,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}
