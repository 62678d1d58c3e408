//! # nlte 子命令 CLI 定义
//!
//! 单点 O I 三重线 NLTE 修正
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/nlte.rs`

use crate::nlte::grid::GRID_FILE;
use clap::Args;
use std::path::PathBuf;

/// nlte 子命令参数
#[derive(Args, Debug)]
pub struct NlteArgs {
    /// NLTE grid CSV for the O I triplet
    #[arg(long, env = "STARABUND_GRID", default_value = GRID_FILE)]
    pub grid: PathBuf,

    /// Effective temperature (K)
    #[arg(long)]
    pub teff: f64,

    /// Surface gravity (log g)
    #[arg(long)]
    pub logg: f64,

    /// Metallicity [Fe/H]
    #[arg(long, allow_hyphen_values = true)]
    pub feh: f64,

    /// LTE abundances of 7771.94, 7774.16, 7775.39 (use '-' for a missing line)
    #[arg(long, default_value = "7.5,7.5,7.5")]
    pub ao: String,
}

/// 解析三重线 LTE 丰度列表
pub fn parse_triplet(text: &str) -> Result<[Option<f64>; 3], String> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected 3 comma-separated values, got {}", parts.len()));
    }

    let mut raw = [None; 3];
    for (slot, part) in raw.iter_mut().zip(&parts) {
        if *part == "-" || part.is_empty() {
            continue;
        }
        let value = part
            .parse::<f64>()
            .map_err(|_| format!("invalid abundance '{}'", part))?;
        *slot = Some(value);
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_triplet() {
        assert_eq!(
            parse_triplet("7.5,7.5,7.5").unwrap(),
            [Some(7.5), Some(7.5), Some(7.5)]
        );
        assert_eq!(
            parse_triplet("8.71, -, 8.69").unwrap(),
            [Some(8.71), None, Some(8.69)]
        );
    }

    #[test]
    fn test_parse_triplet_rejects_bad_input() {
        assert!(parse_triplet("7.5,7.5").is_err());
        assert!(parse_triplet("7.5,x,7.5").is_err());
    }
}
