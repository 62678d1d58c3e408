//! # nlte 命令实现
//!
//! 在给定恒星参数下对 O I 三重线 LTE 丰度做 NLTE 修正并打印结果表。
//!
//! ## 依赖关系
//! - 使用 `cli/nlte.rs` 定义的参数
//! - 使用 `nlte/`
//! - 使用 `utils/output.rs`

use crate::cli::nlte::{parse_triplet, NlteArgs};
use crate::error::{AbundanceError, Result};
use crate::nlte::{NlteGrid, TripletCorrector, TripletLine};
use crate::utils::output;

use tabled::{Table, Tabled};

/// 修正结果行
#[derive(Debug, Clone, Tabled)]
struct CorrectionRow {
    #[tabled(rename = "Wavelength (Å)")]
    wavelength: String,
    #[tabled(rename = "A(O) LTE")]
    lte: String,
    #[tabled(rename = "Correction")]
    correction: String,
    #[tabled(rename = "A(O) NLTE")]
    nlte: String,
}

impl From<&TripletLine> for CorrectionRow {
    fn from(line: &TripletLine) -> Self {
        let fmt = |v: Option<f64>| v.map(|x| format!("{:.3}", x)).unwrap_or_else(|| "nan".to_string());
        CorrectionRow {
            wavelength: format!("{:.2}", line.wavelength),
            lte: format!("{:.3}", line.lte),
            correction: fmt(line.correction),
            nlte: fmt(line.nlte),
        }
    }
}

/// 执行 nlte 命令
pub fn execute(args: NlteArgs) -> Result<()> {
    output::print_header("O I Triplet NLTE Correction");

    let raw = parse_triplet(&args.ao).map_err(AbundanceError::InvalidArgument)?;
    let grid = NlteGrid::load(&args.grid)?;

    output::print_field("Teff", &format!("{:.0}", args.teff));
    output::print_field("logg", &format!("{:.2}", args.logg));
    output::print_field("[Fe/H]", &format!("{:.2}", args.feh));
    println!();

    let lines = TripletCorrector::new(&grid).correct(raw, args.teff, args.logg, args.feh);
    if lines.is_empty() {
        output::print_warning("No triplet abundances given.");
        return Ok(());
    }

    let rows: Vec<CorrectionRow> = lines.iter().map(CorrectionRow::from).collect();
    println!("{}", Table::new(&rows));

    if lines.iter().any(|l| l.nlte.is_none()) {
        output::print_warning("Parameters outside the grid; some corrections are undefined.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_formatting() {
        let line = TripletLine {
            wavelength: 7771.94,
            lte: 8.8,
            correction: Some(0.1646),
            nlte: Some(8.636),
        };
        let row = CorrectionRow::from(&line);
        assert_eq!(row.wavelength, "7771.94");
        assert_eq!(row.correction, "0.165");
        assert_eq!(row.nlte, "8.636");

        let unknown = TripletLine {
            correction: None,
            nlte: None,
            ..line
        };
        assert_eq!(CorrectionRow::from(&unknown).nlte, "nan");
    }

    #[test]
    fn test_missing_grid_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = NlteArgs {
            grid: dir.path().join("none.csv"),
            teff: 5777.0,
            logg: 4.44,
            feh: 0.0,
            ao: "7.5,7.5,7.5".to_string(),
        };
        assert!(matches!(
            execute(args),
            Err(AbundanceError::FileNotFound { .. })
        ));
    }
}
