//! # abund 命令实现
//!
//! 批量计算恒星丰度并导出 CSV。
//!
//! ## 功能
//! - 读取恒星参数表与谱线表
//! - 可选参考星差分、O I NLTE 修正、误差预算
//! - 每颗星一行的丰度表
//! - 可选 GCE 修正后的 [X/H]-Tc 表
//!
//! ## 依赖关系
//! - 使用 `cli/abund.rs` 定义的参数
//! - 使用 `parsers/`, `abundance/`, `nlte/`, `batch/`, `gce.rs`
//! - 使用 `utils/output.rs`

use crate::abundance::{AnalysisContext, AnalysisOptions, ExternalSynthesizer, Reference};
use crate::batch::{export, BatchResult, BatchRunner, ExportLayout, StarInput};
use crate::cli::abund::AbundArgs;
use crate::error::{AbundanceError, Result};
use crate::gce;
use crate::models::species;
use crate::nlte::NlteGrid;
use crate::parsers::{self, LineList, StarDataRow};
use crate::utils::output;

use std::path::Path;
use tabled::{Table, Tabled};

/// 终端汇总表的一行
#[derive(Debug, Clone, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Star")]
    star: String,
    #[tabled(rename = "Species")]
    species: usize,
    #[tabled(rename = "Lines")]
    lines: usize,
    #[tabled(rename = "Fe I")]
    iron: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// 执行 abund 命令
pub fn execute(args: AbundArgs) -> Result<()> {
    output::print_header("Computing Stellar Abundances");

    for path in [&args.star_data, &args.lines] {
        if !path.exists() {
            return Err(AbundanceError::FileNotFound {
                path: path.display().to_string(),
            });
        }
    }

    let rows = parsers::parse_star_data_file(&args.star_data)?;
    let lines = parsers::parse_linelist_file(&args.lines)?;
    output::print_info(&format!(
        "Loaded {} stars and {} lines ({} line list columns)",
        rows.len(),
        lines.rows.len(),
        lines.stars.len()
    ));

    let species_ids = select_species(args.species.as_deref(), &lines)?;
    output::print_info(&format!("Species: {}", species_ids.join(", ")));

    let grid = load_grid(&args.nlte_grid, !args.no_nlte);

    let mut reference = match &args.reference {
        Some(id) => {
            let star = parsers::find_star(&rows, &lines, id)?;
            output::print_info(&format!("Differential analysis relative to {}", id));
            Some(Reference::new(star))
        }
        None => None,
    };

    let options = AnalysisOptions {
        nlte: grid.is_some(),
        errors: args.errors,
        silent: !args.details,
        atmosphere: args.atmosphere.clone(),
    };
    let synth = ExternalSynthesizer::new(args.synth.clone(), args.synth_args.clone());
    let ctx = AnalysisContext::new(&synth, grid.as_ref(), options);

    let inputs = build_inputs(&rows, &lines);
    let runner = BatchRunner::new(&ctx, species_ids.clone()).progress(!args.no_progress);
    let result = runner.run(inputs, reference.as_mut());

    let layout = ExportLayout {
        species_ids: species_ids.clone(),
        differential: reference.is_some(),
        errors: args.errors,
    };
    export::to_csv(&result, &layout, &args.output)?;

    print_summary(&result, reference.is_some());
    print_stats(&result);
    output::print_done(&format!("Abundances written to '{}'", args.output.display()));

    if let Some(path) = &args.gce_output {
        let Some(reference) = &reference else {
            return Err(AbundanceError::InvalidArgument(
                "--gce-output requires --reference".to_string(),
            ));
        };
        write_gce(&result, reference, &species_ids, path)?;
    }

    Ok(())
}

/// 用户指定的物种需全部可识别；未指定时取谱线表中的全部物种
fn select_species(requested: Option<&[String]>, lines: &LineList) -> Result<Vec<String>> {
    let ids = match requested {
        Some(ids) => {
            for id in ids {
                if species::lookup(id).is_none() {
                    return Err(AbundanceError::UnknownSpecies(id.clone()));
                }
            }
            ids.to_vec()
        }
        None => species::ids_for_codes(&lines.species_codes()),
    };

    if ids.is_empty() {
        return Err(AbundanceError::InvalidArgument(
            "no species to compute".to_string(),
        ));
    }
    Ok(ids)
}

/// 加载 NLTE 网格；失败时警告并以 LTE 继续
fn load_grid(path: &Path, wanted: bool) -> Option<NlteGrid> {
    if !wanted {
        return None;
    }
    match NlteGrid::load(path) {
        Ok(grid) => Some(grid),
        Err(e) => {
            output::print_warning(&format!("NLTE correction disabled: {}", e));
            None
        }
    }
}

fn build_inputs(rows: &[StarDataRow], lines: &LineList) -> Vec<StarInput> {
    rows.iter()
        .map(|row| StarInput {
            name: row.id.clone(),
            star: parsers::build_star(row, lines),
        })
        .collect()
}

fn print_summary(result: &BatchResult, differential: bool) {
    let table_rows: Vec<SummaryRow> = result
        .rows
        .iter()
        .map(|row| match &row.star {
            Some(star) => {
                let iron = star
                    .result("FeI")
                    .map(|r| {
                        let s = if differential {
                            r.lines.differential_summary()
                        } else {
                            r.lines.absolute_summary()
                        };
                        format!("{:.3}", s.mean)
                    })
                    .unwrap_or_else(|| "-".to_string());
                SummaryRow {
                    star: row.name.clone(),
                    species: star.abundances.len(),
                    lines: star.abundances.values().map(|r| r.lines.len()).sum(),
                    iron,
                    status: "ok".to_string(),
                }
            }
            None => SummaryRow {
                star: row.name.clone(),
                species: 0,
                lines: 0,
                iron: "-".to_string(),
                status: "failed".to_string(),
            },
        })
        .collect();

    println!("{}", Table::new(&table_rows));
}

fn print_stats(result: &BatchResult) {
    output::print_separator();
    output::print_success(&format!(
        "{} of {} stars analyzed",
        result.success,
        result.total()
    ));
    if result.failed > 0 {
        output::print_warning(&format!("{} stars failed:", result.failed));
        for (name, reason) in &result.failures {
            output::print_field(name, reason);
        }
    }
}

fn write_gce(
    result: &BatchResult,
    reference: &Reference,
    species_ids: &[String],
    path: &Path,
) -> Result<()> {
    let ref_age = reference
        .star
        .age
        .ok_or_else(|| AbundanceError::MissingStarData {
            star: reference.name().to_string(),
            field: "age".to_string(),
        })?;

    let mut entries = Vec::new();
    for row in &result.rows {
        let Some(star) = &row.star else { continue };
        let Some(age) = star.age else {
            log::warn!("No age for {}; skipping GCE correction", star.name);
            continue;
        };
        match gce::correct(star, species_ids, age, ref_age) {
            Ok(points) => entries.push((star.name.clone(), points)),
            Err(e) => log::warn!("GCE correction failed for {}: {}", star.name, e),
        }
    }

    gce::to_csv(&entries, path)?;
    output::print_done(&format!(
        "GCE-corrected abundances for {} stars written to '{}'",
        entries.len(),
        path.display()
    ));
    Ok(())
}
