//! # species 命令实现
//!
//! 打印支持的物种：标识、光谱记号、数值代码与凝聚温度。
//!
//! ## 依赖关系
//! - 使用 `cli/species.rs` 定义的参数
//! - 使用 `models/species.rs`, `parsers/linelist.rs`

use crate::cli::species::SpeciesArgs;
use crate::error::Result;
use crate::models::species::{self, Species};
use crate::parsers;
use crate::utils::output;

use tabled::{Table, Tabled};

#[derive(Debug, Clone, Tabled)]
struct SpeciesRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Species")]
    notation: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Tc (K)")]
    tc: String,
}

impl From<&Species> for SpeciesRow {
    fn from(sp: &Species) -> Self {
        SpeciesRow {
            id: sp.id.to_string(),
            notation: sp.notation(),
            code: format!("{:.1}", sp.code),
            tc: format!("{:.0}", sp.tc),
        }
    }
}

/// 执行 species 命令
pub fn execute(args: SpeciesArgs) -> Result<()> {
    let selected: Vec<&Species> = match &args.lines {
        Some(path) => {
            let lines = parsers::parse_linelist_file(path)?;
            species::ids_for_codes(&lines.species_codes())
                .iter()
                .filter_map(|id| species::lookup(id))
                .collect()
        }
        None => species::all().iter().collect(),
    };

    let rows: Vec<SpeciesRow> = selected.into_iter().map(SpeciesRow::from).collect();
    println!("{}", Table::new(&rows));
    output::print_info(&format!("{} species", rows.len()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_row() {
        let row = SpeciesRow::from(species::lookup("FeII").unwrap());
        assert_eq!(row.id, "FeII");
        assert_eq!(row.notation, "Fe II");
        assert_eq!(row.code, "26.1");
        assert_eq!(row.tc, "1334");
    }
}
