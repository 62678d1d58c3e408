//! # 谱线合成接口
//!
//! 由谱线测量值与模型大气求逐线丰度的外部引擎，在此仅定义接口，
//! 并提供一个通过外部命令调用的实现。
//!
//! ## 外部命令协议
//! - 环境变量：`STAR`, `TEFF`, `LOGG`, `FEH`, `VT`, `ATMOSPHERE`, `SPECIES`
//! - 标准输入：`wavelength,species,ep,gf,ew` CSV（该物种的谱线，按星表顺序）
//! - 标准输出：`wavelength,abundance[,ep,gf,ew]` CSV；为空表示无可用谱线
//!
//! ## 依赖关系
//! - 被 `abundance/pipeline.rs`, `commands/abund.rs` 使用
//! - 使用 `models/`

use crate::error::{AbundanceError, Result};
use crate::models::{LineAbundances, LineRecord, Species, Star};

use serde::Deserialize;
use std::io::Write;
use std::process::{Command, Stdio};

/// 谱线合成引擎
pub trait Synthesizer {
    /// 计算某一物种的逐线丰度
    ///
    /// `Ok(None)` 表示该物种无可用谱线；`Err` 表示引擎本身失败。
    fn abfind(&self, star: &Star, species: &Species, atmosphere: &str)
        -> Result<Option<LineAbundances>>;
}

/// 外部命令输出行
#[derive(Debug, Deserialize)]
struct OutputRow {
    wavelength: f64,
    abundance: f64,
    ep: Option<f64>,
    gf: Option<f64>,
    ew: Option<f64>,
}

/// 通过外部命令调用的合成引擎
#[derive(Debug, Clone)]
pub struct ExternalSynthesizer {
    command: String,
    args: Vec<String>,
}

impl ExternalSynthesizer {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn input_csv(star: &Star, species: &Species) -> Result<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["wavelength", "species", "ep", "gf", "ew"])?;
        for line in star.lines_for(species.code) {
            wtr.write_record(&[
                line.wavelength.to_string(),
                line.species.to_string(),
                line.ep.to_string(),
                line.gf.to_string(),
                line.ew.to_string(),
            ])?;
        }
        wtr.into_inner()
            .map_err(|e| AbundanceError::Other(format!("Failed to buffer line list: {}", e)))
    }

    fn parse_output(stdout: &[u8]) -> Result<Option<LineAbundances>> {
        if stdout.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(None);
        }
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(stdout);
        let mut records = Vec::new();
        for row in rdr.deserialize::<OutputRow>() {
            let row = row?;
            records.push(LineRecord {
                ep: row.ep,
                gf: row.gf,
                ew: row.ew,
                ..LineRecord::new(row.wavelength, row.abundance)
            });
        }
        if records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(LineAbundances::new(records)))
        }
    }
}

impl Synthesizer for ExternalSynthesizer {
    fn abfind(
        &self,
        star: &Star,
        species: &Species,
        atmosphere: &str,
    ) -> Result<Option<LineAbundances>> {
        if star.lines_for(species.code).is_empty() {
            return Ok(None);
        }
        let input = Self::input_csv(star, species)?;
        let p = &star.params;

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .env("STAR", &star.name)
            .env("TEFF", p.teff.value.to_string())
            .env("LOGG", p.logg.value.to_string())
            .env("FEH", p.feh.value.to_string())
            .env("VT", p.vt.value.to_string())
            .env("ATMOSPHERE", atmosphere)
            .env("SPECIES", species.code.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|_| AbundanceError::CommandNotFound {
                command: self.command.clone(),
            })?;

        // 子进程可能不读取标准输入
        if let Some(ref mut stdin) = child.stdin {
            stdin.write_all(&input).ok();
        }
        drop(child.stdin.take());

        let output = child
            .wait_with_output()
            .map_err(|e| AbundanceError::CommandFailed {
                command: self.command_line(),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(AbundanceError::CommandFailed {
                command: self.command_line(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Self::parse_output(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::species;
    use crate::testing;

    #[test]
    fn test_parse_output_keeps_order_and_metadata() {
        let out = b"wavelength,abundance,ep,gf,ew\n6150.0,7.40,2.2,-1.5,40.1\n5000.0,7.50,,,\n";
        let la = ExternalSynthesizer::parse_output(out).unwrap().unwrap();
        assert_eq!(la.wavelengths(), vec![6150.0, 5000.0]);
        assert_eq!(la.records[0].ew, Some(40.1));
        assert_eq!(la.records[1].ep, None);
    }

    #[test]
    fn test_parse_empty_output_is_none() {
        assert!(ExternalSynthesizer::parse_output(b"").unwrap().is_none());
        assert!(ExternalSynthesizer::parse_output(b"wavelength,abundance\n")
            .unwrap()
            .is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_external_command_receives_parameters() {
        let synth = ExternalSynthesizer::new(
            "sh",
            vec![
                "-c".to_string(),
                "cat > /dev/null; printf 'wavelength,abundance\\n5000.0,%s\\n' \"$LOGG\"".to_string(),
            ],
        );
        let star = testing::star("sun", 5777.0, 4.44);
        let fe = species::lookup("FeI").unwrap();
        let la = synth.abfind(&star, fe, "odfnew").unwrap().unwrap();
        assert_eq!(la.records[0].abundance, 4.44);
    }

    #[cfg(unix)]
    #[test]
    fn test_external_command_failure() {
        let synth = ExternalSynthesizer::new("sh", vec!["-c".to_string(), "exit 3".to_string()]);
        let star = testing::star("sun", 5777.0, 4.44);
        let fe = species::lookup("FeI").unwrap();
        let err = synth.abfind(&star, fe, "odfnew").unwrap_err();
        assert!(matches!(err, AbundanceError::CommandFailed { .. }));
    }

    #[test]
    fn test_missing_command() {
        let synth = ExternalSynthesizer::new("definitely-not-a-synthesizer-binary", vec![]);
        let star = testing::star("sun", 5777.0, 4.44);
        let fe = species::lookup("FeI").unwrap();
        let err = synth.abfind(&star, fe, "odfnew").unwrap_err();
        assert!(matches!(err, AbundanceError::CommandNotFound { .. }));
    }

    #[test]
    fn test_no_lines_skips_command() {
        let synth = ExternalSynthesizer::new("definitely-not-a-synthesizer-binary", vec![]);
        let star = testing::star("sun", 5777.0, 4.44);
        let ba = species::lookup("BaII").unwrap();
        assert!(synth.abfind(&star, ba, "odfnew").unwrap().is_none());
    }
}
