//! 测试辅助：线性 NLTE 网格、模拟合成引擎与示例恒星

use crate::abundance::synth::Synthesizer;
use crate::error::{AbundanceError, Result};
use crate::models::{
    LineAbundances, LineMeasurement, LineRecord, Measured, Species, Star, StellarParameters,
};
use crate::nlte::grid::GridPoint;
use crate::nlte::NlteGrid;

use std::cell::RefCell;

pub const TEFF_SENSITIVITY: f64 = 8.0e-5;
pub const LOGG_SENSITIVITY: f64 = 0.15;
pub const FEH_SENSITIVITY: f64 = 0.02;
pub const VT_SENSITIVITY: f64 = -0.09;

/// 线性修正量：三次样条逐级约化后应精确复现
pub fn linear_delta(j: usize, teff: f64, logg: f64, feh: f64, ao: f64) -> f64 {
    0.20 + 1.0e-4 * (teff - 5777.0) - 0.05 * (logg - 4.44) + 0.03 * feh + 0.02 * (ao - 7.5)
        + 0.01 * j as f64
}

pub fn linear_grid_points() -> Vec<GridPoint> {
    let mut points = Vec::new();
    for it in 0..16 {
        for ifeh in 0..10 {
            for ig in 0..4 {
                for ia in 0..7 {
                    let teff = 4500.0 + 200.0 * it as f64;
                    let feh = (ifeh as f64 - 7.0) / 5.0;
                    let logg = 3.5 + 0.5 * ig as f64;
                    let ao = 7.0 + 0.25 * ia as f64;
                    points.push(GridPoint {
                        teff,
                        logg,
                        feh,
                        ao: [ao; 3],
                        dao: [
                            linear_delta(0, teff, logg, feh, ao),
                            linear_delta(1, teff, logg, feh, ao),
                            linear_delta(2, teff, logg, feh, ao),
                        ],
                    });
                }
            }
        }
    }
    points
}

pub fn linear_grid() -> NlteGrid {
    NlteGrid::from_points(linear_grid_points()).unwrap()
}

fn line(wavelength: f64, species: f64, ew: f64) -> LineMeasurement {
    LineMeasurement {
        wavelength,
        species,
        ep: 2.5,
        gf: -1.2,
        ew,
    }
}

pub fn sample_lines() -> Vec<LineMeasurement> {
    vec![
        line(5247.05, 26.0, 66.1),
        line(6151.62, 26.0, 50.3),
        line(7771.94, 8.0, 71.0),
        line(5325.55, 26.1, 41.2),
        line(6082.71, 26.0, 34.9),
        line(7774.16, 8.0, 62.5),
        line(6432.68, 26.1, 41.9),
        line(7775.39, 8.0, 49.8),
        line(6705.10, 26.0, 46.2),
    ]
}

pub fn star(name: &str, teff: f64, logg: f64) -> Star {
    let params = StellarParameters {
        teff: Measured::new(teff, None),
        logg: Measured::new(logg, None),
        feh: Measured::new(0.0, None),
        vt: Measured::new(1.0, None),
    };
    Star::new(name, params).with_lines(sample_lines())
}

/// 比参考星多一条 FeI 谱线
pub fn star_with_missing_line(name: &str, teff: f64, logg: f64) -> Star {
    let mut s = star(name, teff, logg);
    s.lines.push(line(6999.99, 26.0, 40.0));
    s
}

#[derive(Debug, Clone, PartialEq)]
struct Call {
    star: String,
    code: f64,
    teff: f64,
    logg: f64,
    feh: f64,
    vt: f64,
}

/// 丰度对参数线性敏感的模拟合成引擎，记录每次调用
#[derive(Debug, Default)]
pub struct MockSynth {
    calls: RefCell<Vec<Call>>,
    failing: Option<String>,
}

impl MockSynth {
    pub fn failing_for(name: &str) -> Self {
        MockSynth {
            calls: RefCell::new(Vec::new()),
            failing: Some(name.to_string()),
        }
    }

    pub fn calls_for(&self, star: &str, code: f64) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.star == star && c.code == code)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().len()
    }

    /// (teff, logg, feh, vt) 按调用顺序
    pub fn params_seen(&self, star: &str, code: f64) -> Vec<(f64, f64, f64, f64)> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.star == star && c.code == code)
            .map(|c| (c.teff, c.logg, c.feh, c.vt))
            .collect()
    }
}

fn base_abundance(code: f64) -> f64 {
    match code {
        c if c == 8.0 => 7.60,
        c if c == 26.0 => 7.45,
        c if c == 26.1 => 7.47,
        _ => 5.0,
    }
}

impl Synthesizer for MockSynth {
    fn abfind(
        &self,
        star: &Star,
        species: &Species,
        _atmosphere: &str,
    ) -> Result<Option<LineAbundances>> {
        let p = &star.params;
        self.calls.borrow_mut().push(Call {
            star: star.name.clone(),
            code: species.code,
            teff: p.teff.value,
            logg: p.logg.value,
            feh: p.feh.value,
            vt: p.vt.value,
        });

        if self.failing.as_deref() == Some(star.name.as_str()) {
            return Err(AbundanceError::CommandFailed {
                command: "mock".to_string(),
                stderr: format!("synthesis failed for {}", star.name),
            });
        }

        let shift = TEFF_SENSITIVITY * (p.teff.value - 5777.0)
            + LOGG_SENSITIVITY * (p.logg.value - 4.44)
            + FEH_SENSITIVITY * p.feh.value
            + VT_SENSITIVITY * (p.vt.value - 1.0);

        let records: Vec<LineRecord> = star
            .lines_for(species.code)
            .into_iter()
            .map(|l| LineRecord {
                ep: Some(l.ep),
                gf: Some(l.gf),
                ew: Some(l.ew),
                ..LineRecord::new(
                    l.wavelength,
                    base_abundance(species.code) + 0.002 * (l.ew - 50.0) + shift,
                )
            })
            .collect();

        if records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(LineAbundances::new(records)))
        }
    }
}
