//! # 一维三次样条插值
//!
//! not-a-knot 边界条件的插值三次样条，用于 NLTE 网格逐级约化。
//!
//! ## 约定
//! - 至少需要 `MIN_POINTS` 个节点，横坐标须严格互异
//! - 查询点落在节点范围之外时返回 `None`（不外推）
//! - 任一节点值未知（非有限）时结果未知，绝不以 0 代替
//!
//! ## 依赖关系
//! - 被 `nlte/triplet.rs` 调用
//! - 使用 `nalgebra` 求解二阶导数方程组

use nalgebra::{DMatrix, DVector};

/// 三次插值所需的最少节点数
pub const MIN_POINTS: usize = 4;

/// 在 `x` 处求三次样条插值
///
/// 节点可以无序输入，内部按横坐标排序。
pub fn cubic_at(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    let n = xs.len();
    if n != ys.len() || n < MIN_POINTS || !x.is_finite() {
        return None;
    }
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return None;
    }

    let mut pts: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
    pts.sort_by(|a, b| a.0.total_cmp(&b.0));

    if pts.windows(2).any(|w| w[1].0 <= w[0].0) {
        return None;
    }
    if x < pts[0].0 || x > pts[n - 1].0 {
        return None;
    }

    let m = second_derivatives(&pts)?;

    // 所在区间，右端点归入最后一段
    let i = pts
        .windows(2)
        .position(|w| x <= w[1].0)
        .unwrap_or(n - 2);

    let (x0, y0) = pts[i];
    let (x1, y1) = pts[i + 1];
    let h = x1 - x0;
    let a = x1 - x;
    let b = x - x0;

    let value = m[i] * a.powi(3) / (6.0 * h)
        + m[i + 1] * b.powi(3) / (6.0 * h)
        + (y0 / h - m[i] * h / 6.0) * a
        + (y1 / h - m[i + 1] * h / 6.0) * b;

    value.is_finite().then_some(value)
}

/// 求解各节点处二阶导数（not-a-knot：x1 与 x_{n-2} 处三阶导数连续）
fn second_derivatives(pts: &[(f64, f64)]) -> Option<DVector<f64>> {
    let n = pts.len();
    let h: Vec<f64> = pts.windows(2).map(|w| w[1].0 - w[0].0).collect();

    let mut a = DMatrix::<f64>::zeros(n, n);
    let mut rhs = DVector::<f64>::zeros(n);

    a[(0, 0)] = h[1];
    a[(0, 1)] = -(h[0] + h[1]);
    a[(0, 2)] = h[0];

    for i in 1..n - 1 {
        a[(i, i - 1)] = h[i - 1];
        a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
        a[(i, i + 1)] = h[i];
        rhs[i] = 6.0
            * ((pts[i + 1].1 - pts[i].1) / h[i] - (pts[i].1 - pts[i - 1].1) / h[i - 1]);
    }

    a[(n - 1, n - 3)] = h[n - 2];
    a[(n - 1, n - 2)] = -(h[n - 3] + h[n - 2]);
    a[(n - 1, n - 1)] = h[n - 3];

    let m = a.lu().solve(&rhs)?;
    m.iter().all(|v| v.is_finite()).then_some(m)
}
