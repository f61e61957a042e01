// File: crates/kpi-core/src/smoothing.rs
// Summary: Robust LOESS (iteratively reweighted local linear regression) for sparkline points.

use crate::series::Point;
use crate::settings::LoessSettings;

/// Smooth a time-ordered point sequence. Output has the same length, indices and dates;
/// points whose local fit is degenerate keep their original value.
pub fn loess(points: &[Point], params: &LoessSettings) -> Vec<Point> {
    let xs: Vec<f64> = points.iter().map(|p| p.x.timestamp_millis() as f64).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    let fitted = smooth_values(&xs, &ys, params);
    points
        .iter()
        .zip(fitted)
        .map(|(p, y)| Point { y, ..*p })
        .collect()
}

/// LOESS over parallel `xs` (ascending) / `ys` slices.
pub fn smooth_values(xs: &[f64], ys: &[f64], params: &LoessSettings) -> Vec<f64> {
    let n = xs.len().min(ys.len());
    let mut res = ys[..n].to_vec();
    if n < 3 {
        return res;
    }

    let bandwidth_in_points = (params.bandwidth * n as f64).floor();
    if !bandwidth_in_points.is_finite() || bandwidth_in_points < 2.0 {
        return res;
    }
    let width = (bandwidth_in_points as usize).min(n);

    let mut residuals = vec![0.0f64; n];
    let mut robustness = vec![1.0f64; n];

    for iter in 0..=params.robustness_iters {
        let (mut ileft, mut iright) = (0usize, width - 1);

        for i in 0..n {
            if i > 0 {
                // slide one step right when that keeps the window more centred on xs[i]
                let next = iright + 1;
                if next < n && xs[next] - xs[i] < xs[i] - xs[ileft] {
                    ileft += 1;
                    iright = next;
                }
            }

            res[i] = match local_fit(xs, ys, &robustness, i, ileft, iright, params.accuracy) {
                Some(y) => y,
                None => ys[i],
            };
            let r = (ys[i] - res[i]).abs();
            residuals[i] = if r.is_finite() { r } else { 0.0 };
        }

        if iter == params.robustness_iters {
            break;
        }

        let median = median(&residuals);
        if median.abs() < params.accuracy {
            break;
        }
        let cutoff = 6.0 * median;
        for (w, r) in robustness.iter_mut().zip(&residuals) {
            let arg = r / cutoff;
            *w = if arg >= 1.0 { 0.0 } else { (1.0 - arg * arg).powi(2) };
        }
    }
    res
}

/// Weighted least squares around `xs[i]` over `[ileft, iright]`. `None` when the window or fit degenerates.
fn local_fit(xs: &[f64], ys: &[f64], robustness: &[f64], i: usize, ileft: usize, iright: usize, accuracy: f64) -> Option<f64> {
    if iright <= ileft || !ys[i].is_finite() {
        return None;
    }
    let x = xs[i];
    let (left, right) = (xs[ileft], xs[iright]);
    if !left.is_finite() || !right.is_finite() || !x.is_finite() {
        return None;
    }
    // distance scale comes from the edge farther from x
    let edge = if x - left > right - x { left } else { right };
    let reach = (edge - x).abs();
    if reach == 0.0 {
        return None;
    }
    let denom = 1.0 / reach;

    // regress on offsets from x so epoch-millisecond squares stay out of the sums
    let (mut sw, mut sx, mut sxx, mut sy, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    // a NaN anywhere in the window poisons the sums and the point passes through
    for k in ileft..=iright {
        let yk = ys[k];
        let dx = xs[k] - x;
        let w = tricube(dx.abs() * denom) * robustness[k];
        let xw = dx * w;
        sw += w;
        sx += xw;
        sxx += dx * xw;
        sy += yk * w;
        sxy += yk * xw;
    }
    if sw <= 0.0 {
        return None;
    }

    let mean_x = sx / sw;
    let mean_y = sy / sw;
    let mean_xy = sxy / sw;
    let mean_xx = sxx / sw;
    let var_x = mean_xx - mean_x * mean_x;
    let beta = if var_x.abs().sqrt() < accuracy { 0.0 } else { (mean_xy - mean_x * mean_y) / var_x };
    let alpha = mean_y - beta * mean_x;

    // fitted value at dx = 0
    let fitted = alpha;
    fitted.is_finite().then_some(fitted)
}

#[inline]
fn tricube(x: f64) -> f64 {
    let a = x.abs();
    if a >= 1.0 { 0.0 } else { (1.0 - a * a * a).powi(3) }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted[sorted.len() / 2]
}
