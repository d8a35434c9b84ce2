//! Peak detection and elution volume integration.

/// A local maximum of the signal with its two valleys
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// index of the apex
    pub index: usize,
    /// index of the lowest point reached walking left from the apex
    pub left: usize,
    /// index of the lowest point reached walking right from the apex
    pub right: usize,
    /// apex value minus the higher of the two valleys
    pub height: f64,
}

/// Find the strict local maxima above `height`, first and last sample excluded.
/// From each apex the signal is followed downhill on both sides until it rises
/// again (or a NAN is met); the lowest points reached are the valleys.
pub fn find_peaks(values: &[f64], height: f64) -> Vec<Peak> {
    let n = values.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }
    for i in 1..n - 1 {
        let v = values[i];
        if !(v > values[i - 1] && v > values[i + 1] && v > height) {
            continue;
        }
        let (left, min_left) = walk_down(values, i, (0..i).rev());
        let (right, min_right) = walk_down(values, i, i + 1..n);
        peaks.push(Peak {
            index: i,
            left,
            right,
            height: v - min_left.max(min_right),
        });
    }
    peaks
}

fn walk_down<I: Iterator<Item = usize>>(values: &[f64], apex: usize, side: I) -> (usize, f64) {
    let mut min_idx = apex;
    let mut min = values[apex];
    for j in side {
        // NAN fails the comparison and stops the walk
        if !(values[j] <= min) {
            break;
        }
        if values[j] < min {
            min = values[j];
            min_idx = j;
        }
    }
    (min_idx, min)
}

/// Riemann sum of the positive signal between the valleys of each peak,
/// sum of max(v[i], 0) * (t[i] - t[i-1]) for i in left..right.
/// i = 0 and terms with NAN are skipped.
pub fn elution_volume(time: &[f64], values: &[f64], peaks: &[Peak]) -> f64 {
    let mut volume = 0.;
    for p in peaks.iter() {
        let mut peak_area = 0.;
        for i in p.left.max(1)..p.right.min(values.len()) {
            let dt = time[i] - time[i - 1];
            let v = values[i];
            if dt.is_nan() || v.is_nan() {
                continue;
            }
            peak_area += v.max(0.) * dt;
        }
        volume += peak_area;
    }
    volume
}
