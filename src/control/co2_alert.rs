//! CO2 alert level comparison.

/// `true` when `co2_ppm` is strictly above `threshold_ppm`.  NaN never alerts.
pub fn is_alert(co2_ppm: f32, threshold_ppm: f32) -> bool {
    !co2_ppm.is_nan() && co2_ppm > threshold_ppm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_above_threshold() {
        assert!(is_alert(1001.0, 1000.0));
        assert!(!is_alert(1000.0, 1000.0));
        assert!(!is_alert(400.0, 1000.0));
    }

    #[test]
    fn nan_never_alerts() {
        assert!(!is_alert(f32::NAN, 1000.0));
        assert!(!is_alert(f32::NAN, f32::NEG_INFINITY));
    }
}
