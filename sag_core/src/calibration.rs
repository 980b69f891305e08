use crate::error::{Result, SagError};

/// Length reported at the upper anchor.
pub const FULL_SCALE: f32 = 100.0;

/// Reference potentiometer readings at full extension and at 100 mm.
pub const DEFAULT_RAW_AT_ZERO: u16 = 815;
pub const DEFAULT_RAW_AT_HUNDRED: u16 = 1256;

/// Two-point linear map from filtered raw value to length.
///
/// length = (filtered - raw_at_zero) * (100 / (raw_at_hundred - raw_at_zero))
///
/// No clamping: readings outside the anchors extrapolate, including to
/// negative lengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    raw_at_zero: f32,
    raw_at_hundred: f32,
    scale: f32,
}

impl Calibration {
    /// Equal anchors have no slope and are a configuration fault.
    pub fn new(raw_at_zero: u16, raw_at_hundred: u16) -> Result<Self> {
        if raw_at_zero == raw_at_hundred {
            return Err(eyre::Report::new(SagError::Config(format!(
                "calibration anchors must differ (both {raw_at_zero})"
            ))));
        }
        let zero = f32::from(raw_at_zero);
        let hundred = f32::from(raw_at_hundred);
        Ok(Self {
            raw_at_zero: zero,
            raw_at_hundred: hundred,
            scale: FULL_SCALE / (hundred - zero),
        })
    }

    #[inline]
    pub fn to_length(&self, filtered: f32) -> f32 {
        (filtered - self.raw_at_zero) * self.scale
    }

    /// Length per raw count.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn anchors(&self) -> (f32, f32) {
        (self.raw_at_zero, self.raw_at_hundred)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        let zero = f32::from(DEFAULT_RAW_AT_ZERO);
        let hundred = f32::from(DEFAULT_RAW_AT_HUNDRED);
        Self {
            raw_at_zero: zero,
            raw_at_hundred: hundred,
            scale: FULL_SCALE / (hundred - zero),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn anchors_map_to_zero_and_hundred() {
        let c = Calibration::new(815, 1256).unwrap();
        assert!(c.to_length(815.0).abs() < EPS);
        assert!((c.to_length(1256.0) - 100.0).abs() < EPS);
    }

    #[test]
    fn default_matches_reference_anchors() {
        let c = Calibration::default();
        assert_eq!(
            c,
            Calibration::new(DEFAULT_RAW_AT_ZERO, DEFAULT_RAW_AT_HUNDRED).unwrap()
        );
    }

    #[test]
    fn midpoint_is_fifty() {
        let c = Calibration::new(1000, 2000).unwrap();
        assert!((c.to_length(1500.0) - 50.0).abs() < EPS);
    }

    #[test]
    fn out_of_range_extrapolates() {
        let c = Calibration::new(1000, 2000).unwrap();
        assert!((c.to_length(0.0) + 100.0).abs() < EPS);
        assert!((c.to_length(3000.0) - 200.0).abs() < EPS);
    }

    #[test]
    fn reversed_anchors_have_negative_slope() {
        let c = Calibration::new(2000, 1000).unwrap();
        assert!(c.scale() < 0.0);
        assert!((c.to_length(1000.0) - 100.0).abs() < EPS);
    }

    #[test]
    fn equal_anchors_are_a_config_fault() {
        let err = Calibration::new(900, 900).expect_err("equal anchors");
        match err.downcast_ref::<SagError>() {
            Some(SagError::Config(msg)) => assert!(msg.contains("must differ")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
