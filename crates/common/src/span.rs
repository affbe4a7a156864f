use serde::{Deserialize, Serialize};

/// The `(width, height)` extent of an assembly's usable opening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub width: f32,
    pub height: f32,
}

impl Span {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Half the width, full height. Used to split an opening into two leaves.
    pub fn halved(&self) -> Self {
        Self {
            width: self.width / 2.0,
            height: self.height,
        }
    }

    /// Require both dimensions to be finite and strictly greater than `2 * thickness`.
    pub fn check(&self, thickness: f32) -> Result<(), ResizeError> {
        if !self.width.is_finite() || !self.height.is_finite() {
            return Err(ResizeError::NonFinite {
                width: self.width,
                height: self.height,
            });
        }
        let min = 2.0 * thickness;
        if self.width <= min || self.height <= min {
            return Err(ResizeError::DegenerateSpan {
                width: self.width,
                height: self.height,
                thickness,
            });
        }
        Ok(())
    }
}

/// Errors from resizing an assembly.
///
/// Returned before any panel is touched, so a failed resize leaves the
/// assembly exactly as it was.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResizeError {
    #[error("span {width}x{height} is not larger than twice the frame thickness {thickness}")]
    DegenerateSpan {
        width: f32,
        height: f32,
        thickness: f32,
    },
    #[error("hole {hole_width}x{hole_height} does not fit inside wall {width}x{height}")]
    HoleExceedsWall {
        width: f32,
        height: f32,
        hole_width: f32,
        hole_height: f32,
    },
    #[error("span {width}x{height} is not finite")]
    NonFinite { width: f32, height: f32 },
}

/// The opening left inside `outer` after a frame of `thickness` on every side.
pub fn inner_span(outer: Span, thickness: f32) -> Result<Span, ResizeError> {
    outer.check(thickness)?;
    Ok(Span {
        width: outer.width - 2.0 * thickness,
        height: outer.height - 2.0 * thickness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_span_subtracts_both_sides() {
        let inner = inner_span(Span::new(2.0, 1.5), 0.05).unwrap();
        assert!((inner.width - 1.9).abs() < 1e-6);
        assert!((inner.height - 1.4).abs() < 1e-6);
    }

    #[test]
    fn inner_span_rejects_thin_outer() {
        let err = inner_span(Span::new(0.1, 1.0), 0.05).unwrap_err();
        assert!(matches!(err, ResizeError::DegenerateSpan { .. }));
        assert!(inner_span(Span::new(1.0, -3.0), 0.05).is_err());
    }

    #[test]
    fn inner_span_rejects_nan() {
        let err = inner_span(Span::new(f32::NAN, 1.0), 0.05).unwrap_err();
        assert!(matches!(err, ResizeError::NonFinite { .. }));
    }

    #[test]
    fn halved_keeps_height() {
        let half = Span::new(1.9, 1.4).halved();
        assert!((half.width - 0.95).abs() < 1e-6);
        assert_eq!(half.height, 1.4);
    }
}
