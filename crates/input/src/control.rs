use fenestra_common::Color;
use serde::{Deserialize, Serialize};

/// A user intent produced by the GUI (or a script) and applied by the composer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Control {
    /// Open both leaves by this many radians.
    SetRotation(f32),
    /// Window width in meters; the wall follows at twice the size.
    SetWidth(f32),
    /// Window height in meters; the floor drops to `-height`.
    SetHeight(f32),
    /// Recolor the window metal.
    SetColor(Color),
}

impl Control {
    /// Whether applying this control changes the window span.
    pub fn is_resize(&self) -> bool {
        matches!(self, Control::SetWidth(_) | Control::SetHeight(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_controls() {
        assert!(Control::SetWidth(1.0).is_resize());
        assert!(Control::SetHeight(1.0).is_resize());
        assert!(!Control::SetRotation(0.3).is_resize());
        assert!(!Control::SetColor(Color::WHITE).is_resize());
    }

    #[test]
    fn control_serializes() {
        let json = serde_json::to_string(&Control::SetWidth(1.5)).unwrap();
        assert_eq!(json, r#"{"SetWidth":1.5}"#);
    }
}
