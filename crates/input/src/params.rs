use crate::Control;
use fenestra_common::Color;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use std::ops::RangeInclusive;

/// Values bound to the debug panel widgets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuiParams {
    pub rotation: f32,
    pub width: f32,
    pub height: f32,
    pub color: Color,
}

impl Default for GuiParams {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            width: 1.0,
            height: 1.0,
            color: Color::WHITE,
        }
    }
}

impl GuiParams {
    pub const ROTATION_RANGE: RangeInclusive<f32> = 0.0..=FRAC_PI_2;
    pub const WIDTH_RANGE: RangeInclusive<f32> = 0.5..=3.0;
    pub const HEIGHT_RANGE: RangeInclusive<f32> = 0.5..=3.0;

    /// Clamp every field into its slider range.
    pub fn clamped(self) -> Self {
        let clamp = |v: f32, r: RangeInclusive<f32>| v.clamp(*r.start(), *r.end());
        Self {
            rotation: clamp(self.rotation, Self::ROTATION_RANGE),
            width: clamp(self.width, Self::WIDTH_RANGE),
            height: clamp(self.height, Self::HEIGHT_RANGE),
            color: self.color,
        }
    }

    /// Controls that turn `before` into `self`.
    pub fn controls_since(&self, before: &GuiParams) -> Vec<Control> {
        let now = self.clamped();
        let mut controls = Vec::new();
        if now.rotation != before.rotation {
            controls.push(Control::SetRotation(now.rotation));
        }
        if now.width != before.width {
            controls.push(Control::SetWidth(now.width));
        }
        if now.height != before.height {
            controls.push(Control::SetHeight(now.height));
        }
        if now.color != before.color {
            controls.push(Control::SetColor(now.color));
        }
        if !controls.is_empty() {
            tracing::trace!(count = controls.len(), "gui controls");
        }
        controls
    }

    /// Controls that bring a freshly composed scene to these values.
    pub fn controls_from_default(&self) -> Vec<Control> {
        self.controls_since(&GuiParams::default())
    }

    /// Fold a control back into the parameters, as if the widget had been moved.
    pub fn apply(&mut self, control: Control) {
        match control {
            Control::SetRotation(r) => self.rotation = r,
            Control::SetWidth(w) => self.width = w,
            Control::SetHeight(h) => self.height = h,
            Control::SetColor(c) => self.color = c,
        }
        *self = self.clamped();
    }
}
