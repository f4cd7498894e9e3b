use crate::session::{Axis, Hdu};
use ratatui::style::Color;

/// 探测器边长（像素）
pub const DETECTOR_SIZE: f64 = 2048.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotStyle {
    pub color: Color,
    pub lines: bool,
    pub points: bool,
    pub x_bounds: Option<[f64; 2]>,
    pub y_bounds: Option<[f64; 2]>,
}

impl PlotStyle {
    /// 不连线的彩色散点
    pub const fn points(color: Color) -> Self {
        Self {
            color,
            lines: false,
            points: true,
            x_bounds: None,
            y_bounds: None,
        }
    }

    pub const fn with_bounds(mut self, x: [f64; 2], y: [f64; 2]) -> Self {
        self.x_bounds = Some(x);
        self.y_bounds = Some(y);
        self
    }

    pub fn lightcurve(hdu: Hdu) -> Self {
        match hdu {
            Hdu::Flux => Self::points(Color::Yellow),
            Hdu::Tamflux => Self::points(Color::LightBlue),
            Hdu::Casudet => Self::points(Color::Green),
        }
    }

    pub fn position_series(axis: Axis) -> Self {
        match axis {
            Axis::X => Self::points(Color::Magenta),
            Axis::Y => Self::points(Color::Cyan),
        }
    }

    /// 位置散点固定在探测器像素范围内
    pub const fn position() -> Self {
        Self::points(Color::White).with_bounds([0.0, DETECTOR_SIZE], [0.0, DETECTOR_SIZE])
    }

    pub const fn sysrem() -> Self {
        Self::points(Color::Red)
    }

    pub const fn frms() -> Self {
        Self::points(Color::Yellow)
    }

    pub const fn sky_background() -> Self {
        Self::points(Color::Gray)
    }
}
