use super::style::PlotStyle;
use crate::session::Point;
use ratatui::layout::Rect;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

/// 坐标轴范围：样式里固定的优先，否则按数据加 5% 边距
pub fn data_bounds(points: &[Point], style: &PlotStyle) -> Bounds {
    Bounds {
        x: style
            .x_bounds
            .unwrap_or_else(|| padded_range(points.iter().map(|p| p.0))),
        y: style
            .y_bounds
            .unwrap_or_else(|| padded_range(points.iter().map(|p| p.1))),
    }
}

fn padded_range(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() {
        return [0.0, 1.0];
    }
    if hi - lo <= f64::EPSILON {
        return [lo - 0.5, hi + 0.5];
    }
    let pad = (hi - lo) * 0.05;
    [lo - pad, hi + pad]
}

/// 离目标最近、且在容差内的点；容差按坐标轴跨度的比例给出
pub fn nearest_within(
    points: &[Point],
    bounds: &Bounds,
    target: Point,
    tolerance: [f64; 2],
) -> Option<usize> {
    let span_x = bounds.x[1] - bounds.x[0];
    let span_y = bounds.y[1] - bounds.y[0];
    if span_x <= 0.0 || span_y <= 0.0 {
        return None;
    }

    points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let dx = ((p.0 - target.0) / span_x).abs();
            let dy = ((p.1 - target.1) / span_y).abs();
            (dx <= tolerance[0] && dy <= tolerance[1]).then(|| (i, dx * dx + dy * dy))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// 终端单元格 -> 数据坐标（绘图区不含坐标轴标签）
pub fn cell_to_data(bounds: &Bounds, area: Rect, column: u16, row: u16) -> Option<Point> {
    if area.width < 2 || area.height < 2 {
        return None;
    }
    if column < area.x
        || row < area.y
        || column >= area.x + area.width
        || row >= area.y + area.height
    {
        return None;
    }
    let fx = f64::from(column - area.x) / f64::from(area.width - 1);
    let fy = f64::from(row - area.y) / f64::from(area.height - 1);
    Some((
        bounds.x[0] + fx * (bounds.x[1] - bounds.x[0]),
        bounds.y[1] - fy * (bounds.y[1] - bounds.y[0]),
    ))
}

/// 鼠标点击命中测试：一个单元格以内的最近点，点在空白处返回 None
pub fn hit_test(
    points: &[Point],
    bounds: &Bounds,
    area: Rect,
    column: u16,
    row: u16,
) -> Option<usize> {
    let target = cell_to_data(bounds, area, column, row)?;
    let tolerance = [
        1.0 / f64::from(area.width - 1),
        1.0 / f64::from(area.height - 1),
    ];
    nearest_within(points, bounds, target, tolerance)
}
