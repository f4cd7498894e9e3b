pub mod geometry;
pub mod style;

pub use geometry::{cell_to_data, data_bounds, hit_test, nearest_within, Bounds};
pub use style::{PlotStyle, DETECTOR_SIZE};

use crate::panels::PanelId;
use crate::session::{
    Binning, CoordinateRecord, ObjectIdentity, Series, SeriesPayload, SeriesStats,
    SIMBAD_COORD_QUERY,
};

/// Simbad 默认检索半径（角分）
pub const DEFAULT_SIMBAD_RADIUS_ARCMIN: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    pub points: Series,
    pub style: PlotStyle,
    pub stats: SeriesStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Render {
    Plot(Plot),
    Text { text: String, link: Option<String> },
}

/// "清空目标面板并画上这些内容"
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCommand {
    pub target: PanelId,
    pub render: Render,
}

/// 返回一个绑定了目标面板和样式的渲染回调，可直接作为拉取的后续
pub fn plot_renderer(target: PanelId, style: PlotStyle) -> impl Fn(Series) -> RenderCommand + Clone {
    move |points| RenderCommand {
        target,
        render: Render::Plot(Plot {
            points,
            style,
            stats: SeriesStats::default(),
        }),
    }
}

/// 带 extent/frms 的序列
pub fn series_render(target: PanelId, style: PlotStyle, payload: SeriesPayload) -> RenderCommand {
    let stats = payload.stats();
    let mut command = plot_renderer(target, style)(payload.data);
    if let Render::Plot(ref mut plot) = command.render {
        plot.stats = stats;
    }
    command
}

pub fn text_render(target: PanelId, text: impl Into<String>) -> RenderCommand {
    RenderCommand {
        target,
        render: Render::Text {
            text: text.into(),
            link: None,
        },
    }
}

pub fn link_render(target: PanelId, text: impl Into<String>, link: String) -> RenderCommand {
    RenderCommand {
        target,
        render: Render::Text {
            text: text.into(),
            link: Some(link),
        },
    }
}

pub fn binning_render(binning: &Binning) -> RenderCommand {
    let value = binning
        .binning
        .map(|b| b.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    text_render(PanelId::Binning, format!("Points per bin: {}", value))
}

/// 标题改为目标标识，并链接到详情页
pub fn heading_render(obj_id: &ObjectIdentity, view_url: String) -> RenderCommand {
    link_render(PanelId::Heading, obj_id.to_string(), view_url)
}

pub fn coordinates_render(record: &CoordinateRecord, radius_arcmin: f64) -> RenderCommand {
    link_render(
        PanelId::Coordinates,
        format!(
            "{} {}; {} {}",
            record.ra, record.dec, record.ra_hms, record.dec_dms
        ),
        simbad_url(record.ra_full, record.dec_full, radius_arcmin),
    )
}

/// Simbad 坐标检索地址（FK5 / J2000）
pub fn simbad_url(ra: f64, dec: f64, radius_arcmin: f64) -> String {
    let params = [
        ("Coord", format!("{} {}", ra, dec)),
        ("CooFrame", "FK5".to_string()),
        ("CooEpoch", "2000".to_string()),
        ("CooEqui", "2000".to_string()),
        ("CooDefinedFrames", "none".to_string()),
        ("Radius", radius_arcmin.to_string()),
        ("Radius.unit", "arcmin".to_string()),
        ("submit", "submit query".to_string()),
    ];
    match reqwest::Url::parse_with_params(SIMBAD_COORD_QUERY, &params) {
        Ok(url) => url.to_string(),
        Err(_) => SIMBAD_COORD_QUERY.to_string(),
    }
}
