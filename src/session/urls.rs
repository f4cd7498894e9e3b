use super::dto::{Axis, Hdu};
use regex::Regex;
use std::sync::OnceLock;

/// 默认服务端地址
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Simbad 坐标查询
pub const SIMBAD_COORD_QUERY: &str = "http://simbad.u-strasbg.fr/simbad/sim-coo";

pub const URL_BINNING: &str = "/api/binning";
pub const URL_FRMS_DATA: &str = "/api/data";

pub fn url_sysrem_basis(index: u8) -> String {
    format!("/api/sysrem_basis/{}", index)
}

pub fn url_object_index(data_index: usize) -> String {
    format!("/api/object_index/{}", data_index)
}

pub fn url_lightcurve(hdu: Hdu, object: u64) -> String {
    format!("/api/lc/{}/{}", hdu.as_str(), object)
}

pub fn url_obj_id(object: u64) -> String {
    format!("/api/obj_id/{}", object)
}

/// `/api/x/<id>`、`/api/y/<id>`
pub fn url_mean_position(axis: Axis, object: u64) -> String {
    format!("/api/{}/{}", axis.as_str(), object)
}

/// `/api/xs/<id>`、`/api/ys/<id>`
pub fn url_position_series(axis: Axis, object: u64) -> String {
    format!("/api/{}s/{}", axis.as_str(), object)
}

pub fn url_coordinates(object: u64) -> String {
    format!("/api/coordinates/{}", object)
}

pub fn url_sky_background(object: u64) -> String {
    format!("/api/skybkg/{}", object)
}

/// 详情页地址
pub fn url_view_page(base_url: &str, object: u64) -> String {
    format!("{}/view/{}", base_url.trim_end_matches('/'), object)
}

/// 解析详情页路径：`/view/42`、`view/42` 或纯数字 `42`
pub fn parse_view_path(raw: &str) -> Option<u64> {
    static VIEW_PATH: OnceLock<Option<Regex>> = OnceLock::new();
    let re = VIEW_PATH
        .get_or_init(|| Regex::new(r"^(?:/?view/)?([0-9]+)/?$").ok())
        .as_ref()?;
    let caps = re.captures(raw.trim())?;
    caps.get(1)?.as_str().parse().ok()
}
