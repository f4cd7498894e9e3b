use super::types::{ApiTransport, FetchError};
use crate::session::{
    url_coordinates, url_lightcurve, url_mean_position, url_obj_id, url_object_index,
    url_position_series, url_sky_background, url_sysrem_basis, Axis, Binning, CoordinateRecord,
    Hdu, MeanPosition, ObjectIdentity, ObjectIndex, Payload, Series, SeriesPayload, URL_BINNING,
    URL_FRMS_DATA,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|e| FetchError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// GET 并解开 `{data: ...}` 信封
pub async fn fetch_data<T: DeserializeOwned>(
    api: &dyn ApiTransport,
    path: &str,
) -> Result<T, FetchError> {
    let value = api.get_json(path).await?;
    decode::<Payload<T>>(path, value).map(Payload::into_inner)
}

pub async fn fetch_binning(api: &dyn ApiTransport) -> Result<Binning, FetchError> {
    let value = api.get_json(URL_BINNING).await?;
    decode(URL_BINNING, value)
}

pub async fn fetch_sysrem_basis(api: &dyn ApiTransport, index: u8) -> Result<Series, FetchError> {
    fetch_data(api, &url_sysrem_basis(index)).await
}

/// FRMS 汇总散点
pub async fn fetch_frms(api: &dyn ApiTransport) -> Result<Series, FetchError> {
    fetch_data(api, URL_FRMS_DATA).await
}

/// 汇总图上的数据下标 -> 目标下标
pub async fn fetch_object_index(
    api: &dyn ApiTransport,
    data_index: usize,
) -> Result<u64, FetchError> {
    let path = url_object_index(data_index);
    let value = api.get_json(&path).await?;
    decode::<ObjectIndex>(&path, value).map(|o| o.index)
}

pub async fn fetch_lightcurve(
    api: &dyn ApiTransport,
    hdu: Hdu,
    object: u64,
) -> Result<SeriesPayload, FetchError> {
    let path = url_lightcurve(hdu, object);
    let value = api.get_json(&path).await?;
    decode(&path, value)
}

pub async fn fetch_obj_id(api: &dyn ApiTransport, object: u64) -> Result<ObjectIdentity, FetchError> {
    fetch_data(api, &url_obj_id(object)).await
}

pub async fn fetch_mean_position(
    api: &dyn ApiTransport,
    axis: Axis,
    object: u64,
) -> Result<Vec<f64>, FetchError> {
    fetch_data::<MeanPosition>(api, &url_mean_position(axis, object))
        .await
        .map(MeanPosition::into_vec)
}

pub async fn fetch_position_series(
    api: &dyn ApiTransport,
    axis: Axis,
    object: u64,
) -> Result<SeriesPayload, FetchError> {
    let path = url_position_series(axis, object);
    let value = api.get_json(&path).await?;
    decode(&path, value)
}

pub async fn fetch_coordinates(
    api: &dyn ApiTransport,
    object: u64,
) -> Result<CoordinateRecord, FetchError> {
    fetch_data(api, &url_coordinates(object)).await
}

pub async fn fetch_sky_background(api: &dyn ApiTransport, object: u64) -> Result<Series, FetchError> {
    fetch_data(api, &url_sky_background(object)).await
}

/// 先取 x 再取 y，合成一组点；x 失败时不会请求 y
pub async fn fetch_positions(api: &dyn ApiTransport, object: u64) -> Result<Series, FetchError> {
    let xs = fetch_mean_position(api, Axis::X, object).await?;
    let ys = fetch_mean_position(api, Axis::Y, object).await?;
    Ok(xs.into_iter().zip(ys).collect())
}
