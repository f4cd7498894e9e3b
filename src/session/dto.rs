use serde::{Deserialize, Deserializer};

/// 单个数据点：(时间, 流量) 或 (x, y)
pub type Point = (f64, f64);
pub type Series = Vec<Point>;

/// 光变曲线文件中的数据通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hdu {
    Flux,
    Tamflux,
    Casudet,
}

impl Hdu {
    pub const ALL: [Hdu; 3] = [Hdu::Flux, Hdu::Tamflux, Hdu::Casudet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hdu::Flux => "flux",
            Hdu::Tamflux => "tamflux",
            Hdu::Casudet => "casudet",
        }
    }
}

/// 探测器坐标轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }
}

/// `{data: ...}` 信封；部分端点直接返回裸数据，两种都接受
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Payload<T> {
    Enveloped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    pub fn into_inner(self) -> T {
        match self {
            Payload::Enveloped { data } => data,
            Payload::Bare(data) => data,
        }
    }
}

/// `/api/lc/*`、`/api/xs|ys/*` 的返回：序列加上可选统计量
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeriesPayload {
    pub data: Series,
    #[serde(default)]
    pub extent: Option<f64>,
    #[serde(default)]
    pub frms: Option<f64>,
}

impl SeriesPayload {
    pub fn stats(&self) -> SeriesStats {
        SeriesStats {
            extent: self.extent,
            frms: self.frms,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeriesStats {
    pub extent: Option<f64>,
    pub frms: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Binning {
    #[serde(default)]
    pub binning: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ObjectIndex {
    pub index: u64,
}

/// 星表中的目标标识，服务端可能给字符串也可能给数字
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectIdentity(#[serde(deserialize_with = "text_or_number")] pub String);

impl std::fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `/api/x|y/*`：旧服务端返回中位数标量，新版返回序列
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MeanPosition {
    Scalar(f64),
    Sequence(Vec<f64>),
}

impl MeanPosition {
    pub fn into_vec(self) -> Vec<f64> {
        match self {
            MeanPosition::Scalar(v) => vec![v],
            MeanPosition::Sequence(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoordinateRecord {
    #[serde(deserialize_with = "text_or_number")]
    pub ra: String,
    #[serde(deserialize_with = "text_or_number")]
    pub dec: String,
    pub ra_hms: String,
    pub dec_dms: String,
    pub ra_full: f64,
    pub dec_full: f64,
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn payload_accepts_envelope_and_bare_sequences() {
        let enveloped: Payload<Series> =
            serde_json::from_value(json!({"data": [[0.0, 1.5], [1.0, 2.5]]})).unwrap();
        let bare: Payload<Series> = serde_json::from_value(json!([[0.0, 1.5]])).unwrap();

        assert_eq!(enveloped.into_inner(), vec![(0.0, 1.5), (1.0, 2.5)]);
        assert_eq!(bare.into_inner(), vec![(0.0, 1.5)]);
    }

    #[test]
    fn lightcurve_payload_keeps_statistics() {
        let payload: SeriesPayload = serde_json::from_value(json!({
            "data": [[0.5, 100.0]],
            "extent": 3.25,
            "frms": 12.0,
        }))
        .unwrap();

        assert_eq!(payload.data, vec![(0.5, 100.0)]);
        assert_eq!(
            payload.stats(),
            SeriesStats {
                extent: Some(3.25),
                frms: Some(12.0)
            }
        );
    }

    #[test]
    fn object_identity_from_string_or_number() {
        let text: Payload<ObjectIdentity> =
            serde_json::from_value(json!({"data": "NG0304-1115_802"})).unwrap();
        let number: Payload<ObjectIdentity> = serde_json::from_value(json!({"data": 802})).unwrap();

        assert_eq!(text.into_inner().to_string(), "NG0304-1115_802");
        assert_eq!(number.into_inner().to_string(), "802");
    }

    #[test]
    fn mean_position_scalar_becomes_single_value() {
        let scalar: Payload<MeanPosition> = serde_json::from_value(json!({"data": 1023.5})).unwrap();
        let seq: Payload<MeanPosition> =
            serde_json::from_value(json!({"data": [1.0, 2.0, 3.0]})).unwrap();

        assert_eq!(scalar.into_inner().into_vec(), vec![1023.5]);
        assert_eq!(seq.into_inner().into_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn unbinned_server_reports_null() {
        let binning: Binning = serde_json::from_value(json!({"binning": null})).unwrap();
        assert_eq!(binning.binning, None);
    }

    #[test]
    fn coordinates_accept_numeric_ra_dec() {
        let rec: Payload<CoordinateRecord> = serde_json::from_value(json!({"data": {
            "ra": 150.0, "dec": "20.00000",
            "ra_hms": "10h00m00s", "dec_dms": "20d00m00s",
            "ra_full": 150.0, "dec_full": 20.0,
        }}))
        .unwrap();
        let rec = rec.into_inner();

        assert_eq!(rec.ra, "150.0");
        assert_eq!(rec.dec, "20.00000");
    }
}
