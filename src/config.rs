use crate::fetch::FailurePolicy;
use crate::render::DEFAULT_SIMBAD_RADIUS_ARCMIN;
use crate::session::{parse_view_path, DEFAULT_API_BASE_URL};
use std::path::PathBuf;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// 运行配置：环境变量（可由 .env 提供）+ 命令行页面参数
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub fetch_failures: FailurePolicy,
    pub start_index: Option<u64>,
    pub simbad_radius_arcmin: f64,
    pub proxy: Option<String>,
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            fetch_failures: FailurePolicy::Silent,
            start_index: None,
            simbad_radius_arcmin: DEFAULT_SIMBAD_RADIUS_ARCMIN,
            proxy: None,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = AppConfig::default();

        if let Some(url) = get("LCV_API_BASE_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = get("LCV_FETCH_FAILURES") {
            config.fetch_failures = raw.parse().map_err(|_| ConfigError::Invalid {
                key: "LCV_FETCH_FAILURES",
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = get("LCV_START_INDEX") {
            config.start_index = Some(parse_view_path(&raw).ok_or(ConfigError::Invalid {
                key: "LCV_START_INDEX",
                value: raw.clone(),
            })?);
        }
        if let Some(raw) = get("LCV_SIMBAD_RADIUS_ARCMIN") {
            config.simbad_radius_arcmin = raw
                .parse::<f64>()
                .ok()
                .filter(|r| r.is_finite() && *r > 0.0)
                .ok_or(ConfigError::Invalid {
                    key: "LCV_SIMBAD_RADIUS_ARCMIN",
                    value: raw.clone(),
                })?;
        }
        config.proxy = get("LCV_PROXY");
        if let Some(dir) = get("LCV_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// 命令行给出的页面（`/view/<id>` 或 `<id>`）优先于环境变量
    pub fn with_start_page(mut self, arg: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(raw) = arg {
            self.start_index = Some(parse_view_path(raw).ok_or(ConfigError::Invalid {
                key: "PAGE",
                value: raw.to_string(),
            })?);
        }
        Ok(self)
    }
}
