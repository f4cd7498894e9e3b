use async_trait::async_trait;
use serde_json::Value;
use std::str::FromStr;

/// 唯一的错误种类："拉取失败"，细分只用于日志
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("transport error on {path}: {message}")]
    Transport { path: String, message: String },
    #[error("unexpected status {status} from {path}")]
    Status { path: String, status: u16 },
    #[error("cannot decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("no response for {path}")]
    Missing { path: String },
}

impl FetchError {
    pub fn transport(path: &str, err: reqwest::Error) -> Self {
        FetchError::Transport {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            FetchError::Transport { path, .. }
            | FetchError::Status { path, .. }
            | FetchError::Decode { path, .. }
            | FetchError::Missing { path } => path,
        }
    }
}

#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// GET 一个 API 路径，返回原始 JSON
    async fn get_json(&self, path: &str) -> Result<Value, FetchError>;
}

/// 拉取失败时的处理方式，默认静默丢弃
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    #[default]
    Silent,
    Log,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "silent" | "drop" | "off" | "0" | "false" => Ok(FailurePolicy::Silent),
            "log" | "on" | "1" | "true" => Ok(FailurePolicy::Log),
            other => Err(other.to_string()),
        }
    }
}
