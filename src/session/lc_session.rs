use crate::fetch::{ApiTransport, FetchError};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde_json::Value;

/// 光变曲线 API 会话
///
/// 只发 GET，不重试、不设超时：请求挂起时对应面板保持空白。
pub struct LcSession {
    client: Client,
    base_url: String,
}

impl LcSession {
    /// 创建会话
    ///
    /// # 参数
    ///
    /// * `base_url` - 服务端根地址（如 `http://localhost:5000`）
    /// * `proxy` - 可选代理，`host:port` 视为 socks5h
    pub fn new(base_url: &str, proxy: Option<&str>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent("lcview/0.1");

        if let Some(url) = proxy.and_then(proxy_url) {
            builder = builder.proxy(reqwest::Proxy::all(&url)?);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn proxy_url(raw: &str) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() {
        None
    } else if t.contains("://") {
        Some(t.to_string())
    } else {
        Some(format!("socks5h://{}", t))
    }
}

#[async_trait]
impl ApiTransport for LcSession {
    async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        let url = self.url(path);
        debug!("{} GET {}", self, url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::transport(path, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let value = resp.json::<Value>().await.map_err(|e| FetchError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        info!("{} get_json(...) [{}]", self, url);
        Ok(value)
    }
}

impl std::fmt::Display for LcSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<LcSession [{}]>", self.base_url)
    }
}

impl std::fmt::Debug for LcSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<LcSession [{}]>", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_proxy_host_defaults_to_socks() {
        assert_eq!(proxy_url("127.0.0.1:1080").as_deref(), Some("socks5h://127.0.0.1:1080"));
        assert_eq!(proxy_url("http://proxy:3128").as_deref(), Some("http://proxy:3128"));
        assert_eq!(proxy_url("  "), None);
    }

    #[test]
    fn session_joins_base_and_path() {
        let session = LcSession::new("http://localhost:5000/", None).unwrap();
        assert_eq!(session.base_url(), "http://localhost:5000");
        assert_eq!(session.url("/api/data"), "http://localhost:5000/api/data");
    }
}
