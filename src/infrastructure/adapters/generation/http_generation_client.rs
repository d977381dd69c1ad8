//! HTTP Generation Client - 调用外部生成 webhook
//!
//! 实现 GenerationPort trait。
//!
//! 外部 webhook API:
//! POST {url}
//! Request: {"operation": "generate" | "refine" | "continue", ...}  (JSON, camelCase)
//! Response: {"operation": "...", "text": "..."} | {"text": "..."} | {"output": "..."} | text/plain

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

use crate::application::ports::{
    GenerationError, GenerationPort, GenerationRequest, GenerationResponse,
};

/// 默认超时：15 分钟
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 900;

/// HTTP 生成客户端配置
#[derive(Debug, Clone)]
pub struct HttpGenerationClientConfig {
    /// webhook 完整 URL
    pub webhook_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpGenerationClientConfig {
    fn default() -> Self {
        Self {
            webhook_url: "http://localhost:5678/webhook/novel-crafter".to_string(),
            timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
        }
    }
}

impl HttpGenerationClientConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 生成客户端
pub struct HttpGenerationClient {
    client: Client,
    config: HttpGenerationClientConfig,
}

impl HttpGenerationClient {
    /// 创建新的 HTTP 生成客户端
    pub fn new(config: HttpGenerationClientConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpGenerationClientConfig {
        &self.config
    }

    fn map_send_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(self.config.timeout_secs)
        } else if e.is_connect() {
            GenerationError::NetworkError(format!("Cannot connect to generation service: {}", e))
        } else {
            GenerationError::NetworkError(e.to_string())
        }
    }
}

#[async_trait]
impl GenerationPort for HttpGenerationClient {
    async fn submit(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let operation = request.operation();

        tracing::debug!(
            url = %self.config.webhook_url,
            operation = operation.as_str(),
            user_id = %request.user_id(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(self.config.timeout_secs)
            } else {
                GenerationError::InvalidResponse(format!("Failed to read body: {}", e))
            }
        })?;

        GenerationResponse::parse(operation, content_type.as_deref(), &body)
    }

    async fn health_check(&self) -> bool {
        // webhook 只接受 POST，能建立连接即视为可用
        match self
            .client
            .head(&self.config.webhook_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => !response.status().is_server_error(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::GenerationOperation;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn test_config_default() {
        let config = HttpGenerationClientConfig::default();
        assert_eq!(config.timeout_secs, 900);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpGenerationClientConfig::new("http://n8n:5678/webhook/x").with_timeout(30);
        assert_eq!(config.webhook_url, "http://n8n:5678/webhook/x");
        assert_eq!(config.timeout_secs, 30);
    }

    /// 本地启动一个模拟 webhook
    async fn spawn_webhook(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/webhook", addr)
    }

    fn continue_request() -> GenerationRequest {
        GenerationRequest::Continue {
            story_id: uuid::Uuid::new_v4(),
            content: "It began.".to_string(),
            prompt: "go on".to_string(),
            words: 100,
            user_id: "alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_parses_tagged_reply() {
        let router = Router::new().route(
            "/webhook",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "operation": body["operation"], "text": "And it ended." }))
            }),
        );
        let url = spawn_webhook(router).await;
        let client = HttpGenerationClient::new(HttpGenerationClientConfig::new(url)).unwrap();

        let response = client.submit(continue_request()).await.unwrap();
        assert_eq!(response.operation, GenerationOperation::Continue);
        assert_eq!(response.text, "And it ended.");
    }

    #[tokio::test]
    async fn test_submit_rejects_mismatched_operation() {
        let router = Router::new().route(
            "/webhook",
            post(|| async { Json(json!({ "operation": "refine", "text": "x" })) }),
        );
        let url = spawn_webhook(router).await;
        let client = HttpGenerationClient::new(HttpGenerationClientConfig::new(url)).unwrap();

        let result = client.submit(continue_request()).await;
        assert!(matches!(result, Err(GenerationError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_submit_maps_server_error() {
        let router = Router::new().route(
            "/webhook",
            post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "workflow crashed") }),
        );
        let url = spawn_webhook(router).await;
        let client = HttpGenerationClient::new(HttpGenerationClientConfig::new(url)).unwrap();

        let result = client.submit(continue_request()).await;
        assert!(matches!(result, Err(GenerationError::ServiceError(_))));
    }

    #[tokio::test]
    async fn test_submit_times_out() {
        let router = Router::new().route(
            "/webhook",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let url = spawn_webhook(router).await;
        let client =
            HttpGenerationClient::new(HttpGenerationClientConfig::new(url).with_timeout(1))
                .unwrap();

        let result = client.submit(continue_request()).await;
        assert!(matches!(result, Err(GenerationError::Timeout(1))));
    }
}
