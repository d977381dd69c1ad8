//! Generation Port - 外部生成服务抽象
//!
//! 生成、润色、续写都委托给外部 webhook（工作流 + LLM）。
//! 请求与响应均为带标签的枚举，格式不符的响应在解析阶段即被拒绝。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 生成服务错误
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Generation timed out after {0}s")]
    Timeout(u64),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 生成操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationOperation {
    Generate,
    Refine,
    Continue,
}

impl GenerationOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationOperation::Generate => "generate",
            GenerationOperation::Refine => "refine",
            GenerationOperation::Continue => "continue",
        }
    }
}

/// 生成请求（webhook 请求体）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum GenerationRequest {
    /// 从零生成故事
    Generate {
        title: String,
        genre: String,
        tone: String,
        prompt: String,
        chapters: u32,
        words: u32,
        user_id: String,
    },
    /// 按指令润色全文
    Refine {
        story_id: Uuid,
        content: String,
        instructions: String,
        user_id: String,
    },
    /// 在正文之后续写
    Continue {
        story_id: Uuid,
        content: String,
        prompt: String,
        words: u32,
        user_id: String,
    },
}

impl GenerationRequest {
    pub fn operation(&self) -> GenerationOperation {
        match self {
            GenerationRequest::Generate { .. } => GenerationOperation::Generate,
            GenerationRequest::Refine { .. } => GenerationOperation::Refine,
            GenerationRequest::Continue { .. } => GenerationOperation::Continue,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            GenerationRequest::Generate { user_id, .. }
            | GenerationRequest::Refine { user_id, .. }
            | GenerationRequest::Continue { user_id, .. } => user_id,
        }
    }
}

/// 生成响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResponse {
    pub operation: GenerationOperation,
    pub text: String,
}

/// webhook 可能返回的 JSON 形态
///
/// operation 标签按字符串读取，未知的操作名同样视为不匹配
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WebhookReply {
    Text {
        operation: Option<String>,
        text: String,
    },
    Output {
        operation: Option<String>,
        output: String,
    },
    Items(Vec<WebhookReply>),
}

impl WebhookReply {
    fn into_parts(self) -> Option<(Option<String>, String)> {
        match self {
            WebhookReply::Text { operation, text } => Some((operation, text)),
            WebhookReply::Output { operation, output } => Some((operation, output)),
            WebhookReply::Items(items) => items.into_iter().next()?.into_parts(),
        }
    }
}

impl GenerationResponse {
    /// 解析 webhook 响应体
    ///
    /// - JSON: 必须匹配已知形态；带 operation 标签时必须与请求一致
    /// - 其他 content-type: 整个响应体视为生成文本
    pub fn parse(
        expected: GenerationOperation,
        content_type: Option<&str>,
        body: &str,
    ) -> Result<Self, GenerationError> {
        let is_json = content_type
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);

        let text = if is_json {
            let reply: WebhookReply = serde_json::from_str(body).map_err(|e| {
                GenerationError::InvalidResponse(format!("Unexpected JSON shape: {}", e))
            })?;
            let (operation, text) = reply
                .into_parts()
                .ok_or_else(|| GenerationError::InvalidResponse("Empty item list".to_string()))?;
            if let Some(operation) = operation {
                if operation != expected.as_str() {
                    return Err(GenerationError::InvalidResponse(format!(
                        "Expected {} response, got {}",
                        expected.as_str(),
                        operation
                    )));
                }
            }
            text
        } else {
            body.to_string()
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::InvalidResponse(
                "Generated text is empty".to_string(),
            ));
        }

        Ok(Self {
            operation: expected,
            text: text.to_string(),
        })
    }
}

/// Generation Port
#[async_trait]
pub trait GenerationPort: Send + Sync {
    /// 提交生成请求并等待结果（受固定超时约束）
    async fn submit(&self, request: GenerationRequest)
        -> Result<GenerationResponse, GenerationError>;

    /// 检查生成服务是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
