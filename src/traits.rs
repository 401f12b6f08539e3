//! Provider adapter trait and message types.
//!
//! # WHY: Trait-Based Provider Abstraction
//!
//! The orchestrator never sees provider wire formats. Each backend (OpenAI,
//! Anthropic, Google, local models) implements [`ProviderAdapter`] and converts
//! its own request/response shapes. This keeps:
//! - **Testing** cheap: [`crate::providers::mock::MockAdapter`] needs no network
//! - **Fallback** uniform: any adapter can stand in for any other
//!
//! # Key Types
//!
//! - [`ProviderAdapter`]: unary and (optional) streaming generation
//! - [`ChatMessage`] / [`ChatRole`]: conversation input
//! - [`ProviderChunk`]: provider-native stream items consumed by
//!   [`crate::stream`]

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{LlmError, Result};
use crate::types::{FinishReason, GenerationRequest, GenerationResponse, Usage};

// ============================================================================
// Function/Tool Declarations
// ============================================================================

/// Definition of a tool that the model can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function" for function tools).
    #[serde(rename = "type")]
    pub tool_type: String,

    /// Function definition.
    pub function: FunctionDefinition,
}

impl ToolDefinition {
    /// Create a new function tool definition.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: JsonValue,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// Definition of a function that can be called by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function.
    pub name: String,

    /// Description of what the function does.
    pub description: String,

    /// JSON Schema defining the function parameters.
    pub parameters: JsonValue,
}

// ============================================================================
// Messages
// ============================================================================

/// Role of a chat message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System message for setting context.
    System,
    /// User input message.
    User,
    /// Assistant response message.
    Assistant,
    /// Tool result message.
    Tool,
}

impl ChatRole {
    /// Convert role to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::Tool => "tool",
        }
    }
}

/// A message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: ChatRole,

    /// Content of the message.
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// Create a tool result message.
    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Tool, content)
    }
}

// ============================================================================
// Provider-native Streaming
// ============================================================================

/// Item of a provider's raw stream, before normalization.
///
/// Adapters translate their wire events into these; the
/// [`crate::stream::normalize`] turns them into
/// [`crate::types::StreamChunk`] values with accumulated content.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderChunk {
    /// Newly produced text fragment.
    Delta(String),

    /// Usage counters reported ahead of the finish event.
    Usage(Usage),

    /// The provider signalled completion.
    Finished {
        /// Why generation stopped.
        reason: FinishReason,
        /// Final usage if the provider reports it with the finish event.
        usage: Option<Usage>,
    },
}

// ============================================================================
// Provider Adapter
// ============================================================================

/// One backend capable of serving generation requests.
///
/// Adapters own their network timeouts and wire conversions. The orchestrator
/// only relies on this capability set.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider id this adapter serves (e.g. "openai").
    fn name(&self) -> &str;

    /// Generate a complete response.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse>;

    /// Open a provider-native chunk stream.
    ///
    /// Dropping the returned stream must release the underlying connection.
    async fn generate_stream(
        &self,
        _request: &GenerationRequest,
    ) -> Result<BoxStream<'static, Result<ProviderChunk>>> {
        Err(LlmError::NotSupported(format!(
            "streaming not supported by provider '{}'",
            self.name()
        )))
    }

    /// Check if the adapter supports streaming.
    fn supports_streaming(&self) -> bool {
        false
    }
}
