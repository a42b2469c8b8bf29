// tripgrid-core/src/content.rs
// ============================================================================
// Module: Tool Content Model
// Description: MCP tool result envelope and content parts.
// Purpose: Provide the canonical wire shape for tool call responses.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Tool handlers return a [`ToolResult`]: an ordered sequence of content
//! parts plus an error flag. Business failures travel inside the result with
//! `is_error` set, keeping the normal response channel intact for the model;
//! only protocol-level faults become JSON-RPC errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Content Parts
// ============================================================================

/// One content part of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Plain text payload.
    Text {
        /// Text body.
        text: String,
    },
    /// Base64-encoded image payload.
    Image {
        /// Image MIME type.
        #[serde(rename = "mimeType")]
        mime_type: String,
        /// Base64-encoded image bytes.
        data: String,
    },
}

impl ToolContent {
    /// Builds a text content part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
        }
    }
}

// ============================================================================
// SECTION: Tool Result
// ============================================================================

/// Result envelope for a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the handler reported a business failure.
    #[serde(rename = "isError", default)]
    pub is_error: bool,
    /// Ordered content parts; non-empty for successful results.
    pub content: Vec<ToolContent>,
}

impl ToolResult {
    /// Builds a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            content: vec![ToolContent::text(text)],
        }
    }

    /// Builds a successful result carrying a JSON payload as text.
    ///
    /// Serialization of a [`Value`] is infallible, so this cannot fail.
    #[must_use]
    pub fn json(value: &Value) -> Self {
        Self::text(value.to_string())
    }

    /// Builds a business-failure result with a text explanation.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: vec![ToolContent::text(message)],
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::panic, clippy::unwrap_used, reason = "Test-only assertions.")]

    use serde_json::json;

    use super::ToolContent;
    use super::ToolResult;

    #[test]
    fn text_result_serializes_with_mcp_field_names() {
        let result = ToolResult::text("hello");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["isError"], json!(false));
        assert_eq!(value["content"][0]["type"], json!("text"));
        assert_eq!(value["content"][0]["text"], json!("hello"));
    }

    #[test]
    fn image_part_uses_camel_case_mime_type() {
        let part = ToolContent::Image {
            mime_type: "image/png".to_string(),
            data: "aGVsbG8=".to_string(),
        };
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["mimeType"], json!("image/png"));
    }

    #[test]
    fn error_result_sets_flag_and_keeps_content() {
        let result = ToolResult::error("booking declined");
        assert!(result.is_error);
        assert!(!result.content.is_empty());
    }

    #[test]
    fn json_result_is_parseable_text() {
        let result = ToolResult::json(&json!({"authenticated": false}));
        let ToolContent::Text {
            text,
        } = &result.content[0]
        else {
            panic!("expected text content");
        };
        let parsed: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["authenticated"], json!(false));
    }
}
