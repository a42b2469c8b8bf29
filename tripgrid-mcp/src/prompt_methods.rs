// tripgrid-mcp/src/prompt_methods.rs
// ============================================================================
// Module: Prompt Wire Shapes
// Description: Shared payloads for prompts/list, prompts/get, and fallbacks.
// Purpose: Keep the MCP prompt methods and fallback tools byte-identical.
// Dependencies: tripgrid-core, serde
// ============================================================================

//! ## Overview
//! The dispatcher serves prompts through `prompts/list` / `prompts/get`; the
//! fallback tools `list_prompts` / `get_prompt` return the same payloads for
//! clients without prompt support. Both paths go through this module so the
//! shapes cannot drift apart.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;
use tripgrid_core::PromptCatalog;
use tripgrid_core::PromptError;
use tripgrid_core::PromptMessage;

// ============================================================================
// SECTION: Wire Shapes
// ============================================================================

/// Prompt entry in `prompts/list`.
#[derive(Debug, Serialize)]
pub struct PromptListing {
    /// Prompt name.
    pub name: String,
    /// Prompt description.
    pub description: String,
    /// Declared arguments in template order.
    pub arguments: Vec<PromptArgumentListing>,
}

/// Argument entry within a prompt listing.
#[derive(Debug, Serialize)]
pub struct PromptArgumentListing {
    /// Argument name.
    pub name: String,
    /// Argument description.
    pub description: String,
    /// Whether the argument must be supplied.
    pub required: bool,
}

/// Rendered prompt returned by `prompts/get`.
#[derive(Debug, Serialize)]
pub struct RenderedPrompt {
    /// Prompt description.
    pub description: String,
    /// Rendered message sequence.
    pub messages: Vec<PromptMessage>,
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Builds the prompt listing payload from the catalog.
#[must_use]
pub fn prompt_listing(catalog: &PromptCatalog) -> Vec<PromptListing> {
    catalog
        .list()
        .into_iter()
        .map(|descriptor| PromptListing {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            arguments: descriptor
                .arguments
                .iter()
                .map(|argument| PromptArgumentListing {
                    name: argument.name.clone(),
                    description: argument.description.clone(),
                    required: argument.required,
                })
                .collect(),
        })
        .collect()
}

/// Renders a prompt into the `prompts/get` payload.
///
/// # Errors
///
/// Returns [`PromptError`] when the prompt is unknown or arguments are
/// incomplete.
pub fn rendered_prompt(
    catalog: &PromptCatalog,
    name: &str,
    arguments: &BTreeMap<String, String>,
) -> Result<RenderedPrompt, PromptError> {
    let descriptor =
        catalog.get(name).ok_or_else(|| PromptError::UnknownPrompt(name.to_string()))?;
    let message = catalog.render(name, arguments)?;
    Ok(RenderedPrompt {
        description: descriptor.description.clone(),
        messages: vec![message],
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
