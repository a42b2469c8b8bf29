// tripgrid-core/src/prompts.rs
// ============================================================================
// Module: Prompt Catalog
// Description: Declarative prompt templates with argument substitution.
// Purpose: Provide the prompt catalog served via prompts/list and prompts/get.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Prompts are loaded from a declarative catalog at startup and are immutable
//! for the process lifetime. Rendering substitutes `{{var}}` tokens from the
//! caller's arguments plus synthetic variables computed from them. Rendering
//! is pure: the same template and arguments always produce the same string.
//!
//! Substitution performs no escaping. Rendered output is LLM-facing text and
//! must not be interpolated into HTML or JSON contexts downstream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Prompt Types
// ============================================================================

/// Argument accepted by a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name referenced as `{{name}}` in the template.
    pub name: String,
    /// Human-readable description for clients.
    pub description: String,
    /// Whether the argument must be supplied.
    pub required: bool,
}

/// Prompt template descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDescriptor {
    /// Prompt name, unique within the catalog.
    pub name: String,
    /// Human-readable description for clients.
    pub description: String,
    /// Ordered argument declarations.
    pub arguments: Vec<PromptArgument>,
    /// Template body containing `{{var}}` placeholders.
    pub template: String,
}

/// Rendered prompt message in MCP shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Message role; always `user` for rendered templates.
    pub role: String,
    /// Message content payload.
    pub content: PromptMessageContent,
}

/// Content payload of a rendered prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptMessageContent {
    /// Plain text payload.
    Text {
        /// Rendered template text.
        text: String,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Prompt catalog and rendering errors.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Prompt name not present in the catalog.
    #[error("unknown prompt: {0}")]
    UnknownPrompt(String),
    /// A required argument was not supplied.
    #[error("missing required argument: {0}")]
    MissingArgument(String),
    /// A prompt name was registered twice.
    #[error("duplicate prompt: {0}")]
    Duplicate(String),
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Immutable prompt catalog keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    /// Registered prompts ordered by name.
    prompts: BTreeMap<String, PromptDescriptor>,
}

impl PromptCatalog {
    /// Builds an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the built-in travel planning catalog.
    #[must_use]
    pub fn travel() -> Self {
        let mut catalog = Self::new();
        for descriptor in travel_prompts() {
            // Built-in names are distinct; insertion cannot collide.
            let _ = catalog.register(descriptor);
        }
        catalog
    }

    /// Registers a prompt descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Duplicate`] when the name is already taken.
    pub fn register(&mut self, descriptor: PromptDescriptor) -> Result<(), PromptError> {
        if self.prompts.contains_key(&descriptor.name) {
            return Err(PromptError::Duplicate(descriptor.name));
        }
        self.prompts.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Lists all prompt descriptors ordered by name.
    #[must_use]
    pub fn list(&self) -> Vec<&PromptDescriptor> {
        self.prompts.values().collect()
    }

    /// Looks up a prompt descriptor by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PromptDescriptor> {
        self.prompts.get(name)
    }

    /// Renders a prompt into a single user message.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError`] when the prompt is unknown or a required
    /// argument is missing.
    pub fn render(
        &self,
        name: &str,
        arguments: &BTreeMap<String, String>,
    ) -> Result<PromptMessage, PromptError> {
        let descriptor =
            self.get(name).ok_or_else(|| PromptError::UnknownPrompt(name.to_string()))?;
        let text = render_template(descriptor, arguments)?;
        Ok(PromptMessage {
            role: "user".to_string(),
            content: PromptMessageContent::Text {
                text,
            },
        })
    }
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders a template with caller arguments plus synthetic variables.
fn render_template(
    descriptor: &PromptDescriptor,
    arguments: &BTreeMap<String, String>,
) -> Result<String, PromptError> {
    for argument in &descriptor.arguments {
        if argument.required && !arguments.contains_key(&argument.name) {
            return Err(PromptError::MissingArgument(argument.name.clone()));
        }
    }
    let mut variables = arguments.clone();
    apply_synthetic_variables(descriptor, &mut variables);
    let mut rendered = descriptor.template.clone();
    for (name, value) in &variables {
        rendered = rendered.replace(&format!("{{{{{name}}}}}"), value);
    }
    Ok(rendered)
}

/// Computes synthetic variables derived from caller arguments.
///
/// Unknown placeholders are left intact so template authors notice gaps.
fn apply_synthetic_variables(
    descriptor: &PromptDescriptor,
    variables: &mut BTreeMap<String, String>,
) {
    if descriptor.template.contains("{{budget_text}}") {
        let budget_text = match variables.get("budget") {
            Some(budget) if !budget.is_empty() => {
                format!("Keep the total cost under {budget}.")
            }
            _ => "There is no fixed budget for this trip.".to_string(),
        };
        variables.insert("budget_text".to_string(), budget_text);
    }
    if descriptor.template.contains("{{preferences}}") && !variables.contains_key("preferences") {
        variables.insert("preferences".to_string(), "no special preferences".to_string());
    }
}

/// Built-in travel planning prompt descriptors.
fn travel_prompts() -> Vec<PromptDescriptor> {
    vec![
        PromptDescriptor {
            name: "plan_trip".to_string(),
            description: "Draft a day-by-day travel plan for a destination and date range"
                .to_string(),
            arguments: vec![
                PromptArgument {
                    name: "destination".to_string(),
                    description: "Destination city".to_string(),
                    required: true,
                },
                PromptArgument {
                    name: "start_date".to_string(),
                    description: "Trip start date (YYYY-MM-DD)".to_string(),
                    required: true,
                },
                PromptArgument {
                    name: "end_date".to_string(),
                    description: "Trip end date (YYYY-MM-DD)".to_string(),
                    required: true,
                },
                PromptArgument {
                    name: "budget".to_string(),
                    description: "Total budget in USD".to_string(),
                    required: false,
                },
                PromptArgument {
                    name: "preferences".to_string(),
                    description: "Traveler preferences".to_string(),
                    required: false,
                },
            ],
            template: "Plan a trip to {{destination}} from {{start_date}} to {{end_date}}. \
                       {{budget_text}} The traveler has {{preferences}}. Use the available \
                       booking tools to check hotels and flights before proposing the plan."
                .to_string(),
        },
        PromptDescriptor {
            name: "review_travel_policy".to_string(),
            description: "Summarize the tenant travel policy and flag conflicts with a plan"
                .to_string(),
            arguments: vec![PromptArgument {
                name: "focus".to_string(),
                description: "Optional policy area to focus on".to_string(),
                required: false,
            }],
            template: "Read the tenant travel policy resource and summarize the rules. Focus \
                       on: {{focus}}. Flag any bookings in the current plan that conflict \
                       with the policy."
                .to_string(),
        },
    ]
}

// ============================================================================
// SECTION: Tests
// ============================================================================
