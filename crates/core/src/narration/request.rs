//! Multi-modal chat request assembled from the loaded artifacts.

use serde::Serialize;

use crate::artifacts::{ResultsSummary, SampleRecord};
use crate::figures::FigureArtifact;

/// Samples embedded in the textual context.
pub const CONTEXT_SAMPLE_LIMIT: usize = 20;

/// Images the narrative service accepts in one request.
pub const MAX_IMAGES: usize = 4;

const PERSONA: &str = "You are a mathematical researcher analyzing Diophantine constraint results. \
Analyze the data and figures, identify key patterns, validate hypotheses from the essay, \
and provide insights about the multiplicity structure, growth rates, and geometric properties. \
Write in a clear, scholarly style suitable for inclusion in a research report.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn has_image(&self) -> bool {
        match &self.content {
            MessageContent::Text(_) => false,
            MessageContent::Parts(parts) => parts
                .iter()
                .any(|p| matches!(p, ContentPart::ImageUrl { .. })),
        }
    }
}

/// Ordered message list sent to the narrative service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NarrationRequest {
    pub messages: Vec<ChatMessage>,
}

impl NarrationRequest {
    pub fn image_count(&self) -> usize {
        self.messages.iter().filter(|m| m.has_image()).count()
    }
}

/// Build the persona, context and (at most [`MAX_IMAGES`]) figure messages.
pub fn build_request(
    summary: &ResultsSummary,
    samples: &[SampleRecord],
    figures: &[FigureArtifact],
) -> NarrationRequest {
    let mut messages = vec![
        ChatMessage::text(Role::System, PERSONA),
        ChatMessage::text(Role::User, build_context(summary, samples, figures)),
    ];

    if figures.len() > MAX_IMAGES {
        tracing::debug!(
            available = figures.len(),
            sent = MAX_IMAGES,
            "truncating figures to the service image limit"
        );
    }
    messages.extend(figures.iter().take(MAX_IMAGES).map(|figure| ChatMessage {
        role: Role::User,
        content: MessageContent::Parts(vec![
            ContentPart::Text {
                text: format!("Figure: {}", figure.name()),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: figure.data_url(),
                },
            },
        ]),
    }));

    NarrationRequest { messages }
}

/// Textual context: full summary, leading samples, and figure inventory.
pub fn build_context(
    summary: &ResultsSummary,
    samples: &[SampleRecord],
    figures: &[FigureArtifact],
) -> String {
    let head = &samples[..samples.len().min(CONTEXT_SAMPLE_LIMIT)];
    let names: Vec<&str> = figures.iter().map(FigureArtifact::name).collect();

    format!(
        "\n# Diophantine Constraint Analysis Results\n\n\
         ## Summary Statistics\n{}\n\n\
         ## Sample Multiplicity Data (first {} entries)\n{}\n\n\
         ## Generated Figures\n{} figures generated:\n{}\n",
        to_pretty_json(summary),
        CONTEXT_SAMPLE_LIMIT,
        to_pretty_json(&head),
        figures.len(),
        names.join(", "),
    )
}

fn to_pretty_json<T: Serialize>(value: &T) -> String {
    // Maps of JSON values always serialize.
    serde_json::to_string_pretty(value).unwrap_or_default()
}
