//! Pipeline explanations from a text-generation backend.
//!
//! The visualizer never shows an error: a missing API key or a failed
//! request turns into a fixed message for the reader. There is no retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Shown when no API key is configured.
pub const MISSING_KEY_MESSAGE: &str =
    "API key is not configured. Please set the API_KEY environment variable.";

/// Shown when the backend call fails.
pub const FAILURE_MESSAGE: &str =
    "An error occurred while fetching the explanation. Please try again later.";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "API_KEY";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Errors from a text-generation backend.
#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("API key is not configured")]
    MissingApiKey,

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Backend returned an empty response")]
    EmptyResponse,
}

impl ExplainError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// A hosted text-generation model.
#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    /// Generates text for `prompt` with the named model.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ExplainError>;
}

/// Backend used when no network client is available; every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGenerator;

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, ExplainError> {
        Err(ExplainError::backend("no text-generation backend available"))
    }
}

/// Configuration for the explanation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainConfig {
    pub api_key: Option<String>,
    pub model: String,
}

impl ExplainConfig {
    /// Reads the API key from `API_KEY`; an empty value counts as missing.
    pub fn from_env() -> Self {
        let api_key = std::env::var(API_KEY_VAR).ok().filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("{} environment variable not set", API_KEY_VAR);
        }
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Explanation service with the fallback policy applied.
pub struct Explainer<G: TextGenerator> {
    config: ExplainConfig,
    generator: G,
}

impl<G: TextGenerator> Explainer<G> {
    pub fn new(config: ExplainConfig, generator: G) -> Self {
        Self { config, generator }
    }

    pub fn config(&self) -> &ExplainConfig {
        &self.config
    }

    /// Returns generated text, or a fixed fallback message.
    pub async fn explain(&self, prompt: &str) -> String {
        match self.try_explain(prompt).await {
            Ok(text) => text,
            Err(ExplainError::MissingApiKey) => MISSING_KEY_MESSAGE.to_string(),
            Err(e) => {
                warn!("Error generating explanation: {}", e);
                FAILURE_MESSAGE.to_string()
            }
        }
    }

    /// Single attempt, errors surfaced.
    pub async fn try_explain(&self, prompt: &str) -> Result<String, ExplainError> {
        if self.config.api_key.is_none() {
            return Err(ExplainError::MissingApiKey);
        }
        debug!(model = %self.config.model, chars = prompt.len(), "Requesting explanation");
        let text = self.generator.generate(&self.config.model, prompt).await?;
        if text.trim().is_empty() {
            return Err(ExplainError::EmptyResponse);
        }
        Ok(text)
    }

    /// Explains one pipeline step.
    pub async fn explain_step(&self, step: PipelineStep) -> String {
        self.explain(&step.prompt()).await
    }

    /// Describes every application topic concurrently, in topic order.
    pub async fn describe_applications(self: Arc<Self>) -> Vec<ApplicationCard> {
        let mut tasks = JoinSet::new();
        for (index, topic) in ApplicationTopic::all().into_iter().enumerate() {
            let explainer = Arc::clone(&self);
            tasks.spawn(async move {
                let description = explainer.explain(&topic.prompt()).await;
                (index, topic, description)
            });
        }

        let mut cards = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, topic, description)) => cards.push((index, topic.card(index, description))),
                Err(e) => warn!("Application description task failed: {}", e),
            }
        }
        cards.sort_by_key(|(index, _)| *index);
        cards.into_iter().map(|(_, card)| card).collect()
    }
}

// =============================================================================
// PROMPT CATALOG
// =============================================================================

/// Steps of the LiDAR data-science pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Acquisition,
    Preprocessing,
    Segmentation,
    Classification,
    Tracking,
}

impl PipelineStep {
    /// Returns all steps in pipeline order.
    pub fn all() -> Vec<PipelineStep> {
        vec![
            PipelineStep::Acquisition,
            PipelineStep::Preprocessing,
            PipelineStep::Segmentation,
            PipelineStep::Classification,
            PipelineStep::Tracking,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineStep::Acquisition => "Data Acquisition",
            PipelineStep::Preprocessing => "Preprocessing",
            PipelineStep::Segmentation => "Segmentation",
            PipelineStep::Classification => "Classification",
            PipelineStep::Tracking => "Object Tracking & Prediction",
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            "Explain the \"{}\" step in the LiDAR data science pipeline in a concise, \
             easy-to-understand paragraph. Focus on the goal of this step and the common \
             techniques used.",
            self.label()
        )
    }

    /// The following step, wrapping around.
    pub fn next(&self) -> PipelineStep {
        let all = Self::all();
        let i = all.iter().position(|s| s == self).unwrap_or(0);
        all[(i + 1) % all.len()]
    }

    /// The preceding step, wrapping around.
    pub fn previous(&self) -> PipelineStep {
        let all = Self::all();
        let i = all.iter().position(|s| s == self).unwrap_or(0);
        all[(i + all.len() - 1) % all.len()]
    }
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for PipelineStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "acquisition" | "data acquisition" => Ok(PipelineStep::Acquisition),
            "preprocessing" => Ok(PipelineStep::Preprocessing),
            "segmentation" => Ok(PipelineStep::Segmentation),
            "classification" => Ok(PipelineStep::Classification),
            "tracking" | "object tracking & prediction" => Ok(PipelineStep::Tracking),
            _ => Err(format!("Unknown pipeline step: {}", s)),
        }
    }
}

/// Real-world application areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationTopic {
    AutonomousVehicles,
    Forestry,
    Archaeology,
    UrbanPlanning,
    Robotics,
    Agriculture,
}

impl ApplicationTopic {
    pub fn all() -> Vec<ApplicationTopic> {
        vec![
            ApplicationTopic::AutonomousVehicles,
            ApplicationTopic::Forestry,
            ApplicationTopic::Archaeology,
            ApplicationTopic::UrbanPlanning,
            ApplicationTopic::Robotics,
            ApplicationTopic::Agriculture,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            ApplicationTopic::AutonomousVehicles => "Autonomous Vehicles",
            ApplicationTopic::Forestry => "Forestry and Environmental Monitoring",
            ApplicationTopic::Archaeology => "Archaeology and Cultural Heritage",
            ApplicationTopic::UrbanPlanning => "Urban Planning and Smart Cities",
            ApplicationTopic::Robotics => "Robotics and Industrial Automation",
            ApplicationTopic::Agriculture => "Agriculture and Precision Farming",
        }
    }

    /// Search keyword for the card image.
    pub fn image_keyword(&self) -> &'static str {
        match self {
            ApplicationTopic::AutonomousVehicles => "autonomous car lidar",
            ApplicationTopic::Forestry => "forest drone",
            ApplicationTopic::Archaeology => "ancient ruins",
            ApplicationTopic::UrbanPlanning => "smart city",
            ApplicationTopic::Robotics => "factory robot",
            ApplicationTopic::Agriculture => "agriculture drone",
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            "Write a short, engaging description (about 40-50 words) of how LiDAR and data \
             science are used in {}.",
            self.title()
        )
    }

    /// Placeholder image for the card at position `index`.
    ///
    /// Only the first space of the keyword is removed.
    pub fn image_url(&self, index: usize) -> String {
        let seed = self.image_keyword().replacen(' ', "", 1);
        format!("https://picsum.photos/seed/{}{}/600/400", seed, index)
    }

    fn card(&self, index: usize, description: String) -> ApplicationCard {
        ApplicationCard {
            title: self.title().to_string(),
            description,
            image_url: self.image_url(index),
        }
    }
}

/// A described application topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCard {
    pub title: String,
    pub description: String,
    pub image_url: String,
}
