use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HydroError, Result};

/// Number of features the classifier was trained on.
pub const FEATURE_COUNT: usize = 9;

// =============================================================================
// Parameters
// =============================================================================

/// One of the nine measured water-quality parameters.
///
/// Variant order is the feature order the classifier was trained on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "pH")]
    Ph,
    Hardness,
    Solids,
    Chloramines,
    Sulfate,
    Conductivity,
    #[serde(rename = "Organic_carbon")]
    OrganicCarbon,
    Trihalomethanes,
    Turbidity,
}

/// Recommended band for a parameter when water is used for irrigation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimalRange {
    /// Inclusive lower and upper bound.
    Between { min: f64, max: f64 },
    /// Strictly below the bound.
    Below { max: f64 },
}

impl OptimalRange {
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            OptimalRange::Between { min, max } => value >= min && value <= max,
            OptimalRange::Below { max } => value < max,
        }
    }
}

impl fmt::Display for OptimalRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimalRange::Between { min, max } => write!(f, "{} - {}", min, max),
            OptimalRange::Below { max } => write!(f, "< {}", max),
        }
    }
}

impl Parameter {
    /// All parameters in training order.
    pub const ALL: [Parameter; FEATURE_COUNT] = [
        Parameter::Ph,
        Parameter::Hardness,
        Parameter::Solids,
        Parameter::Chloramines,
        Parameter::Sulfate,
        Parameter::Conductivity,
        Parameter::OrganicCarbon,
        Parameter::Trihalomethanes,
        Parameter::Turbidity,
    ];

    /// Position of this parameter in the feature vector.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used in the training data, JSON payloads, and prompts.
    pub fn key(self) -> &'static str {
        match self {
            Parameter::Ph => "pH",
            Parameter::Hardness => "Hardness",
            Parameter::Solids => "Solids",
            Parameter::Chloramines => "Chloramines",
            Parameter::Sulfate => "Sulfate",
            Parameter::Conductivity => "Conductivity",
            Parameter::OrganicCarbon => "Organic_carbon",
            Parameter::Trihalomethanes => "Trihalomethanes",
            Parameter::Turbidity => "Turbidity",
        }
    }

    /// Measurement unit. pH is dimensionless.
    pub fn unit(self) -> &'static str {
        match self {
            Parameter::Ph => "",
            Parameter::Hardness => "mg/L",
            Parameter::Solids => "ppm",
            Parameter::Chloramines => "mg/L",
            Parameter::Sulfate => "mg/L",
            Parameter::Conductivity => "μS/cm",
            Parameter::OrganicCarbon => "mg/L",
            Parameter::Trihalomethanes => "μg/L",
            Parameter::Turbidity => "NTU",
        }
    }

    /// Inclusive range accepted at the input boundary.
    pub fn input_range(self) -> (f64, f64) {
        match self {
            Parameter::Ph => (0.0, 14.0),
            Parameter::Hardness => (0.0, 500.0),
            Parameter::Solids => (0.0, 50_000.0),
            Parameter::Chloramines => (0.0, 10.0),
            Parameter::Sulfate => (0.0, 500.0),
            Parameter::Conductivity => (0.0, 1000.0),
            Parameter::OrganicCarbon => (0.0, 20.0),
            Parameter::Trihalomethanes => (0.0, 100.0),
            Parameter::Turbidity => (0.0, 10.0),
        }
    }

    /// Value pre-filled in the input form.
    pub fn default_value(self) -> f64 {
        match self {
            Parameter::Ph => 7.0,
            Parameter::Hardness => 100.0,
            Parameter::Solids => 500.0,
            Parameter::Chloramines => 4.0,
            Parameter::Sulfate => 250.0,
            Parameter::Conductivity => 400.0,
            Parameter::OrganicCarbon => 10.0,
            Parameter::Trihalomethanes => 50.0,
            Parameter::Turbidity => 3.0,
        }
    }

    /// Irrigation guidance band, where one is published.
    pub fn optimal_range(self) -> Option<OptimalRange> {
        match self {
            Parameter::Ph => Some(OptimalRange::Between { min: 6.5, max: 8.5 }),
            Parameter::Hardness => Some(OptimalRange::Below { max: 300.0 }),
            Parameter::Solids => Some(OptimalRange::Below { max: 1000.0 }),
            Parameter::Conductivity => Some(OptimalRange::Below { max: 750.0 }),
            Parameter::Turbidity => Some(OptimalRange::Below { max: 5.0 }),
            _ => None,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Parameter {
    type Err = HydroError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "ph" => Ok(Parameter::Ph),
            "hardness" => Ok(Parameter::Hardness),
            "solids" | "tds" => Ok(Parameter::Solids),
            "chloramines" => Ok(Parameter::Chloramines),
            "sulfate" => Ok(Parameter::Sulfate),
            "conductivity" => Ok(Parameter::Conductivity),
            "organic_carbon" | "organiccarbon" => Ok(Parameter::OrganicCarbon),
            "trihalomethanes" | "thm" => Ok(Parameter::Trihalomethanes),
            "turbidity" => Ok(Parameter::Turbidity),
            _ => Err(HydroError::UnknownParameter(s.to_string())),
        }
    }
}

// =============================================================================
// Water sample
// =============================================================================

/// One set of measured water-quality parameters.
///
/// Every field is required when deserializing; there is no partially
/// specified sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaterSample {
    #[serde(rename = "pH")]
    pub ph: f64,
    /// mg/L
    #[serde(rename = "Hardness")]
    pub hardness: f64,
    /// Total dissolved solids, ppm
    #[serde(rename = "Solids")]
    pub solids: f64,
    /// mg/L
    #[serde(rename = "Chloramines")]
    pub chloramines: f64,
    /// mg/L
    #[serde(rename = "Sulfate")]
    pub sulfate: f64,
    /// μS/cm
    #[serde(rename = "Conductivity")]
    pub conductivity: f64,
    /// mg/L
    #[serde(rename = "Organic_carbon")]
    pub organic_carbon: f64,
    /// μg/L
    #[serde(rename = "Trihalomethanes")]
    pub trihalomethanes: f64,
    /// NTU
    #[serde(rename = "Turbidity")]
    pub turbidity: f64,
}

impl Default for WaterSample {
    fn default() -> Self {
        let mut features = [0.0; FEATURE_COUNT];
        for parameter in Parameter::ALL {
            features[parameter.index()] = parameter.default_value();
        }
        Self::from_features(features)
    }
}

impl WaterSample {
    /// Build a sample from a feature vector in training order.
    pub fn from_features(f: [f64; FEATURE_COUNT]) -> Self {
        Self {
            ph: f[0],
            hardness: f[1],
            solids: f[2],
            chloramines: f[3],
            sulfate: f[4],
            conductivity: f[5],
            organic_carbon: f[6],
            trihalomethanes: f[7],
            turbidity: f[8],
        }
    }

    /// Feature vector in training order.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.ph,
            self.hardness,
            self.solids,
            self.chloramines,
            self.sulfate,
            self.conductivity,
            self.organic_carbon,
            self.trihalomethanes,
            self.turbidity,
        ]
    }

    pub fn get(&self, parameter: Parameter) -> f64 {
        self.features()[parameter.index()]
    }

    pub fn set(&mut self, parameter: Parameter, value: f64) {
        let mut features = self.features();
        features[parameter.index()] = value;
        *self = Self::from_features(features);
    }

    /// Check every value is finite and inside its accepted input range.
    pub fn validate(&self) -> Result<()> {
        for parameter in Parameter::ALL {
            let value = self.get(parameter);
            if !value.is_finite() {
                return Err(HydroError::NotFinite(parameter));
            }
            let (min, max) = parameter.input_range();
            if value < min || value > max {
                return Err(HydroError::OutOfRange {
                    parameter,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Parameters whose value falls outside the irrigation guidance band.
    pub fn out_of_optimal(&self) -> Vec<Parameter> {
        Parameter::ALL
            .into_iter()
            .filter(|p| {
                p.optimal_range()
                    .is_some_and(|range| !range.contains(self.get(*p)))
            })
            .collect()
    }

    /// `key: value` pairs joined by `", "`, as embedded in the advisory prompt.
    pub fn prompt_summary(&self) -> String {
        Parameter::ALL
            .iter()
            .map(|p| format!("{}: {}", p.key(), format_value(self.get(*p))))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Shortest round-trip form, keeping `.0` on integral values.
fn format_value(value: f64) -> String {
    format!("{:?}", value)
}

// =============================================================================
// Prediction result
// =============================================================================

/// Binary classifier output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Potability {
    /// Class 0: water needs treatment.
    Unsuitable,
    /// Class 1: water is suitable.
    Suitable,
}

impl Potability {
    /// Class label as trained: 0 or 1.
    pub fn label(self) -> u8 {
        match self {
            Potability::Unsuitable => 0,
            Potability::Suitable => 1,
        }
    }

    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Potability::Unsuitable),
            1 => Some(Potability::Suitable),
            _ => None,
        }
    }
}

/// Outcome of one analyze action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PotabilityResult {
    /// The classifier produced a label.
    Predicted { potability: Potability },
    /// No classifier is loaded; the reason is reported to the caller.
    Unavailable { reason: String },
}

impl PotabilityResult {
    /// 0/1 label, or `None` when the model is unavailable.
    pub fn label(&self) -> Option<u8> {
        match self {
            PotabilityResult::Predicted { potability } => Some(potability.label()),
            PotabilityResult::Unavailable { .. } => None,
        }
    }

    pub fn potability(&self) -> Option<Potability> {
        match self {
            PotabilityResult::Predicted { potability } => Some(*potability),
            PotabilityResult::Unavailable { .. } => None,
        }
    }
}

// =============================================================================
// Chat
// =============================================================================

/// Author of a chat turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in the advisory conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Ordered, append-only conversation record.
///
/// Turns are only ever added in user/assistant pairs, so the transcript never
/// ends on an unanswered user turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatTranscript {
    turns: Vec<ChatTurn>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message and the assistant reply to it.
    ///
    /// Returns the appended assistant turn.
    pub fn push_exchange(
        &mut self,
        user: impl Into<String>,
        assistant: impl Into<String>,
    ) -> &ChatTurn {
        self.turns.push(ChatTurn::user(user));
        self.turns.push(ChatTurn::assistant(assistant));
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// `role: content` lines joined by newlines, oldest first.
    pub fn render_history(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.role, t.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for &'a ChatTranscript {
    type Item = &'a ChatTurn;
    type IntoIter = std::slice::Iter<'a, ChatTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

// =============================================================================
// Language
// =============================================================================

/// Display and reply language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Japanese,
}

impl Language {
    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Japanese => "ja",
        }
    }

    /// Instruction inserted into the advisory prompt, if any.
    pub fn directive(self) -> Option<&'static str> {
        match self {
            Language::English => None,
            Language::Japanese => Some("Please respond in Japanese language. "),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "English"),
            Language::Japanese => write!(f, "Japanese"),
        }
    }
}

impl FromStr for Language {
    type Err = HydroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "japanese" | "ja" | "jp" => Ok(Language::Japanese),
            _ => Err(HydroError::UnknownLanguage(s.to_string())),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
