//! ============================================================================
//! Tutoring Service — Gemini generateContent client
//! ============================================================================
//! Stateless request/response text completion. The contract guarantees a
//! display-ready string on the common path; a raised failure is converted by
//! the session layer to a fixed apology. A missing API key is detected up
//! front and every call short-circuits to the disconnected message without
//! touching the network.
//! ============================================================================

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::types::{HistoryEntry, Subject, TutorError};

/// API endpoint root for Gemini content generation
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Model used for tutoring turns
const TUTOR_MODEL: &str = "gemini-3-flash-preview";

/// Deployment placeholder that must never be sent as a real key
const PLACEHOLDER_KEY: &str = "__GEMINI_API_KEY__";

/// Only this many trailing transcript messages are forwarded per call
pub const MAX_HISTORY_DEPTH: usize = 10;

/// Shown when no API key is configured; no network call is made
pub const DISCONNECTED_MESSAGE: &str = "Ẹ má bínú (I am sorry). My knowledge bank is currently \
    disconnected because my API Key is missing. Please ask the developer to configure the \
    environment correctly.";

/// Shown when the service raises a failure mid-call
pub const APOLOGY_MESSAGE: &str = "Eyah, the connection is currently unstable. Please check your \
    data and try again in a moment.";

/// Shown when the service answers with no usable text
const EMPTY_RESPONSE_MESSAGE: &str = "Ẹ má bínú, my thoughts are a bit scattered. Please ask \
    your question again.";

const SYSTEM_INSTRUCTION: &str = r#"
You are 'Alámò', a world-class STEM tutor for SSS3 WAEC/JAMB students in Southwest Nigeria (Yoruba land).

CORE RULE: STRICTLY AVOID NIGERIAN PIDGIN. Do not use words like "sabi", "dey", "pikin", "no be", "wetin", or "sharp guy/babe".

Your personality: Wise, encouraging, respectful, and culturally grounded.
Language: Use "Yoruba-Glish" (High-quality English mixed with pure Yoruba expressions).
Tone: You are like a brilliant, witty older mentor or a favorite teacher from a top school in Ibadan or Lagos. Address the student respectfully as "Ọmọ mi" or "Àbúrò mi".

Yoruba Phrases to include:
- Greetings/Praise: "Ẹ kú iṣẹ́!" (Well done), "Gbayi!" (Brilliant), "Ọpọlọ rẹ yá!" (You are sharp), "Atata ni ẹ!" (You are excellent), "Iṣẹ́ gidi!" (Great work).
- Encouragement: "Má kàn sọ̀rọ̀!" (Keep going!), "O yẹ yín!" (You understand!), "Àṣẹ̀ṣẹ̀ mọ̀ ni!" (This is just the beginning of your knowledge).

STEM Analogies (Southwest Context):
- Physics: Relate electricity to the buzz of a generator in a quiet neighborhood or gravity to a ripe mango falling from a tree in the compound.
- Math: Relate geometry to the intricate patterns of an Adire fabric or sets to the arrangement of goods in Gbagi Market.
- Chemistry: Relate catalysts to the way "Iru" (locust beans) speeds up the flavor of a soup or reactions to the process of making Gari.
- Biology: Relate ecosystems to the balance of a cocoa plantation or cells to the different rooms in an "Agboole" (family compound).

Positive Reinforcement (Subject Specific):
- Physics: "Newton gan-an á proud fun ẹ! Your calculation is accurate."
- Math: "Numbers don't lie, and you have mastered them. Gbayi!"
- Chemistry: "The equilibrium is perfect. You understand the elements of success."
- Biology: "Your brain cells are firing beautifully. Nature itself is proud of your progress."

Keep answers concise, focus on exam-readiness for WAEC/JAMB, and always maintain your 'Alámò' (the wise one) persona.
"#;

/// Object-safe seam over the external tutoring service
#[async_trait]
pub trait TutorService: Send + Sync {
    /// Ask a single tutoring question with a bounded transcript window.
    /// Must always return a display-ready string or a mappable failure;
    /// no retry, no streaming, no cancellation.
    async fn ask(&self, prompt: &str, subject: Subject, history: &[HistoryEntry])
        -> Result<String>;
}

/// Gemini-backed tutoring service
pub struct GeminiTutor {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl GeminiTutor {
    /// Create a new GeminiTutor. An empty or placeholder key counts as
    /// unconfigured and flips every call into the disconnected short-circuit.
    pub fn new(api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty() && k != PLACEHOLDER_KEY);
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    /// Read the key from GEMINI_API_KEY
    pub fn from_env() -> Self {
        Self::new(std::env::var("GEMINI_API_KEY").ok())
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl TutorService for GeminiTutor {
    async fn ask(
        &self,
        prompt: &str,
        subject: Subject,
        history: &[HistoryEntry],
    ) -> Result<String> {
        let Some(key) = &self.api_key else {
            error!("GEMINI_API_KEY is missing or was not replaced during deployment");
            return Ok(DISCONNECTED_MESSAGE.to_string());
        };

        let request = build_request(prompt, subject, history);
        debug!(
            "Calling Gemini with {} history entries for {}",
            history.len(),
            subject
        );

        let url = format!("{}/{}:generateContent", GEMINI_API_URL, TUTOR_MODEL);
        let response = self
            .client
            .post(&url)
            .query(&[("key", key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| TutorError::ExternalServiceFailure(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(
                TutorError::ExternalServiceFailure(format!("Gemini API error {}: {}", status, body))
                    .into(),
            );
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TutorError::ExternalServiceFailure(format!("bad response: {}", e)))?;

        let text = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            Ok(EMPTY_RESPONSE_MESSAGE.to_string())
        } else {
            Ok(text)
        }
    }
}

fn build_request(prompt: &str, subject: Subject, history: &[HistoryEntry]) -> GenerateRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|entry| Content {
            role: Some(entry.role.as_str().to_string()),
            parts: vec![Part {
                text: entry.content.clone(),
            }],
        })
        .collect();

    contents.push(Content {
        role: Some("user".to_string()),
        parts: vec![Part {
            text: format!("Subject: {}. Student Prompt: {}", subject, prompt),
        }],
    });

    GenerateRequest {
        contents,
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: SYSTEM_INSTRUCTION.trim().to_string(),
            }],
        },
        generation_config: GenerationConfig { temperature: 0.7 },
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}
