//! AI coach gateway.
//!
//! Builds prompts, calls the generative-language endpoint over blocking
//! reqwest, and classifies failures. One best-effort call per user action:
//! no automatic retry and no backoff. Callers run it on a blocking thread
//! when inside an async runtime.
//!
//! Invalid or expired keys are counted across calls by [`KeyFailureTracker`];
//! once the count reaches the configured threshold the caller is told to
//! replace the key instead of retrying.

use crate::error::{Result, RoutineError};
use crate::failure::UserContext;
use crate::store::{keys, KeyValueStore};
use crate::types::DayStatus;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_KEY_FAILURE_THRESHOLD: u32 = 3;
pub const MIN_API_KEY_LEN: usize = 10;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoachError {
    #[error("{0}")]
    Validation(String),

    #[error("request to the coach failed, try again: {0}")]
    NetworkFailure(String),

    #[error("the API key is not valid")]
    InvalidCredential,

    #[error("the API key has expired")]
    ExpiredCredential,

    #[error("the coach returned no reply")]
    EmptyResponse,

    #[error("coach API error: {0}")]
    UnknownProviderError(String),

    #[error("the API key keeps failing: replace it with 'routine key set <KEY>'")]
    ReplaceCredential,
}

impl CoachError {
    pub fn is_credential(&self) -> bool {
        matches!(
            self,
            CoachError::InvalidCredential | CoachError::ExpiredCredential
        )
    }
}

// ---------------------------------------------------------------------------
// Generation parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    pub fn chat() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 200,
        }
    }

    pub fn reflection() -> Self {
        Self {
            temperature: 0.8,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 250,
        }
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

pub fn build_chat_prompt(goal_title: &str, user_message: &str) -> String {
    format!(
        "당신은 친근하고 격려적인 루틴 코치 AI입니다. 사용자의 목표는 \"{goal_title}\"입니다.\n\
         \n\
         사용자 메시지: \"{user_message}\"\n\
         \n\
         다음 지침에 따라 응답해주세요:\n\
         1. 친근하고 따뜻한 톤으로 대화\n\
         2. 실패나 어려움에 대해서는 위로와 격려 제공\n\
         3. 성공에 대해서는 칭찬과 동기부여\n\
         4. 목표 조정이 필요하면 구체적인 제안\n\
         5. 150자 이내로 간결하게 응답\n\
         6. 이모지를 적절히 사용\n\
         \n\
         응답:"
    )
}

pub fn build_reflection_prompt(
    routine_title: &str,
    context: &UserContext,
    completion: DayStatus,
    reflection: &str,
    failure_reasons: &[String],
) -> String {
    let (status_label, focus) = match completion {
        DayStatus::Completed => ("완료", "성공 패턴 강화 방안"),
        DayStatus::Skipped => ("건너뜀", "실패 패턴 개선 방안"),
    };
    let reasons_line = if failure_reasons.is_empty() {
        String::new()
    } else {
        format!("- 실패 이유: {}\n", failure_reasons.join(", "))
    };
    format!(
        "사용자 맥락 정보:\n\
         - 루틴: \"{routine_title}\"\n\
         - 최근 7일 성공률: {rate}%\n\
         - 주요 실패 이유: {common}\n\
         - 현재 연속 성공: {streak}일\n\
         \n\
         오늘 상황:\n\
         - 완료 상태: {status_label}\n\
         - 사용자 소감: \"{reflection}\"\n\
         {reasons_line}\
         \n\
         개인화된 코칭 지침:\n\
         1. 사용자의 과거 패턴을 참고하여 맞춤형 조언\n\
         2. {focus}\n\
         3. 구체적이고 실행 가능한 제안\n\
         4. 감정적 지지와 격려\n\
         5. 150자 내외로 따뜻하고 개인적인 톤\n\
         \n\
         응답:",
        rate = context.recent_success_rate,
        common = context.common_failures.join(", "),
        streak = context.current_streak,
    )
}

/// Day-specific history that turns a chat prompt into a reflection prompt.
#[derive(Debug, Clone, Copy)]
pub struct HistoricalContext<'a> {
    pub context: &'a UserContext,
    pub completion: DayStatus,
    pub failure_reasons: &'a [String],
}

pub fn build_prompt(
    goal_title: &str,
    user_message: &str,
    history: Option<HistoricalContext<'_>>,
) -> String {
    match history {
        None => build_chat_prompt(goal_title, user_message),
        Some(h) => build_reflection_prompt(
            goal_title,
            h.context,
            h.completion,
            user_message,
            h.failure_reasons,
        ),
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: WireGenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl From<&GenerationConfig> for WireGenerationConfig {
    fn from(c: &GenerationConfig) -> Self {
        Self {
            temperature: c.temperature,
            top_k: c.top_k,
            top_p: c.top_p,
            max_output_tokens: c.max_output_tokens,
        }
    }
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// Map a non-success response to a [`CoachError`].
fn classify_failure(status: u16, body: &str) -> CoachError {
    let error = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .unwrap_or_default();

    if error.message.contains("API key expired") {
        return CoachError::ExpiredCredential;
    }
    if error.message.contains("API key not valid")
        || error
            .details
            .iter()
            .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
    {
        return CoachError::InvalidCredential;
    }
    if status == 429 || (500..600).contains(&status) {
        return CoachError::NetworkFailure(format!("HTTP {status}"));
    }
    let message = if error.message.is_empty() {
        format!("HTTP {status}")
    } else {
        error.message
    };
    CoachError::UnknownProviderError(message)
}

fn first_candidate_text(body: &str) -> Option<String> {
    let parsed: GenerateResponse = serde_json::from_str(body).ok()?;
    parsed
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text
        .filter(|t| !t.is_empty())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct CoachClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl CoachClient {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Self {
        let client = match reqwest::blocking::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    timeout_secs = timeout.as_secs(),
                    "coach client builder failed, using defaults without the configured timeout"
                );
                reqwest::blocking::Client::new()
            }
        };
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send one prompt and return the first candidate's text.
    pub fn send_and_parse(
        &self,
        prompt: &str,
        api_key: &str,
        config: &GenerationConfig,
    ) -> std::result::Result<String, CoachError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: config.into(),
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "coach request");
        let res = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .map_err(|e| CoachError::NetworkFailure(e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .map_err(|e| CoachError::NetworkFailure(e.to_string()))?;

        if !status.is_success() {
            let err = classify_failure(status.as_u16(), &text);
            tracing::warn!(status = status.as_u16(), error = %err, "coach request failed");
            return Err(err);
        }

        first_candidate_text(&text).ok_or(CoachError::EmptyResponse)
    }

    /// Check a key before storing it: a length check, then one minimal request.
    pub fn validate_api_key(&self, key: &str) -> std::result::Result<(), CoachError> {
        let key = key.trim();
        check_key_format(key)?;
        self.send_and_parse("Hello", key, &GenerationConfig::chat())
            .map(|_| ())
            .map_err(|e| {
                tracing::warn!(error = %e, "API key validation failed");
                CoachError::InvalidCredential
            })
    }
}

/// The offline part of key validation.
pub fn check_key_format(key: &str) -> std::result::Result<(), CoachError> {
    if key.trim().chars().count() < MIN_API_KEY_LEN {
        return Err(CoachError::Validation(format!(
            "API key must be at least {MIN_API_KEY_LEN} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Consecutive key failures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyVerdict {
    Success,
    /// Credential failure below the threshold; the user may try again.
    Retry,
    /// Credential failures reached the threshold; the key must be replaced.
    ReplaceKey,
    /// A non-credential failure; surfaced as is.
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFailureTracker {
    threshold: u32,
    consecutive: u32,
}

impl KeyFailureTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive: 0,
        }
    }

    /// Restore the persisted count. Unreadable values count as zero.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, threshold: u32) -> Self {
        let consecutive = store
            .get(keys::KEY_FAILURES)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        Self {
            threshold,
            consecutive,
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        if self.consecutive == 0 {
            store.remove(keys::KEY_FAILURES)
        } else {
            store.set(keys::KEY_FAILURES, &self.consecutive.to_string())
        }
    }

    /// Forget every recorded failure, e.g. after the key is replaced.
    pub fn clear<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<()> {
        store.remove(keys::KEY_FAILURES)
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// The key already failed `threshold` times in a row and must be replaced
    /// before any further request is sent.
    pub fn is_exhausted(&self) -> bool {
        self.threshold > 0 && self.consecutive >= self.threshold
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }

    pub fn record<T>(&mut self, result: &std::result::Result<T, CoachError>) -> KeyVerdict {
        match result {
            Ok(_) => {
                self.consecutive = 0;
                KeyVerdict::Success
            }
            Err(e) if e.is_credential() => {
                self.consecutive += 1;
                if self.consecutive >= self.threshold {
                    KeyVerdict::ReplaceKey
                } else {
                    KeyVerdict::Retry
                }
            }
            Err(_) => KeyVerdict::Surface,
        }
    }
}

// ---------------------------------------------------------------------------
// Store-backed call
// ---------------------------------------------------------------------------

pub fn stored_api_key<S: KeyValueStore + ?Sized>(store: &S) -> Option<String> {
    store
        .get(keys::API_KEY)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// The key to send with, or why no request may be made.
///
/// Fails with [`RoutineError::MissingApiKey`] when no key is stored and with
/// [`CoachError::ReplaceCredential`] once the key is exhausted, so a dead key
/// is never sent again until it is replaced.
pub fn begin_call<S: KeyValueStore + ?Sized>(store: &S, threshold: u32) -> Result<String> {
    let api_key = stored_api_key(store).ok_or(RoutineError::MissingApiKey)?;
    if KeyFailureTracker::load(store, threshold).is_exhausted() {
        tracing::warn!(threshold, "API key exhausted, not sending");
        return Err(CoachError::ReplaceCredential.into());
    }
    Ok(api_key)
}

/// Record the outcome of a call started with [`begin_call`].
///
/// The count is reloaded from the store so a call finished after the store
/// was released sees updates made in between.
pub fn finish_call<S: KeyValueStore + ?Sized>(
    store: &mut S,
    threshold: u32,
    result: std::result::Result<String, CoachError>,
) -> Result<String> {
    let mut tracker = KeyFailureTracker::load(store, threshold);
    let verdict = tracker.record(&result);
    tracker.save(store)?;
    match (verdict, result) {
        (KeyVerdict::ReplaceKey, _) => Err(CoachError::ReplaceCredential.into()),
        (_, Ok(text)) => Ok(text),
        (_, Err(e)) => Err(e.into()),
    }
}

/// Call the coach with the stored key, updating the persisted failure count.
///
/// Reaching the threshold turns the credential error into
/// [`CoachError::ReplaceCredential`], and every later call fails the same way
/// without a request until the key is replaced.
pub fn ask<S: KeyValueStore + ?Sized>(
    store: &mut S,
    client: &CoachClient,
    threshold: u32,
    prompt: &str,
    config: &GenerationConfig,
) -> Result<String> {
    let api_key = begin_call(store, threshold)?;
    let result = client.send_and_parse(prompt, &api_key, config);
    finish_call(store, threshold, result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
