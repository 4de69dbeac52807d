use std::fmt;

use serde::Deserialize;
use tracing::warn;

use crate::error::FeedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Accepts our own names and the classifier's raw labels, ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" | "label_2" => Some(Self::Positive),
            "negative" | "label_0" => Some(Self::Negative),
            "neutral" | "label_1" => Some(Self::Neutral),
            _ => None,
        }
    }

    /// Like `from_label`, but unknown labels become `Neutral`.
    pub fn from_label_lenient(label: &str) -> Self {
        Self::from_label(label).unwrap_or_else(|| {
            warn!(label, "unknown sentiment label; treating as neutral");
            Self::Neutral
        })
    }

    /// Emotion labels the analysis backend attaches to each sentiment.
    pub fn emotions(self) -> &'static [&'static str] {
        match self {
            Self::Positive => &["happy", "joyful", "excited"],
            Self::Negative => &["angry", "sad", "frustrated"],
            Self::Neutral => &["calm", "neutral", "composed"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classification result from the analysis backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentSignal {
    pub sentiment: Sentiment,
    /// Always finite and in [0, 1].
    pub score: f64,
    /// Descriptive labels, displayed but not used by the engine.
    pub emotions: Vec<String>,
}

impl SentimentSignal {
    pub fn new(sentiment: Sentiment, score: f64, emotions: Vec<String>) -> Self {
        Self {
            sentiment,
            score: Self::normalize_score(score),
            emotions,
        }
    }

    /// Build from an untrusted label; unknown labels fall back to neutral.
    pub fn from_parts(label: &str, score: f64, emotions: Vec<String>) -> Self {
        Self::new(Sentiment::from_label_lenient(label), score, emotions)
    }

    /// NaN and infinities become the undecided midpoint; the rest clamp to [0, 1].
    pub fn normalize_score(score: f64) -> f64 {
        if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.5
        }
    }

    /// Parse one line of the feed. `line` is 1-based and only used for errors.
    pub fn parse_json(text: &str, line: usize) -> Result<Self, FeedError> {
        let wire: WireMessage =
            serde_json::from_str(text).map_err(|source| FeedError::Parse { line, source })?;
        Ok(wire.into_payload().into())
    }
}

impl Default for SentimentSignal {
    fn default() -> Self {
        Self::new(Sentiment::Neutral, 0.5, vec!["neutral".to_string()])
    }
}

/// Either a bare result object or the backend's `{"data": {...}}` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireMessage {
    Envelope { data: WirePayload },
    Bare(WirePayload),
}

impl WireMessage {
    fn into_payload(self) -> WirePayload {
        match self {
            Self::Envelope { data } => data,
            Self::Bare(payload) => payload,
        }
    }
}

/// Missing fields take the values the frontend substitutes for an absent result.
#[derive(Deserialize)]
struct WirePayload {
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default, alias = "score")]
    sentiment_score: Option<f64>,
    #[serde(default)]
    emotions: Option<Vec<String>>,
}

impl From<WirePayload> for SentimentSignal {
    fn from(p: WirePayload) -> Self {
        let fallback = SentimentSignal::default();
        let sentiment = p
            .sentiment
            .as_deref()
            .map(Sentiment::from_label_lenient)
            .unwrap_or(fallback.sentiment);
        SentimentSignal::new(
            sentiment,
            p.sentiment_score.unwrap_or(fallback.score),
            p.emotions.unwrap_or(fallback.emotions),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Sentiment::from_label("positive"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::from_label("NEGATIVE"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::from_label(" Neutral "), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::from_label("LABEL_0"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::from_label("LABEL_1"), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::from_label("label_2"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::from_label("ecstatic"), None);
    }

    #[test]
    fn test_unknown_label_falls_back_to_neutral() {
        let s = SentimentSignal::from_parts("furious", 0.9, vec![]);
        assert_eq!(s.sentiment, Sentiment::Neutral);
        assert_eq!(s.score, 0.9);
    }

    #[test]
    fn test_score_normalization() {
        assert_eq!(SentimentSignal::new(Sentiment::Positive, 1.7, vec![]).score, 1.0);
        assert_eq!(SentimentSignal::new(Sentiment::Positive, -0.2, vec![]).score, 0.0);
        assert_eq!(SentimentSignal::new(Sentiment::Positive, f64::NAN, vec![]).score, 0.5);
        assert_eq!(SentimentSignal::new(Sentiment::Positive, f64::INFINITY, vec![]).score, 0.5);
    }

    #[test]
    fn test_parse_backend_response() {
        let line = r#"{"sentiment":"positive","sentiment_score":0.93,"keywords":["sun"],"emotions":["happy","joyful","excited"]}"#;
        let s = SentimentSignal::parse_json(line, 1).unwrap();
        assert_eq!(s.sentiment, Sentiment::Positive);
        assert_eq!(s.score, 0.93);
        assert_eq!(s.emotions, vec!["happy", "joyful", "excited"]);
    }

    #[test]
    fn test_parse_envelope_and_score_alias() {
        let line = r#"{"result":"...","data":{"sentiment":"LABEL_0","score":0.2}}"#;
        let s = SentimentSignal::parse_json(line, 3).unwrap();
        assert_eq!(s.sentiment, Sentiment::Negative);
        assert_eq!(s.score, 0.2);
        assert_eq!(s.emotions, vec!["neutral"], "missing emotions default to [neutral]");
    }

    #[test]
    fn test_parse_missing_fields_use_defaults() {
        let s = SentimentSignal::parse_json("{}", 1).unwrap();
        assert_eq!(s, SentimentSignal::default());
    }

    #[test]
    fn test_parse_error_carries_line() {
        let err = SentimentSignal::parse_json("{not json", 7).unwrap_err();
        match err {
            FeedError::Parse { line, .. } => assert_eq!(line, 7),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_wrong_type_is_error() {
        assert!(SentimentSignal::parse_json(r#"{"sentiment_score":"high"}"#, 1).is_err());
    }
}
