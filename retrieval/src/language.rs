//! Language detection for the lexical retriever.
//!
//! Languages are exchanged as lowercase ISO 639-1 codes (`"it"`, `"en"`).

use crate::error::{Result, SearchError};
use lingua::{IsoCode639_1, Language, LanguageDetectorBuilder};
use log::debug;
use std::str::FromStr;

/// Languages the lexical engine can stem and strip stopwords for
pub const LEXICAL_LANGUAGES: &[&str] = &[
    "ar", "da", "de", "el", "en", "es", "fr", "hu", "it", "nl", "pt", "ro", "ru", "sv", "tr",
];

/// Detects the dominant language of a text
pub trait LanguageDetector: Send + Sync {
    /// ISO 639-1 code of the most likely language, `None` when undecidable
    fn detect(&self, text: &str) -> Option<String>;
}

/// Normalize and check a language code against [`LEXICAL_LANGUAGES`]
pub fn normalize_code(code: &str) -> Result<String> {
    let code = code.trim().to_lowercase();
    if LEXICAL_LANGUAGES.contains(&code.as_str()) {
        Ok(code)
    } else {
        Err(SearchError::UnsupportedLanguage(code))
    }
}

/// Statistical detector restricted to a candidate language set
pub struct LinguaDetector {
    detector: Option<lingua::LanguageDetector>,
    only: Option<String>,
}

impl LinguaDetector {
    pub fn new(candidates: &[String]) -> Result<Self> {
        let mut codes = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let code = normalize_code(candidate)?;
            if !codes.contains(&code) {
                codes.push(code);
            }
        }

        match codes.len() {
            0 => Err(SearchError::InvalidConfig(
                "at least one candidate language is required".to_string(),
            )),
            1 => Ok(Self {
                detector: None,
                only: codes.pop(),
            }),
            _ => {
                let languages = codes
                    .iter()
                    .map(|code| to_lingua(code))
                    .collect::<Result<Vec<_>>>()?;
                debug!("Language detector candidates: {codes:?}");
                Ok(Self {
                    detector: Some(LanguageDetectorBuilder::from_languages(&languages).build()),
                    only: None,
                })
            }
        }
    }
}

impl LanguageDetector for LinguaDetector {
    fn detect(&self, text: &str) -> Option<String> {
        if let Some(code) = &self.only {
            return Some(code.clone());
        }
        self.detector
            .as_ref()?
            .detect_language_of(text)
            .map(|language| language.iso_code_639_1().to_string().to_lowercase())
    }
}

/// Detector that always answers with one language
#[derive(Debug, Clone)]
pub struct FixedLanguage(String);

impl FixedLanguage {
    pub fn new(code: &str) -> Result<Self> {
        Ok(Self(normalize_code(code)?))
    }
}

impl LanguageDetector for FixedLanguage {
    fn detect(&self, _text: &str) -> Option<String> {
        Some(self.0.clone())
    }
}

fn to_lingua(code: &str) -> Result<Language> {
    let iso = IsoCode639_1::from_str(code)
        .map_err(|_| SearchError::UnsupportedLanguage(code.to_string()))?;
    Ok(Language::from_iso_code_639_1(&iso))
}

/// The lexical engine's language for an ISO 639-1 code
pub(crate) fn to_bm25(code: &str) -> Result<bm25::Language> {
    let language = match code {
        "ar" => bm25::Language::Arabic,
        "da" => bm25::Language::Danish,
        "de" => bm25::Language::German,
        "el" => bm25::Language::Greek,
        "en" => bm25::Language::English,
        "es" => bm25::Language::Spanish,
        "fr" => bm25::Language::French,
        "hu" => bm25::Language::Hungarian,
        "it" => bm25::Language::Italian,
        "nl" => bm25::Language::Dutch,
        "pt" => bm25::Language::Portuguese,
        "ro" => bm25::Language::Romanian,
        "ru" => bm25::Language::Russian,
        "sv" => bm25::Language::Swedish,
        "tr" => bm25::Language::Turkish,
        other => return Err(SearchError::UnsupportedLanguage(other.to_string())),
    };
    Ok(language)
}
