use serde::{Deserialize, Serialize};

/// Languages the service can answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ja")]
    Japanese,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Korean => "ko",
            Language::English => "en",
            Language::Japanese => "ja",
        }
    }

    pub fn eng_name(self) -> &'static str {
        match self {
            Language::Korean => "Korean",
            Language::English => "English",
            Language::Japanese => "Japanese",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "ko" => Some(Language::Korean),
            "en" => Some(Language::English),
            "ja" => Some(Language::Japanese),
            _ => None,
        }
    }

    /// Maps an IETF tag such as `ko-KR` or `en_US` by its primary subtag.
    pub fn from_ietf_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?;
        Self::from_code(primary)
    }

    /// Locale inference for a browser tag: ko and ja are recognised, everything else is English.
    pub fn infer_from_locale(tag: &str) -> Self {
        Self::from_ietf_tag(tag).unwrap_or(Language::English)
    }

    /// Picks the highest weighted supported language from an `Accept-Language` header.
    /// A missing or empty header keeps the service default (Korean).
    pub fn from_accept_language(header: Option<&str>) -> Self {
        let Some(header) = header.map(str::trim).filter(|value| !value.is_empty()) else {
            return Language::default();
        };

        let mut best: Option<(f32, usize, Language)> = None;
        for (index, entry) in header.split(',').enumerate() {
            let mut pieces = entry.split(';');
            let tag = pieces.next().unwrap_or("").trim();
            let weight = pieces
                .filter_map(|param| param.trim().strip_prefix("q="))
                .find_map(|value| value.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            if weight <= 0.0 {
                continue;
            }
            let Some(language) = Self::from_ietf_tag(tag) else {
                continue;
            };
            let better = match best {
                Some((best_weight, best_index, _)) => {
                    weight > best_weight || (weight == best_weight && index < best_index)
                }
                None => true,
            };
            if better {
                best = Some((weight, index, language));
            }
        }

        best.map(|(_, _, language)| language)
            .unwrap_or(Language::English)
    }
}

/// The session's language setting, passed explicitly instead of living in ambient state.
///
/// Initialized once from a stored preference or the inferred locale, changed
/// only through [`LanguagePreference::set`], read everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguagePreference {
    language: Language,
}

impl LanguagePreference {
    pub fn initialize(stored: Option<&str>, locale: &str) -> Self {
        let language = stored
            .and_then(Language::from_code)
            .unwrap_or_else(|| Language::infer_from_locale(locale));
        LanguagePreference { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Returns the code to persist for the next session.
    pub fn set(&mut self, language: Language) -> &'static str {
        self.language = language;
        language.code()
    }
}

impl Default for LanguagePreference {
    fn default() -> Self {
        LanguagePreference {
            language: Language::default(),
        }
    }
}
