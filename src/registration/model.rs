//! Profile data models — language, in-progress draft, and the durable record.

use serde::{Deserialize, Serialize};

/// Language the user picked at the start of registration.
///
/// Every prompt the bot sends after the picker is rendered in this language,
/// and the choice is persisted with the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    En,
    Ru,
    Zh,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Ru, Language::Zh];

    /// Two-letter code stored in the `lang` column.
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
            Self::Zh => "zh",
        }
    }

    /// Parse a two-letter code (as stored, or as the tail of a callback token).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Self::En),
            "ru" => Some(Self::Ru),
            "zh" => Some(Self::Zh),
            _ => None,
        }
    }

    /// Parse an inline-keyboard callback token of the form `lang_<code>`.
    pub fn from_callback_token(token: &str) -> Option<Self> {
        token.strip_prefix("lang_").and_then(Self::from_code)
    }

    /// Callback token attached to this language's picker button.
    pub fn callback_token(&self) -> String {
        format!("lang_{}", self.code())
    }

    /// Button label shown on the language picker, in the language itself.
    pub fn label(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Ru => "Русский",
            Self::Zh => "中文",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::En
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A finalize attempt found a required field missing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required field: {0}")]
pub struct IncompleteDraft(pub &'static str);

/// Fields collected so far during a registration conversation.
///
/// Lives only in memory, inside the user's `ConversationState`. Each step of
/// the flow fills exactly one field; `finalize` refuses to produce a record
/// until all of them are present.
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
    pub language: Option<Language>,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub interests: Option<String>,
    pub bio: Option<String>,
}

impl ProfileDraft {
    /// Language for rendering prompts; English until the user has picked.
    pub fn lang(&self) -> Language {
        self.language.unwrap_or_default()
    }

    /// Assemble the durable record. Errors name the first missing field.
    pub fn finalize(
        &self,
        user_id: i64,
        photo_ref: String,
    ) -> std::result::Result<ProfileRecord, IncompleteDraft> {
        Ok(ProfileRecord {
            user_id,
            language: self.language.ok_or(IncompleteDraft("language"))?,
            name: self.name.clone().ok_or(IncompleteDraft("name"))?,
            age: self.age.ok_or(IncompleteDraft("age"))?,
            gender: self.gender.clone().ok_or(IncompleteDraft("gender"))?,
            interests: self.interests.clone().ok_or(IncompleteDraft("interests"))?,
            bio: self.bio.clone().ok_or(IncompleteDraft("bio"))?,
            photo_ref,
        })
    }
}

/// A completed user profile, one per user, keyed by the Telegram user id.
///
/// The controller guarantees every field is filled before the record reaches
/// the store; the store never sees a partial profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub user_id: i64,
    pub name: String,
    pub age: u32,
    pub gender: String,
    /// Comma-delimited free-form text, stored verbatim.
    pub interests: String,
    pub bio: String,
    /// Telegram file id of the profile photo.
    pub photo_ref: String,
    pub language: Language,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_draft() -> ProfileDraft {
        ProfileDraft {
            language: Some(Language::En),
            name: Some("Alice".to_string()),
            age: Some(29),
            gender: Some("Female".to_string()),
            interests: Some("reading, chess".to_string()),
            bio: Some("hello".to_string()),
        }
    }

    #[test]
    fn language_code_roundtrip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
        assert_eq!(Language::from_code("de"), None);
        assert_eq!(Language::from_code(""), None);
    }

    #[test]
    fn language_callback_token_roundtrip() {
        for lang in Language::ALL {
            assert_eq!(
                Language::from_callback_token(&lang.callback_token()),
                Some(lang)
            );
        }
        assert_eq!(Language::from_callback_token("lang_de"), None);
        assert_eq!(Language::from_callback_token("en"), None);
        assert_eq!(Language::from_callback_token("other_en"), None);
    }

    #[test]
    fn language_display_matches_serde() {
        for lang in Language::ALL {
            let json = serde_json::to_string(&lang).unwrap();
            assert_eq!(format!("\"{lang}\""), json);
        }
    }

    #[test]
    fn finalize_complete_draft() {
        let record = full_draft().finalize(42, "photo-file-id".to_string()).unwrap();
        assert_eq!(record.user_id, 42);
        assert_eq!(record.name, "Alice");
        assert_eq!(record.age, 29);
        assert_eq!(record.gender, "Female");
        assert_eq!(record.interests, "reading, chess");
        assert_eq!(record.bio, "hello");
        assert_eq!(record.photo_ref, "photo-file-id");
        assert_eq!(record.language, Language::En);
    }

    #[test]
    fn finalize_names_first_missing_field() {
        let mut draft = full_draft();
        draft.age = None;
        let err = draft.finalize(1, "p".to_string()).unwrap_err();
        assert_eq!(err, IncompleteDraft("age"));

        let empty = ProfileDraft::default();
        let err = empty.finalize(1, "p".to_string()).unwrap_err();
        assert_eq!(err, IncompleteDraft("language"));
    }

    #[test]
    fn draft_lang_defaults_to_english() {
        let draft = ProfileDraft::default();
        assert_eq!(draft.lang(), Language::En);

        let mut draft = ProfileDraft::default();
        draft.language = Some(Language::Zh);
        assert_eq!(draft.lang(), Language::Zh);
    }

    #[test]
    fn record_serde_roundtrip() {
        let record = full_draft().finalize(7, "file_abc".to_string()).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        let parsed: ProfileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
        assert!(json.contains("\"en\""));
    }
}
