//! Localized prompt table for the registration flow.
//!
//! Prompts are a pure function of `(PromptKey, Language)`. The exhaustive
//! match makes completeness a compile-time property: adding a key or a
//! language without covering every pair fails to build, instead of failing at
//! runtime on a missing dictionary entry.

use super::model::Language;
use super::state::RegistrationStep;

/// Every message the flow can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKey {
    /// Shown with the inline language keyboard.
    LanguagePicker,
    /// Greeting + name question, sent right after the language is chosen.
    AskName,
    AskAge,
    AskGender,
    AskInterests,
    AskBio,
    AskPhoto,
    ProfileSaved,
    InvalidAge,
    SaveFailed,
}

impl PromptKey {
    pub const ALL: [PromptKey; 10] = [
        PromptKey::LanguagePicker,
        PromptKey::AskName,
        PromptKey::AskAge,
        PromptKey::AskGender,
        PromptKey::AskInterests,
        PromptKey::AskBio,
        PromptKey::AskPhoto,
        PromptKey::ProfileSaved,
        PromptKey::InvalidAge,
        PromptKey::SaveFailed,
    ];
}

/// The prompt sent when *entering* a step, asking for that step's field.
/// `Idle` prompts nothing.
pub fn ask_for(step: RegistrationStep) -> Option<PromptKey> {
    match step {
        RegistrationStep::Idle => None,
        RegistrationStep::AwaitingLanguage => Some(PromptKey::LanguagePicker),
        RegistrationStep::AwaitingName => Some(PromptKey::AskName),
        RegistrationStep::AwaitingAge => Some(PromptKey::AskAge),
        RegistrationStep::AwaitingGender => Some(PromptKey::AskGender),
        RegistrationStep::AwaitingInterests => Some(PromptKey::AskInterests),
        RegistrationStep::AwaitingBio => Some(PromptKey::AskBio),
        RegistrationStep::AwaitingPhoto => Some(PromptKey::AskPhoto),
    }
}

/// Render a prompt in the given language.
pub fn prompt(key: PromptKey, lang: Language) -> &'static str {
    use Language::*;
    use PromptKey::*;
    match (key, lang) {
        (LanguagePicker, En) => "Choose your language / 选择语言 / Выберите язык",
        (LanguagePicker, Ru) => "Выбери язык / Choose language / 选择语言",
        (LanguagePicker, Zh) => "选择语言 / Choose language / Выберите язык",

        (AskName, En) => "👋 Welcome! Let's create your profile. What's your name?",
        (AskName, Ru) => "👋 Добро пожаловать! Давай создадим твою анкету. Как тебя зовут?",
        (AskName, Zh) => "👋 欢迎！让我们创建你的资料。你叫什么名字？",

        (AskAge, En) => "Nice! How old are you?",
        (AskAge, Ru) => "Отлично! Сколько тебе лет?",
        (AskAge, Zh) => "很好！你几岁？",

        (AskGender, En) => "What is your gender? (e.g. Male, Female, Other)",
        (AskGender, Ru) => "Какой у тебя пол? (например: Мужской, Женский, Другое)",
        (AskGender, Zh) => "你的性别是？（例如：男，女，其他）",

        (AskInterests, En) => "List a few interests (comma separated):",
        (AskInterests, Ru) => "Напиши несколько интересов через запятую:",
        (AskInterests, Zh) => "列出一些兴趣（用逗号分隔）：",

        (AskBio, En) => "Write a short bio about yourself:",
        (AskBio, Ru) => "Кратко расскажи о себе:",
        (AskBio, Zh) => "简单介绍一下你自己：",

        (AskPhoto, En) => "📷 Please send a photo for your profile:",
        (AskPhoto, Ru) => "📷 Пришли фото для анкеты:",
        (AskPhoto, Zh) => "📷 请发送一张照片作为你的头像：",

        (ProfileSaved, En) => {
            "✅ Your profile has been created! Soon you'll be able to browse others."
        }
        (ProfileSaved, Ru) => "✅ Твоя анкета сохранена! Скоро ты сможешь смотреть других.",
        (ProfileSaved, Zh) => "✅ 你的资料已创建！很快你将可以浏览他人。",

        (InvalidAge, En) => "Please enter a number.",
        (InvalidAge, Ru) => "Пожалуйста, введи число.",
        (InvalidAge, Zh) => "请输入一个数字。",

        (SaveFailed, En) => "⚠️ Couldn't save your profile. Please send the photo again.",
        (SaveFailed, Ru) => "⚠️ Не удалось сохранить анкету. Пришли фото ещё раз.",
        (SaveFailed, Zh) => "⚠️ 无法保存你的资料，请再发送一次照片。",
    }
}
