use sea_orm::entity::prelude::*;
use sea_orm::{ActiveEnum, Iterable};

/// Registry of the languages a phrase or comment can be written in.
///
/// Stored inline as the short code (2-3 characters) on every row that
/// references a language, so there is no separate languages table.
/// `Jp` exists next to `Ja` because older clients still send `jp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(3))")]
pub enum Language {
    #[sea_orm(string_value = "ar")]
    Ar,
    #[sea_orm(string_value = "bg")]
    Bg,
    #[sea_orm(string_value = "bn")]
    Bn,
    #[sea_orm(string_value = "bs")]
    Bs,
    #[sea_orm(string_value = "cs")]
    Cs,
    #[sea_orm(string_value = "da")]
    Da,
    #[sea_orm(string_value = "de")]
    De,
    #[sea_orm(string_value = "dk")]
    Dk,
    #[sea_orm(string_value = "el")]
    El,
    #[sea_orm(string_value = "en")]
    En,
    #[sea_orm(string_value = "es")]
    Es,
    #[sea_orm(string_value = "et")]
    Et,
    #[sea_orm(string_value = "fa")]
    Fa,
    #[sea_orm(string_value = "fi")]
    Fi,
    #[sea_orm(string_value = "fil")]
    Fil,
    #[sea_orm(string_value = "fr")]
    Fr,
    #[sea_orm(string_value = "ga")]
    Ga,
    #[sea_orm(string_value = "he")]
    He,
    #[sea_orm(string_value = "hi")]
    Hi,
    #[sea_orm(string_value = "hr")]
    Hr,
    #[sea_orm(string_value = "hu")]
    Hu,
    #[sea_orm(string_value = "hy")]
    Hy,
    #[sea_orm(string_value = "id")]
    Id,
    #[sea_orm(string_value = "it")]
    It,
    #[sea_orm(string_value = "ja")]
    Ja,
    #[sea_orm(string_value = "jp")]
    Jp,
    #[sea_orm(string_value = "ka")]
    Ka,
    #[sea_orm(string_value = "ko")]
    Ko,
    #[sea_orm(string_value = "la")]
    La,
    #[sea_orm(string_value = "lb")]
    Lb,
    #[sea_orm(string_value = "lt")]
    Lt,
    #[sea_orm(string_value = "lv")]
    Lv,
    #[sea_orm(string_value = "mt")]
    Mt,
    #[sea_orm(string_value = "ne")]
    Ne,
    #[sea_orm(string_value = "nl")]
    Nl,
    #[sea_orm(string_value = "no")]
    No,
    #[sea_orm(string_value = "or")]
    Or,
    #[sea_orm(string_value = "pl")]
    Pl,
    #[sea_orm(string_value = "pt")]
    Pt,
    #[sea_orm(string_value = "ro")]
    Ro,
    #[sea_orm(string_value = "ru")]
    Ru,
    #[sea_orm(string_value = "sk")]
    Sk,
    #[sea_orm(string_value = "sl")]
    Sl,
    #[sea_orm(string_value = "sv")]
    Sv,
    #[sea_orm(string_value = "ta")]
    Ta,
    #[sea_orm(string_value = "th")]
    Th,
    #[sea_orm(string_value = "tl")]
    Tl,
    #[sea_orm(string_value = "tr")]
    Tr,
    #[sea_orm(string_value = "tw")]
    Tw,
    #[sea_orm(string_value = "uk")]
    Uk,
    #[sea_orm(string_value = "zh")]
    Zh,
}

impl Language {
    /// Looks a language up by its code. Codes are case sensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::try_from_value(&code.to_string()).ok()
    }

    /// The code stored in the database and exchanged over the API.
    pub fn code(&self) -> String {
        self.to_value()
    }

    /// Every supported language, in declaration order.
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    /// Human readable English name.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Ar => "Arabic",
            Language::Bg => "Bulgarian",
            Language::Bn => "Bengali",
            Language::Bs => "Bosnian",
            Language::Cs => "Czech",
            Language::Da => "Danish",
            Language::De => "German",
            Language::Dk => "Danish (legacy code)",
            Language::El => "Greek",
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Et => "Estonian",
            Language::Fa => "Persian",
            Language::Fi => "Finnish",
            Language::Fil => "Filipino",
            Language::Fr => "French",
            Language::Ga => "Irish",
            Language::He => "Hebrew",
            Language::Hi => "Hindi",
            Language::Hr => "Croatian",
            Language::Hu => "Hungarian",
            Language::Hy => "Armenian",
            Language::Id => "Indonesian",
            Language::It => "Italian",
            Language::Ja => "Japanese",
            Language::Jp => "Japanese (legacy code)",
            Language::Ka => "Georgian",
            Language::Ko => "Korean",
            Language::La => "Latin",
            Language::Lb => "Luxembourgish",
            Language::Lt => "Lithuanian",
            Language::Lv => "Latvian",
            Language::Mt => "Maltese",
            Language::Ne => "Nepali",
            Language::Nl => "Dutch",
            Language::No => "Norwegian",
            Language::Or => "Odia",
            Language::Pl => "Polish",
            Language::Pt => "Portuguese",
            Language::Ro => "Romanian",
            Language::Ru => "Russian",
            Language::Sk => "Slovak",
            Language::Sl => "Slovenian",
            Language::Sv => "Swedish",
            Language::Ta => "Tamil",
            Language::Th => "Thai",
            Language::Tl => "Tagalog",
            Language::Tr => "Turkish",
            Language::Tw => "Twi",
            Language::Uk => "Ukrainian",
            Language::Zh => "Chinese",
        }
    }
}

/// Biological sex as recorded on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(7))")]
pub enum Sex {
    #[sea_orm(string_value = "men")]
    Men,
    #[sea_orm(string_value = "women")]
    Women,
    #[sea_orm(string_value = "another")]
    Another,
}

impl Sex {
    pub fn from_code(code: &str) -> Option<Self> {
        Self::try_from_value(&code.to_string()).ok()
    }

    pub fn code(&self) -> String {
        self.to_value()
    }
}
