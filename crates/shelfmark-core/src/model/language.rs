use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::model::entity::{Entity, EntityKind, EntityRef};
use crate::model::ids::LanguageId;
use crate::schema::fields::{FieldDef, FieldKind};

macro_rules! language_codes {
    ($($(#[$attr:meta])* $variant:ident => ($code:literal, $label:literal)),+ $(,)?) => {
        /// A two-letter language tag from the catalog's fixed set.
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub enum LanguageCode {
            $($(#[$attr])* $variant,)+
        }

        impl LanguageCode {
            /// Every supported language, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// `(code, label)` pairs as persisted and displayed.
            pub const CHOICES: &'static [(&'static str, &'static str)] = &[$(($code, $label),)+];

            /// The persisted two-letter code.
            pub const fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// English name of the language.
            pub const fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl FromStr for LanguageCode {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(ValidationError::InvalidChoice {
                        field: "lang",
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

language_codes! {
    #[default]
    English => ("en", "English"),
    Afrikaans => ("af", "Afrikaans"),
    Albanian => ("sq", "Albanian"),
    Arabic => ("ar", "Arabic"),
    Basque => ("eu", "Basque"),
    Belarusian => ("be", "Belarusian"),
    Bengali => ("bn", "Bengali"),
    Bosnian => ("bs", "Bosnian"),
    Bulgarian => ("bg", "Bulgarian"),
    Burmese => ("my", "Burmese"),
    Catalan => ("ca", "Catalan"),
    Chinese => ("zh", "Chinese"),
    Croatian => ("hr", "Croatian"),
    Czech => ("cs", "Czech"),
    Danish => ("da", "Danish"),
    Dutch => ("nl", "Dutch"),
    Esperanto => ("eo", "Esperanto"),
    Estonian => ("et", "Estonian"),
    Finnish => ("fi", "Finnish"),
    French => ("fr", "French"),
    Galician => ("gl", "Galician"),
    German => ("de", "German"),
    Greek => ("el", "Greek"),
    Hebrew => ("he", "Hebrew"),
    Hindi => ("hi", "Hindi"),
    Hungarian => ("hu", "Hungarian"),
    Icelandic => ("is", "Icelandic"),
    Indonesian => ("id", "Indonesian"),
    Italian => ("it", "Italian"),
    Japanese => ("ja", "Japanese"),
    Kazakh => ("kk", "Kazakh"),
    Korean => ("ko", "Korean"),
    Latin => ("la", "Latin"),
    Latvian => ("lv", "Latvian"),
    Lithuanian => ("lt", "Lithuanian"),
    Macedonian => ("mk", "Macedonian"),
    Malay => ("ms", "Malay"),
    Maltese => ("mt", "Maltese"),
    Norwegian => ("no", "Norwegian"),
    Persian => ("fa", "Persian"),
    Polish => ("pl", "Polish"),
    Portuguese => ("pt", "Portuguese"),
    Romanian => ("ro", "Romanian"),
    Russian => ("ru", "Russian"),
    Serbian => ("sr", "Serbian"),
    Slovak => ("sk", "Slovak"),
    Slovenian => ("sl", "Slovenian"),
    Spanish => ("es", "Spanish"),
    Swahili => ("sw", "Swahili"),
    Swedish => ("sv", "Swedish"),
    Tagalog => ("tl", "Tagalog"),
    Tamil => ("ta", "Tamil"),
    Telugu => ("te", "Telugu"),
    Thai => ("th", "Thai"),
    Turkish => ("tr", "Turkish"),
    Ukrainian => ("uk", "Ukrainian"),
    Vietnamese => ("vi", "Vietnamese"),
    Welsh => ("cy", "Welsh"),
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.code().to_string()
    }
}

const ID: FieldDef = FieldDef::text("id", "ID")
    .kind(FieldKind::AutoKey)
    .primary_key();
const LANG: FieldDef = FieldDef::text("lang", "Language")
    .kind(FieldKind::Choice(LanguageCode::CHOICES))
    .max_length(2)
    .default("en")
    .help_text("Book language");

/// The language a book is written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: Option<LanguageId>,
    pub lang: LanguageCode,
}

impl Language {
    #[must_use]
    pub const fn new(lang: LanguageCode) -> Self {
        Self { id: None, lang }
    }

    /// Build a language from its persisted code, rejecting unknown codes.
    pub fn from_code(code: &str) -> Result<Self, ValidationError> {
        code.parse().map(Self::new)
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::new(LanguageCode::default())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lang)
    }
}

impl Entity for Language {
    const KIND: EntityKind = EntityKind::Language;
    const FIELDS: &'static [FieldDef] = &[ID, LANG];

    fn entity_ref(&self) -> Option<EntityRef> {
        self.id.map(EntityRef::Language)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        LANG.check_choice(self.lang.code())
    }
}
