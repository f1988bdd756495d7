use std::{borrow::Borrow, collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! token_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

token_newtype!(SessionId);
token_newtype!(QuestionId);

/// Selected answers keyed by question id. Only answered questions have an entry.
pub type AnswerMap = BTreeMap<QuestionId, LikertValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("likert value must be between 1 and 4, got {0}")]
pub struct LikertValueError(pub i64);

/// One of the four ordinal response levels. Serialized as the bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum LikertValue {
    StronglyDisagree = 1,
    Disagree = 2,
    Agree = 3,
    StronglyAgree = 4,
}

impl LikertValue {
    pub const ALL: [LikertValue; 4] = [
        LikertValue::StronglyDisagree,
        LikertValue::Disagree,
        LikertValue::Agree,
        LikertValue::StronglyAgree,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            LikertValue::StronglyDisagree => "Strongly Disagree",
            LikertValue::Disagree => "Disagree",
            LikertValue::Agree => "Agree",
            LikertValue::StronglyAgree => "Strongly Agree",
        }
    }
}

impl TryFrom<i64> for LikertValue {
    type Error = LikertValueError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(LikertValue::StronglyDisagree),
            2 => Ok(LikertValue::Disagree),
            3 => Ok(LikertValue::Agree),
            4 => Ok(LikertValue::StronglyAgree),
            other => Err(LikertValueError(other)),
        }
    }
}

impl TryFrom<u8> for LikertValue {
    type Error = LikertValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        LikertValue::try_from(i64::from(value))
    }
}

impl From<LikertValue> for u8 {
    fn from(value: LikertValue) -> Self {
        value.value()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    /// Scoring polarity hint for the remote scorer; the client never interprets it.
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub section_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondentProfile {
    pub full_name: String,
    pub email: String,
    pub gender: String,
    pub age_group: String,
}
