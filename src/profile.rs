use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The persona the advisor tailors its answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Student,
    Professional,
    Retiree,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Student, Profile::Professional, Profile::Retiree];

    /// Literal tag embedded in the advisor's instructions.
    pub fn tag(&self) -> &'static str {
        match self {
            Profile::Student => "student",
            Profile::Professional => "working professional",
            Profile::Retiree => "retiree",
        }
    }

    /// Quick-reply prompts offered after the first exchange.
    pub fn suggested_prompts(&self) -> [&'static str; 3] {
        match self {
            Profile::Student => [
                "How can I build a budget on a student income?",
                "What should I know about paying off student loans?",
                "How do I start saving with very little money?",
            ],
            Profile::Professional => [
                "How much of my salary should I be saving each month?",
                "Which tax-advantaged accounts should I use?",
                "How should I start investing for the long term?",
            ],
            Profile::Retiree => [
                "How can I make my retirement savings last?",
                "What are tax-efficient ways to withdraw from my accounts?",
                "How should my investments change in retirement?",
            ],
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Profile::Student),
            "professional" | "working professional" | "working_professional" => {
                Ok(Profile::Professional)
            }
            "retiree" | "retired" => Ok(Profile::Retiree),
            other => Err(format!(
                "Unknown profile '{}': expected student, professional or retiree",
                other
            )),
        }
    }
}
