use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

pub use strum::IntoEnumIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Lenient parse for form input. Empty or unknown values yield `None`.
    pub fn parse_form(value: &str) -> Option<Self> {
        Gender::from_str(value.trim()).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: String,
    pub age: String,
    pub gender: Option<Gender>,
    pub id: String,
}

impl PatientInfo {
    pub fn new(name: &str, age: &str, gender: Option<Gender>, id: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            age: age.trim().to_string(),
            gender,
            id: id.trim().to_string(),
        }
    }

    /// Builds patient data from raw form strings, as both front ends collect them.
    pub fn from_form(name: &str, age: &str, gender: &str, id: &str) -> Self {
        Self::new(name, age, Gender::parse_form(gender), id)
    }

    /// Names of the fields that are empty, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.age.trim().is_empty() {
            missing.push("age");
        }
        if self.gender.is_none() {
            missing.push("gender");
        }
        if self.id.trim().is_empty() {
            missing.push("id");
        }
        missing
    }

    pub fn gender_label(&self) -> String {
        self.gender.map(|g| g.to_string()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: String,
    pub confidence: String,
    pub patient: PatientInfo,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub simulated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
