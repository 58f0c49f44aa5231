//! Student admission number

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

use crate::error::AppError;

/// Two digits, two letters, three digits (e.g. `24CS094`).
pub static ADMISSION_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}[A-Za-z]{2}\d{3}$").expect("valid admission number regex"));

/// Admission number, always stored uppercased
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "24CS094")]
pub struct AdmissionNumber(String);

impl AdmissionNumber {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("Admission number is required".to_string()));
        }
        if !ADMISSION_NUMBER_RE.is_match(trimmed) {
            return Err(AppError::Validation(
                "Invalid admission number format. Expected format: XXAA000 (2 digits, 2 letters, 3 digits)"
                    .to_string(),
            ));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AdmissionNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AdmissionNumber {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).map_err(|e| e.to_string())
    }
}

impl From<AdmissionNumber> for String {
    fn from(number: AdmissionNumber) -> Self {
        number.0
    }
}

impl sqlx::Type<Postgres> for AdmissionNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for AdmissionNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        Ok(Self(s))
    }
}

impl Encode<'_, Postgres> for AdmissionNumber {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.0.as_str(), buf)
    }
}
