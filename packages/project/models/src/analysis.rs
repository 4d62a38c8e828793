//! Structured output of the legislation parser.
//!
//! Field names are Portuguese because they are the JSON contract the LLM
//! is asked to fill in.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Semantic metadata extracted from a bill's full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegislationAnalysis {
    /// Plain-language summary of the bill.
    pub resumo: String,
    /// Stated justification for the bill.
    pub justificativa: String,
    /// Quotes from the original text backing each summary point.
    pub evidencias: Vec<Evidence>,
    /// Policy areas the bill touches.
    pub categorias: Vec<Category>,
}

/// A summary point paired with the passage that supports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// The summary point being justified.
    pub ponto_resumo: String,
    /// Verbatim citation from the bill text.
    pub citacao_original: String,
}

/// Closed set of policy categories a bill can be tagged with.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Category {
    #[serde(rename = "Saúde")]
    #[strum(serialize = "Saúde")]
    Saude,
    #[serde(rename = "Educação")]
    #[strum(serialize = "Educação")]
    Educacao,
    #[serde(rename = "Transporte")]
    #[strum(serialize = "Transporte")]
    Transporte,
    #[serde(rename = "Meio Ambiente")]
    #[strum(serialize = "Meio Ambiente")]
    MeioAmbiente,
    #[serde(rename = "Urbanismo")]
    #[strum(serialize = "Urbanismo")]
    Urbanismo,
    #[serde(rename = "Assistência Social")]
    #[strum(serialize = "Assistência Social")]
    AssistenciaSocial,
    #[serde(rename = "Tecnologia")]
    #[strum(serialize = "Tecnologia")]
    Tecnologia,
    #[serde(rename = "Segurança")]
    #[strum(serialize = "Segurança")]
    Seguranca,
    #[serde(rename = "Finanças")]
    #[strum(serialize = "Finanças")]
    Financas,
}

impl Category {
    /// Every category, in the order the schema lists them.
    pub const ALL: &[Self] = &[
        Self::Saude,
        Self::Educacao,
        Self::Transporte,
        Self::MeioAmbiente,
        Self::Urbanismo,
        Self::AssistenciaSocial,
        Self::Tecnologia,
        Self::Seguranca,
        Self::Financas,
    ];
}
