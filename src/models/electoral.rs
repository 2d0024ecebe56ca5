// src/models/electoral.rs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Os três tipos de arquivo aceitos pela ingestão.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Elections,
    Ibge,
    Polls,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Elections => "elections",
            DataType::Ibge => "ibge",
            DataType::Polls => "polls",
        }
    }

    /// Mensagem de sucesso devolvida pelo upload.
    pub fn upload_message(self) -> &'static str {
        match self {
            DataType::Elections => "Elections data uploaded successfully",
            DataType::Ibge => "IBGE data uploaded successfully",
            DataType::Polls => "Polls data uploaded successfully",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---
// Linhas de ingestão (colunas fixas por tipo, na ordem do CSV)
// ---

/// zone,section,candidate_name,party,votes,percentage,election_type,year
#[derive(Debug, Clone, PartialEq)]
pub struct ElectionRow {
    pub zone: String,
    pub section: String,
    pub candidate_name: String,
    pub party: String,
    pub votes: i64,
    pub percentage: f64,
    pub election_type: String,
    pub year: i32,
}

/// zone,neighborhood,population,7 faixas etárias,4 faixas de renda,3 de escolaridade
#[derive(Debug, Clone, PartialEq, Default, FromRow)]
pub struct IbgeRow {
    pub zone: String,
    pub neighborhood: String,
    pub population: i64,
    pub age_0_17: i64,
    pub age_18_24: i64,
    pub age_25_34: i64,
    pub age_35_44: i64,
    pub age_45_54: i64,
    pub age_55_64: i64,
    pub age_65_plus: i64,
    pub income_0_2: i64,
    pub income_2_5: i64,
    pub income_5_10: i64,
    pub income_10_plus: i64,
    pub education_fundamental: i64,
    pub education_medio: i64,
    pub education_superior: i64,
}

/// poll_name,date_conducted,sample_size,candidate_name,intention,rejection,confidence,margin_error,methodology
#[derive(Debug, Clone, PartialEq)]
pub struct PollRow {
    pub poll_name: String,
    pub date_conducted: NaiveDate,
    pub sample_size: i64,
    pub candidate_name: String,
    pub intention_percentage: f64,
    pub rejection_percentage: f64,
    pub confidence_level: f64,
    pub margin_error: f64,
    pub methodology: String,
}

// ---
// Upload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadFilePayload {
    #[validate(length(min = 1, message = "O nome do arquivo é obrigatório."))]
    #[schema(example = "resultado_2020.csv")]
    pub file_name: String,
    /// Conteúdo em base64
    pub file_data: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub file_path: String,
}

// ---
// Agregados (dashboard e mapa)
// ---
#[derive(Debug, Clone, Copy, Default, PartialEq, FromRow)]
pub struct VoteStats {
    pub total_votes: i64,
    pub vote_percentage: f64,
}

/// Uma zona: votos somados + a linha de IBGE mais recente (zeros se não houver).
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct ZoneRow {
    pub zone: String,
    pub total_votes: i64,
    pub avg_percentage: f64,
    pub population: i64,
    pub age_0_17: i64,
    pub age_18_24: i64,
    pub age_25_34: i64,
    pub age_35_44: i64,
    pub age_45_54: i64,
    pub age_55_64: i64,
    pub age_65_plus: i64,
    pub income_0_2: i64,
    pub income_2_5: i64,
    pub income_5_10: i64,
    pub income_10_plus: i64,
    pub education_fundamental: i64,
    pub education_medio: i64,
    pub education_superior: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub age_groups: BTreeMap<String, i64>,
    pub income_groups: BTreeMap<String, i64>,
    pub education_groups: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MapZone {
    pub zone: String,
    pub total_votes: i64,
    pub percentage: f64,
    pub population: i64,
    pub demographics: Demographics,
}

impl From<ZoneRow> for MapZone {
    fn from(z: ZoneRow) -> Self {
        let groups = |pairs: &[(&str, i64)]| -> BTreeMap<String, i64> {
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        };

        let demographics = Demographics {
            age_groups: groups(&[
                ("0-17", z.age_0_17),
                ("18-24", z.age_18_24),
                ("25-34", z.age_25_34),
                ("35-44", z.age_35_44),
                ("45-54", z.age_45_54),
                ("55-64", z.age_55_64),
                ("65+", z.age_65_plus),
            ]),
            income_groups: groups(&[
                ("0-2SM", z.income_0_2),
                ("2-5SM", z.income_2_5),
                ("5-10SM", z.income_5_10),
                ("10+SM", z.income_10_plus),
            ]),
            education_groups: groups(&[
                ("Fundamental", z.education_fundamental),
                ("Médio", z.education_medio),
                ("Superior", z.education_superior),
            ]),
        };

        MapZone {
            zone: z.zone,
            total_votes: z.total_votes,
            percentage: z.avg_percentage,
            population: z.population,
            demographics,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MapDataResponse {
    pub zones: Vec<MapZone>,
}
