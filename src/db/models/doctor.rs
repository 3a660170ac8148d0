use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::booking::DoctorSummary;

/// Practitioner Directory record.
#[derive(Serialize, Deserialize, Debug, Clone, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub available: bool,
    pub created_at: NaiveDateTime,
}

impl Doctor {
    pub fn summary(&self) -> DoctorSummary {
        DoctorSummary {
            id: self.id,
            name: self.name.clone(),
            specialty: self.specialty.clone(),
        }
    }
}
