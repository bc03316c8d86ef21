use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Papel {
    Paciente,
    Psicologo,
}

impl std::fmt::Display for Papel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Papel::Paciente => write!(f, "paciente"),
            Papel::Psicologo => write!(f, "psicologo"),
        }
    }
}

/// Profile CRUD belongs to the identity/profile surface; this service only
/// reads users to authenticate callers and denormalize conversation lists.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Usuario {
    pub id: Uuid,
    pub nome: String,
    pub foto_url: Option<String>,
    pub papel: Papel,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_papel_display() {
        assert_eq!(Papel::Paciente.to_string(), "paciente");
        assert_eq!(Papel::Psicologo.to_string(), "psicologo");
    }

    #[test]
    fn test_papel_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Papel::Psicologo).unwrap(), "\"psicologo\"");
        let p: Papel = serde_json::from_str("\"paciente\"").unwrap();
        assert_eq!(p, Papel::Paciente);
    }
}
