use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::message_models::TipoMensagem;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EnviarMensagemRequest {
    #[validate(length(min = 1, max = 1000, message = "conteúdo deve ter entre 1 e 1000 caracteres"))]
    pub conteudo: String,
    #[serde(default)]
    pub tipo: Option<TipoMensagem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conteudo_vazio_rejeitado() {
        let req = EnviarMensagemRequest {
            conteudo: String::new(),
            tipo: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_conteudo_excedente_rejeitado() {
        let req = EnviarMensagemRequest {
            conteudo: "a".repeat(1001),
            tipo: Some(TipoMensagem::Text),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_conteudo_no_limite_aceito() {
        let req = EnviarMensagemRequest {
            conteudo: "a".repeat(1000),
            tipo: None,
        };
        assert!(req.validate().is_ok());
    }
}
