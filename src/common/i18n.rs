// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "pt";

// Catálogo embutido: (idioma, chave, mensagem). Parâmetros no formato {nome}.
const MESSAGES: &[(&str, &str, &str)] = &[
    ("pt", "validation_failed", "Um ou mais campos são inválidos."),
    ("en", "validation_failed", "One or more fields are invalid."),
    ("pt", "invalid_token", "Token de autenticação inválido ou ausente."),
    ("en", "invalid_token", "Missing or invalid authentication token."),
    ("pt", "invalid_credentials", "E-mail ou senha inválidos."),
    ("en", "invalid_credentials", "Invalid e-mail or password."),
    ("pt", "user_not_found", "Usuário não encontrado ou inativo."),
    ("en", "user_not_found", "User not found or inactive."),
    ("pt", "permission_denied", "Apenas usuários '{role}' podem realizar esta ação."),
    ("en", "permission_denied", "Only '{role}' users can perform this action."),
    ("pt", "tenant_required", "É necessário um tenant (candidato) para esta operação."),
    ("en", "tenant_required", "Tenant ID required."),
    ("pt", "no_fields_to_update", "Nenhum campo para atualizar."),
    ("en", "no_fields_to_update", "No fields to update."),
    ("pt", "subdomain_exists", "O subdomínio '{subdomain}' já está em uso."),
    ("en", "subdomain_exists", "Subdomain '{subdomain}' already exists."),
    ("pt", "email_exists", "O e-mail '{email}' já está em uso."),
    ("en", "email_exists", "E-mail '{email}' is already in use."),
    ("pt", "invalid_base64", "O arquivo enviado não está em base64 válido."),
    ("en", "invalid_base64", "The uploaded file is not valid base64."),
    ("pt", "not_found", "Recurso não encontrado: {resource}"),
    ("en", "not_found", "Resource not found: {resource}"),
    ("pt", "internal_error", "Ocorreu um erro inesperado."),
    ("en", "internal_error", "An unexpected error occurred."),
];

/// Mensagens de erro por idioma. Idiomas desconhecidos caem no português.
#[derive(Debug, Clone)]
pub struct I18nStore {
    // idioma -> (chave -> mensagem)
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        let mut messages: HashMap<&'static str, HashMap<&'static str, &'static str>> =
            HashMap::new();
        for (lang, key, text) in MESSAGES {
            messages.entry(*lang).or_default().insert(*key, *text);
        }
        Self { messages }
    }
}

impl I18nStore {
    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, String)]) -> String {
        let lookup = |lang: &str| self.messages.get(lang).and_then(|m| m.get(key)).copied();
        let template = lookup(lang).or_else(|| lookup(DEFAULT_LANG)).unwrap_or(key);

        params
            .iter()
            .fold(template.to_string(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}
