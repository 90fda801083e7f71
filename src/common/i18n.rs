// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "pt";

// Catálogo de mensagens: (chave, português, inglês)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("validation_error", "Um ou mais campos são inválidos.", "One or more fields are invalid."),
    ("invalid_date", "O campo '{field}' não contém uma data válida.", "Field '{field}' is not a valid date."),
    ("email_already_exists", "Este e-mail já está em uso.", "This e-mail is already in use."),
    ("unit_code_already_exists", "Já existe uma unidade com o código '{code}'.", "A unit with code '{code}' already exists."),
    ("unique_violation", "Registro duplicado: {what}.", "Duplicate record: {what}."),
    ("invalid_credentials", "E-mail ou senha inválidos.", "Invalid e-mail or password."),
    ("invalid_token", "Token de autenticação inválido ou ausente.", "Missing or invalid authentication token."),
    ("user_not_found", "Usuário não encontrado.", "User not found."),
    ("resource_not_found", "{what} não encontrado(a).", "{what} not found."),
    ("forbidden", "Você não tem permissão para realizar esta ação.", "You are not allowed to perform this action."),
    ("protected_unit", "A unidade SEDE não pode ser removida.", "The SEDE unit cannot be removed."),
    ("unit_in_use", "A unidade possui funis ou leads associados.", "The unit still has funnels or leads attached."),
    ("user_has_dependencies", "O usuário possui leads, tarefas pendentes ou consultas vinculadas.", "The user still owns leads, pending tasks or consultations."),
    ("cannot_delete_self", "Você não pode excluir o seu próprio usuário.", "You cannot delete your own user."),
    ("invalid_reference", "Referência inválida: {what}.", "Invalid reference: {what}."),
    ("internal_error", "Ocorreu um erro inesperado.", "An unexpected error occurred."),
    // Códigos usados nas mensagens do `validator`
    ("required", "Campo obrigatório.", "Required field."),
    ("invalid_email", "E-mail inválido.", "Invalid e-mail."),
    ("password_too_short", "A senha deve ter no mínimo 6 caracteres.", "Password must be at least 6 characters."),
    ("invalid_duration", "Duração deve estar entre 5 e 600 minutos.", "Duration must be between 5 and 600 minutes."),
    ("invalid_value", "Valor inválido.", "Invalid value."),
];

/// Armazena as traduções carregadas na inicialização.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut pt = HashMap::new();
        let mut en = HashMap::new();
        for (key, pt_msg, en_msg) in MESSAGES {
            pt.insert(*key, *pt_msg);
            en.insert(*key, *en_msg);
        }

        let mut messages = HashMap::new();
        messages.insert("pt", pt);
        messages.insert("en", en);
        Self { messages }
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&'static str> {
        self.messages
            .get(lang)
            .or_else(|| self.messages.get(DEFAULT_LANG))
            .and_then(|table| table.get(key))
            .copied()
    }

    /// Traduz a chave e substitui os marcadores `{nome}` pelos argumentos.
    pub fn translate(&self, lang: &str, key: &str, args: &[(&str, String)]) -> String {
        let mut message = self.lookup(lang, key).unwrap_or(key).to_string();
        for (name, value) in args {
            message = message.replace(&format!("{{{}}}", name), value);
        }
        message
    }

    pub fn translate_or(&self, lang: &str, key: &str, fallback: &str) -> String {
        self.lookup(lang, key).unwrap_or(fallback).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::new();
        assert_eq!(store.translate("de", "forbidden", &[]), "Você não tem permissão para realizar esta ação.");
    }

    #[test]
    fn placeholders_are_replaced() {
        let store = I18nStore::new();
        let msg = store.translate("en", "invalid_date", &[("field", "proximaConsulta".to_string())]);
        assert_eq!(msg, "Field 'proximaConsulta' is not a valid date.");
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::new();
        assert_eq!(store.translate_or("pt", "O nome é obrigatório", "O nome é obrigatório"), "O nome é obrigatório");
    }
}
