// src/common/patch.rs

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Campo de atualização parcial com três estados:
/// ausente no JSON (`Missing`), `null` explícito (`Null`) ou um valor.
///
/// Usar sempre com `#[serde(default)]` para que a ausência vire `Missing`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Missing,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Patch<U>, E> {
        Ok(match self {
            Patch::Missing => Patch::Missing,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)?),
        })
    }

    /// Aplica o patch sobre o valor atual de uma coluna anulável.
    pub fn apply_to(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Missing => current,
            Patch::Null => None,
            Patch::Value(v) => Some(v),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Só é chamado quando a chave existe; a ausência fica por conta do `default`.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

// Usado pelo validator ao montar os parâmetros de erro de campos `custom`.
impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Value(v) => v.serialize(serializer),
            Patch::Missing | Patch::Null => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default)]
        note: Patch<String>,
    }

    #[test]
    fn distinguishes_missing_null_and_value() {
        let missing: Body = serde_json::from_str("{}").unwrap();
        let null: Body = serde_json::from_str(r#"{"note": null}"#).unwrap();
        let value: Body = serde_json::from_str(r#"{"note": "retorno"}"#).unwrap();

        assert_eq!(missing.note, Patch::Missing);
        assert_eq!(null.note, Patch::Null);
        assert_eq!(value.note, Patch::Value("retorno".to_string()));
    }

    #[test]
    fn serializes_as_plain_optional_value() {
        assert_eq!(serde_json::to_value(Patch::Value(30)).unwrap(), serde_json::json!(30));
        assert!(serde_json::to_value(Patch::<i32>::Null).unwrap().is_null());
        assert!(serde_json::to_value(Patch::<i32>::Missing).unwrap().is_null());
    }

    #[test]
    fn apply_to_follows_the_three_states() {
        let current = Some(10);
        assert_eq!(Patch::Missing.apply_to(current), Some(10));
        assert_eq!(Patch::<i32>::Null.apply_to(current), None);
        assert_eq!(Patch::Value(20).apply_to(current), Some(20));
    }
}
