// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

use anyhow::Context;

const FALLBACK_LOCALE: &str = "en";

// Catálogos embutidos no binário (não dependem do diretório de execução)
const CATALOGS: [(&str, &str); 2] = [
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

/// Mensagens traduzidas, indexadas por idioma e depois por chave.
#[derive(Clone, Debug)]
pub struct I18nStore {
    catalogs: Arc<HashMap<String, HashMap<String, String>>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();

        for (lang, raw) in CATALOGS {
            let catalog: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("Catálogo de mensagens inválido para '{}'", lang))?;
            catalogs.insert(lang.to_string(), catalog);
        }

        Ok(Self { catalogs: Arc::new(catalogs) })
    }

    pub fn supports(&self, locale: &str) -> bool {
        self.catalogs.contains_key(locale)
    }

    /// Traduz `key` para `locale`, caindo para o inglês e, em último caso, para a própria chave.
    /// Os parâmetros substituem os marcadores `{nome}` do texto.
    pub fn translate(&self, locale: &str, key: &str, params: &[(&str, String)]) -> String {
        let template = self
            .lookup(locale, key)
            .or_else(|| self.lookup(FALLBACK_LOCALE, key))
            .unwrap_or(key);

        params.iter().fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
    }

    fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        self.catalogs
            .get(locale)
            .and_then(|catalog| catalog.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_catalogs_load_and_share_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let en = &store.catalogs["en"];
        let pt = &store.catalogs["pt"];

        let mut missing: Vec<&String> = en.keys().filter(|k| !pt.contains_key(*k)).collect();
        missing.sort();
        assert!(missing.is_empty(), "chaves sem tradução em pt: {:?}", missing);
        assert_eq!(en.len(), pt.len());
    }

    #[test]
    fn unknown_locale_falls_back_to_english() {
        let store = I18nStore::load().unwrap();
        assert!(!store.supports("de"));
        assert_eq!(
            store.translate("de", "room.not_found", &[]),
            store.translate("en", "room.not_found", &[])
        );
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("pt", "nao.existe", &[]), "nao.existe");
    }

    #[test]
    fn placeholders_are_substituted() {
        let store = I18nStore::load().unwrap();
        let text = store.translate(
            "en",
            "permission.denied",
            &[("module", "vouchers".to_string()), ("action", "delete".to_string())],
        );
        assert!(text.contains("vouchers"));
        assert!(text.contains("delete"));
        assert!(!text.contains('{'));
    }
}
