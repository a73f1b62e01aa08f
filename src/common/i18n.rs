// src/common/i18n.rs

use std::collections::HashMap;

use anyhow::Context;

pub const DEFAULT_LANG: &str = "fr";

// Pacotes de tradução embutidos no binário
const BUNDLES: [(&str, &str); 3] = [
    ("fr", include_str!("../../locales/fr.json")),
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

/// Mensagens traduzidas, indexadas por idioma e depois por chave.
#[derive(Debug, Clone)]
pub struct I18nStore {
    bundles: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut bundles = HashMap::new();
        for (lang, raw) in BUNDLES {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("Pacote de tradução '{}' inválido", lang))?;
            bundles.insert(lang.to_string(), messages);
        }
        Ok(Self { bundles })
    }

    /// Idioma pedido -> idioma padrão -> a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.bundles
            .get(lang)
            .and_then(|messages| messages.get(key))
            .or_else(|| self.bundles.get(DEFAULT_LANG).and_then(|m| m.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Igual a `translate`, substituindo `{nome}` pelos argumentos.
    pub fn translate_with(&self, lang: &str, key: &str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.translate(lang, key), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.bundles.contains_key(lang)
    }
}
