use crate::images::ImageOptions;
use std::{env, path::PathBuf, str::FromStr};
use tracing::warn;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub images: ImageOptions,
    pub max_upload_bytes: usize,
    pub gemini: Option<GeminiConfig>,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ImageOptions::default();
        let gemini = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| GeminiConfig {
                api_key,
                model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: lookup("GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            });

        Self {
            port: parse_or(&lookup, "PORT", 8080),
            data_path: lookup("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/entries.json")),
            images: ImageOptions {
                max_width: parse_or(&lookup, "IMAGE_MAX_WIDTH", defaults.max_width),
                quality: parse_or(&lookup, "IMAGE_QUALITY", defaults.quality).clamp(1, 100),
            },
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 16 * 1024 * 1024),
            gemini,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {key}={raw:?}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("data/entries.json"));
        assert_eq!(config.images.max_width, 300);
        assert_eq!(config.images.quality, 70);
        assert!(config.gemini.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("PORT", "9000"),
            ("APP_DATA_PATH", "/tmp/x.json"),
            ("IMAGE_MAX_WIDTH", "640"),
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_BASE_URL", "http://127.0.0.1:9/"),
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.data_path, PathBuf::from("/tmp/x.json"));
        assert_eq!(config.images.max_width, 640);
        let gemini = config.gemini.unwrap();
        assert_eq!(gemini.api_key, "secret");
        assert_eq!(gemini.model, DEFAULT_MODEL);
        assert_eq!(gemini.base_url, "http://127.0.0.1:9");
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = config(&[("PORT", "eighty"), ("IMAGE_QUALITY", "250")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.images.quality, 70);
    }

    #[test]
    fn legacy_api_key_variable_is_accepted() {
        let config = config(&[("API_KEY", "k")]);
        assert_eq!(config.gemini.unwrap().api_key, "k");
    }
}
