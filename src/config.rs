use crate::query::DEFAULT_PAGE_SIZE;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Workspace to open at startup.
    pub workspace: Option<PathBuf>,
    /// Serve the demo students until a workspace is selected.
    pub demo: bool,
    pub log_json: bool,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            demo: true,
            log_json: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let workspace = get("REGISTRARD_WORKSPACE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let page_size = get("REGISTRARD_PAGE_SIZE")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.page_size);
        Self {
            workspace,
            demo: parse_bool(get("REGISTRARD_DEMO"), defaults.demo),
            log_json: parse_bool(get("REGISTRARD_LOG_JSON"), defaults.log_json),
            page_size,
        }
    }
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw {
        Some(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
    }

    #[test]
    fn reads_workspace_flags_and_page_size() {
        let cfg = Config::from_lookup(lookup(&[
            ("REGISTRARD_WORKSPACE", "/tmp/college"),
            ("REGISTRARD_DEMO", "off"),
            ("REGISTRARD_LOG_JSON", "YES"),
            ("REGISTRARD_PAGE_SIZE", "25"),
        ]));
        assert_eq!(cfg.workspace, Some(PathBuf::from("/tmp/college")));
        assert!(!cfg.demo);
        assert!(cfg.log_json);
        assert_eq!(cfg.page_size, 25);
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let cfg = Config::from_lookup(lookup(&[
            ("REGISTRARD_WORKSPACE", "  "),
            ("REGISTRARD_DEMO", "maybe"),
            ("REGISTRARD_PAGE_SIZE", "0"),
        ]));
        assert_eq!(cfg, Config::default());
    }
}
