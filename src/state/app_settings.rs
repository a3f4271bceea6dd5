use datagolf_api::client::DATAGOLF_FEEDS;
use log::LevelFilter;

pub const BASE_URL_VAR: &str = "DATAGOLF_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub base_url: String,
    pub log_level: LevelFilter,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self { base_url: DATAGOLF_FEEDS.to_owned(), log_level: LevelFilter::Info }
    }
}

impl AppSettings {
    /// Defaults overlaid with the environment. `RUST_LOG` is read by the
    /// logger itself; `log_level` is the fallback when it is unset.
    pub fn load() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(url) = lookup(BASE_URL_VAR)
            && !url.trim().is_empty()
        {
            settings.base_url = url.trim().to_owned();
        }
        settings
    }

    /// CLI flags win over the environment.
    pub fn with_base_url_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        self
    }
}
