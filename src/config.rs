use serde::Deserialize;

/// Default location of the config file, relative to the working directory.
pub const CONFIG_FILE: &str = "forumseed.toml";

/// Runtime configuration read from `forumseed.toml`.
/// Every section is optional; missing keys fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub dev: DevConfig,
    pub schema: SchemaConfig,
    pub bootstrap: BootstrapConfig,
    pub mock: MockConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: "data/db/forum.db".to_string(),
            pool_size: 10,
        }
    }
}

/// The `/dev` routes perform no authentication of their own.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DevConfig {
    pub enabled: bool,
}

impl Default for DevConfig {
    fn default() -> Self {
        DevConfig { enabled: true }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// When true, a table that fails to create is logged and seeding continues.
    pub best_effort: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Treat already-present counters and accounts as done instead of failing.
    pub skip_existing: bool,
    pub bcrypt_cost: u32,
    pub admin_email: String,
    pub admin_name: String,
    pub admin_password: String,
    pub commenter_email: String,
    pub commenter_name: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            skip_existing: false,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            admin_email: "admin@forum.local".to_string(),
            admin_name: "admin".to_string(),
            admin_password: "change-me".to_string(),
            commenter_email: "commenter@forum.local".to_string(),
            commenter_name: "DefaultCommenter".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// A run inserts indices `C+1 ..= C+1+batch_span`, i.e. `batch_span + 1` articles.
    pub batch_span: u32,
}

impl Default for MockConfig {
    fn default() -> Self {
        MockConfig { batch_span: 49 }
    }
}

impl AppConfig {
    pub fn parse(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| e.to_string())
    }

    /// Load from `FORUMSEED_CONFIG` or `forumseed.toml`. A missing file yields defaults.
    pub fn load() -> Result<Self, String> {
        let path = std::env::var("FORUMSEED_CONFIG").unwrap_or_else(|_| CONFIG_FILE.to_string());
        match std::fs::read_to_string(&path) {
            Ok(s) => Self::parse(&s).map_err(|e| format!("{}: {}", path, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("{} not found, using default config", path);
                Ok(Self::default())
            }
            Err(e) => Err(format!("{}: {}", path, e)),
        }
    }
}
