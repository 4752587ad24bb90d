use adapter::PlatformConfig;
use config::ConfigError;
use domain::Locale;
use serde::Deserialize;
use service::Collections;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub collections: Collections,
    pub uploads: UploadSettings,
    #[serde(default)]
    pub locale: Locale,
    pub security: SecuritySettings,
    pub import: ImportSettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct UploadSettings {
    /// 文件写入的根目录
    pub dir: String,
    /// 根目录对外暴露的 URL 前缀
    pub public_prefix: String,
    pub namespace: String,
    pub max_body_mb: usize,
}

#[derive(Deserialize, Clone)]
pub struct SecuritySettings {
    pub admin_token: String,
    /// `X-User-Token` 的 HMAC 密钥
    pub auth_secret: String,
    pub pow_difficulty: usize,
}

#[derive(Deserialize, Clone)]
pub struct ImportSettings {
    pub enabled: bool,
    pub interval_secs: u64,
    pub run_on_startup: bool,
    #[serde(default)]
    pub platforms: Vec<PlatformConfig>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.url", "sqlite://data/reviews.db")?
            .set_default("uploads.dir", "data/upload")?
            .set_default("uploads.public_prefix", "/upload")?
            .set_default("uploads.namespace", "reviews")?
            .set_default("uploads.max_body_mb", 20)?
            .set_default("locale", "ru")?
            .set_default("security.admin_token", "admin_secret_123")?
            .set_default("security.auth_secret", "change_me_please")?
            .set_default("security.pow_difficulty", 4)?
            .set_default("import.enabled", false)?
            .set_default("import.interval_secs", 3600)?
            .set_default("import.run_on_startup", false)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(
                config::Environment::with_prefix("REVIEWS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
