use chrono_tz::Tz;
use serde::Deserialize;

/// Default config file, resolved relative to the working directory.
pub const CONFIG_FILE: &str = "thermoboard.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub dashboard: DashboardConfig,
    pub security: SecurityConfig,
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// "mongodb" or "memory"
    pub backend: String,
    pub uri: Option<String>,
    pub name: String,
    pub collection: String,
    pub server_selection_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub timezone: String,
    pub default_hours: u32,
    pub allowed_hours: Vec<u32>,
    /// Degrees added above and below the series on the chart's y-axis.
    pub y_axis_padding: f64,
    pub rolling_window_minutes: i64,
    /// Pre-filled value of the delete form.
    pub default_days_old: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub delete_password: Option<String>,
    /// bcrypt hash; wins over `delete_password` when both are set.
    pub delete_password_hash: Option<String>,
    pub max_delete_attempts: u64,
    pub attempt_window_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// 0 disables automatic pruning.
    pub days: u32,
    pub interval_minutes: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            backend: "mongodb".to_string(),
            uri: None,
            name: "Weather".to_string(),
            collection: "Temp".to_string(),
            server_selection_timeout_ms: 10_000,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            timezone: "America/New_York".to_string(),
            default_hours: 24,
            allowed_hours: vec![1, 3, 6, 12, 24, 48, 72],
            y_axis_padding: 2.0,
            rolling_window_minutes: 5,
            default_days_old: 30,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        SecurityConfig {
            delete_password: None,
            delete_password_hash: None,
            max_delete_attempts: 5,
            attempt_window_minutes: 15,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        RetentionConfig {
            days: 0,
            interval_minutes: 60,
        }
    }
}

impl AppConfig {
    /// Read `thermoboard.toml` (or `$THERMOBOARD_CONFIG`), apply environment
    /// overrides and validate. A missing file falls back to defaults.
    pub fn load() -> Result<Self, String> {
        let path = std::env::var("THERMOBOARD_CONFIG").unwrap_or_else(|_| CONFIG_FILE.to_string());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(raw) => Self::from_toml_str(&raw).map_err(|e| format!("{}: {}", path, e))?,
            Err(_) => {
                log::warn!("{} not found, using built-in defaults", path);
                AppConfig::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| e.to_string())
    }

    /// Environment wins over the file for connection and secret values.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(uri) = non_empty("MONGO_URI") {
            self.database.uri = Some(uri);
        }
        if let Some(backend) = non_empty("THERMOBOARD_BACKEND") {
            self.database.backend = backend;
        }
        if let Some(tz) = non_empty("THERMOBOARD_TIMEZONE") {
            self.dashboard.timezone = tz;
        }
        if let Some(pw) = non_empty("THERMOBOARD_DELETE_PASSWORD") {
            self.security.delete_password = Some(pw);
        }
        if let Some(hash) = non_empty("THERMOBOARD_DELETE_PASSWORD_HASH") {
            self.security.delete_password_hash = Some(hash);
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.database.backend.as_str() {
            "mongodb" => {
                if self.database.uri.as_deref().map_or(true, |u| u.trim().is_empty()) {
                    return Err("MONGO_URI not set in environment or [database] uri".to_string());
                }
            }
            "memory" => {}
            other => return Err(format!("Unknown database backend '{}'", other)),
        }

        self.dashboard
            .timezone
            .parse::<Tz>()
            .map_err(|_| format!("Unknown timezone '{}'", self.dashboard.timezone))?;

        let d = &self.dashboard;
        if d.allowed_hours.is_empty() || d.allowed_hours.contains(&0) {
            return Err("dashboard.allowed_hours must be non-empty and positive".to_string());
        }
        if !d.allowed_hours.contains(&d.default_hours) {
            return Err(format!(
                "dashboard.default_hours ({}) is not in allowed_hours",
                d.default_hours
            ));
        }
        if d.rolling_window_minutes <= 0 {
            return Err("dashboard.rolling_window_minutes must be positive".to_string());
        }
        Ok(())
    }
}

impl DashboardConfig {
    /// Parsed display zone. `validate()` has already rejected bad names.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(Tz::UTC)
    }

    pub fn rolling_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.rolling_window_minutes)
    }

    pub fn is_allowed(&self, hours: i64) -> bool {
        self.allowed_hours.iter().any(|&h| i64::from(h) == hours)
    }
}
