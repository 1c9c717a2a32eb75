use std::env;
use std::fmt;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_CLUSTER: &str = "cluster0.qz6lguv.mongodb.net";
const DEFAULT_DATABASE: &str = "SmartCare";

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_name: String,
    /// `None` when neither `MONGODB_URI` nor the credential pair is set.
    pub database_uri: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    MissingCredentials,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingCredentials => {
                write!(f, "DB_USER and DB_PASS (or MONGODB_URI) must be set")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
                log::warn!("⚠️  Invalid PORT '{}', falling back to {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let database_name = lookup("DB_NAME").unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let database_uri = match lookup("MONGODB_URI") {
            Some(uri) => Some(uri),
            None => match (lookup("DB_USER"), lookup("DB_PASS")) {
                (Some(user), Some(pass)) => {
                    let cluster =
                        lookup("DB_CLUSTER").unwrap_or_else(|| DEFAULT_CLUSTER.to_string());
                    Some(atlas_uri(&user, &pass, &cluster, &database_name))
                }
                _ => None,
            },
        };

        Self {
            host,
            port,
            database_name,
            database_uri,
        }
    }

    pub fn database_uri(&self) -> Result<&str, ConfigError> {
        self.database_uri
            .as_deref()
            .ok_or(ConfigError::MissingCredentials)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

/// Builds the SRV connection string; both credentials are percent-encoded.
pub fn atlas_uri(user: &str, pass: &str, cluster: &str, database: &str) -> String {
    format!(
        "mongodb+srv://{}:{}@{}/{}?retryWrites=true&w=majority",
        urlencoding::encode(user),
        urlencoding::encode(pass),
        cluster,
        database
    )
}

/// Connection string with the password replaced, for logging.
pub fn redact_uri(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };
    match rest.rsplit_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{}://{}:****@{}", scheme, user, host)
        }
        None => uri.to_string(),
    }
}
