pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        #[serde(default = "default_db_url")]
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        /// Marks the session cookie `Secure`. Enable when served over HTTPS.
        #[serde(default)]
        pub secure_cookie: bool,
        #[serde(default = "default_todos_select_limit")]
        pub todos_select_limit: u64,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default().try_parsing(true))
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    impl Default for Config {
        fn default() -> Self {
            Self {
                db_url: default_db_url(),
                port: default_port(),
                secure_cookie: false,
                todos_select_limit: default_todos_select_limit(),
            }
        }
    }

    fn default_db_url() -> String {
        "sqlite://todos.sqlite?mode=rwc".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_todos_select_limit() -> u64 {
        crate::todo::TODOS_SELECT_LIMIT
    }
}

pub mod auth;
pub mod entities;
pub mod session;
pub mod todo;
pub mod user;
pub mod web;
