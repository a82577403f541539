use lazy_static::lazy_static;
use std::env;
use std::path::PathBuf;

pub struct Config {
    pub data_path: String,
    pub videos_dir: String,
    pub webserver_host: String,
    pub webserver_port: u16,
    /// Primary catalog source. When unset the videos directory is scanned directly.
    pub catalog_url: Option<String>,
    pub fallback_catalog: String,
    /// Remote likes endpoint. When unset likes are kept in `likes_path`.
    pub likes_api_url: Option<String>,
    pub admin_token: Option<String>,
    pub likes_path: String,
    pub reset_password: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        let data_path = env::var("DATA_PATH").unwrap_or(".".to_string());
        let videos_dir = format!("{}/videos", data_path);

        let webserver_host = env::var("WEBSERVER_HOST").unwrap_or("127.0.0.1".to_string());
        let webserver_port = env::var("WEBSERVER_PORT")
            .unwrap_or("8080".to_string())
            .parse()
            .expect("WEBSERVER_PORT must be a valid u16");

        let catalog_url = non_empty_var("CATALOG_URL");
        let fallback_catalog = env::var("FALLBACK_CATALOG")
            .unwrap_or(format!("{}/catalog.json", data_path));

        let likes_api_url = non_empty_var("LIKES_API_URL");
        let admin_token = non_empty_var("ADMIN_TOKEN");
        let likes_path = env::var("LIKES_PATH").unwrap_or(format!("{}/likes.json", data_path));
        let reset_password = non_empty_var("RESET_PASSWORD");

        Self {
            data_path,
            videos_dir,
            webserver_host,
            webserver_port,
            catalog_url,
            fallback_catalog,
            likes_api_url,
            admin_token,
            likes_path,
            reset_password,
        }
    }

    pub fn videos_path(&self) -> PathBuf {
        PathBuf::from(&self.videos_dir)
    }

    pub fn likes_file(&self) -> PathBuf {
        PathBuf::from(&self.likes_path)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

lazy_static! {
    pub static ref CONFIG: Config = Config::new();
}
