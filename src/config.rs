use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub api_base_url: String,
    pub api_service_token: Option<String>,
    pub tunnel_bypass_header: Option<(String, String)>,
    pub public_rps: u32,
    pub remarks_question_ids: Vec<i64>,
    pub report_title: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

pub const DEFAULT_REPORT_TITLE: &str = "Faculty Evaluation Report";

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            api_base_url: get_env("API_BASE_URL")?.trim_end_matches('/').to_string(),
            api_service_token: get_env_opt("API_SERVICE_TOKEN"),
            tunnel_bypass_header: get_env_opt("TUNNEL_BYPASS_HEADER")
                .map(|raw| parse_header_pair(&raw))
                .transpose()?,
            public_rps: get_env_parse("PUBLIC_RPS")?,
            remarks_question_ids: get_env_opt("REMARKS_QUESTION_IDS")
                .map(|raw| parse_id_list(&raw))
                .transpose()?
                .unwrap_or_default(),
            report_title: get_env_opt("REPORT_TITLE")
                .unwrap_or_else(|| DEFAULT_REPORT_TITLE.to_string()),
            log_format: match get_env_opt("LOG_FORMAT").as_deref() {
                None | Some("text") => LogFormat::Text,
                Some("json") => LogFormat::Json,
                Some(other) => {
                    return Err(Error::Config(format!(
                        "Invalid value for LOG_FORMAT: {}",
                        other
                    )))
                }
            },
        })
    }

    /// Config pointing at `api_base_url` with everything else defaulted.
    pub fn for_api(api_base_url: impl Into<String>) -> Self {
        Self {
            server_address: "127.0.0.1:0".to_string(),
            api_base_url: api_base_url.into(),
            api_service_token: None,
            tunnel_bypass_header: None,
            public_rps: 100,
            remarks_question_ids: Vec::new(),
            report_title: DEFAULT_REPORT_TITLE.to_string(),
            log_format: LogFormat::Text,
        }
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn parse_header_pair(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw.split_once(':').ok_or_else(|| {
        Error::Config(format!(
            "TUNNEL_BYPASS_HEADER must look like name:value, got {}",
            raw
        ))
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config("TUNNEL_BYPASS_HEADER has an empty name".to_string()));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|e| Error::Config(format!("Invalid question id {}: {}", s, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_pair_is_split_on_first_colon() {
        let (name, value) = parse_header_pair("bypass-tunnel-reminder: true").unwrap();
        assert_eq!(name, "bypass-tunnel-reminder");
        assert_eq!(value, "true");

        assert!(parse_header_pair("no-colon").is_err());
        assert!(parse_header_pair(":value").is_err());
    }

    #[test]
    fn id_list_skips_blanks_and_rejects_garbage() {
        assert_eq!(parse_id_list("19, 20,,21").unwrap(), vec![19, 20, 21]);
        assert!(parse_id_list("19,abc").is_err());
    }
}
