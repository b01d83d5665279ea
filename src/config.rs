use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use std::fmt;

#[derive(Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub jwt_secret: String,
    pub jwt_expires_in_hours: u64,
    pub cors_origin: String,
    pub game: GameConfig,
    pub grader: GraderConfig,
}

/// Game balance tuning. Injected into the progression core so unit tests can
/// run with varied values instead of reading process-wide constants.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// XP needed to advance one level; stored XP is always the remainder below this.
    pub xp_threshold: u32,
    pub base_hp: u32,
    pub hp_per_level: u32,
    /// Percent of monster health removed per correct battle answer.
    pub damage_per_hit: u32,
    /// Flat reward for every quest completion call, first-time or repeat.
    pub quest_xp: u32,
    pub quest_gold: u32,
    pub starting_gold: u32,
    pub weekly_xp_target: u32,
    pub weekly_quests_target: u32,
    pub weekly_battles_target: u32,
}

#[derive(Clone)]
pub struct GraderConfig {
    pub enabled: bool,
    pub mock: bool,
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Minimum AI score for an automatic "approved" verdict.
    pub approve_threshold: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("enable_file_logs", &self.enable_file_logs)
            .field("log_dir", &self.log_dir)
            .field("sled_path", &self.sled_path)
            .field("jwt_secret", &"***REDACTED***")
            .field("jwt_expires_in_hours", &self.jwt_expires_in_hours)
            .field("cors_origin", &self.cors_origin)
            .field("game", &self.game)
            .field("grader", &self.grader)
            .finish()
    }
}

impl fmt::Debug for GraderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraderConfig")
            .field("enabled", &self.enabled)
            .field("mock", &self.mock)
            .field("api_url", &self.api_url)
            .field("api_key", &"***REDACTED***")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("approve_threshold", &self.approve_threshold)
            .finish()
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            xp_threshold: 100,
            base_hp: 100,
            hp_per_level: 10,
            damage_per_hit: 20,
            quest_xp: 50,
            quest_gold: 10,
            starting_gold: 0,
            weekly_xp_target: 500,
            weekly_quests_target: 10,
            weekly_battles_target: 3,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/academy.sled"),
            jwt_secret: env_or(
                "JWT_SECRET",
                "change_me_to_random_64_chars_change_me_to_random_64_chars",
            ),
            jwt_expires_in_hours: env_or_parse("JWT_EXPIRES_IN_HOURS", 24_u64),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            game: GameConfig {
                xp_threshold: env_or_parse("GAME_XP_THRESHOLD", 100_u32),
                base_hp: env_or_parse("GAME_BASE_HP", 100_u32),
                hp_per_level: env_or_parse("GAME_HP_PER_LEVEL", 10_u32),
                damage_per_hit: env_or_parse("GAME_DAMAGE_PER_HIT", 20_u32),
                quest_xp: env_or_parse("GAME_QUEST_XP", 50_u32),
                quest_gold: env_or_parse("GAME_QUEST_GOLD", 10_u32),
                starting_gold: env_or_parse("GAME_STARTING_GOLD", 0_u32),
                weekly_xp_target: env_or_parse("GAME_WEEKLY_XP_TARGET", 500_u32),
                weekly_quests_target: env_or_parse("GAME_WEEKLY_QUESTS_TARGET", 10_u32),
                weekly_battles_target: env_or_parse("GAME_WEEKLY_BATTLES_TARGET", 3_u32),
            },
            grader: GraderConfig {
                enabled: env_or_bool("GRADER_ENABLED", false),
                mock: env_or_bool("GRADER_MOCK", true),
                api_url: env_or(
                    "GRADER_API_URL",
                    "https://openrouter.ai/api/v1/chat/completions",
                ),
                api_key: env_or("GRADER_API_KEY", ""),
                model: env_or("GRADER_MODEL", "google/gemini-pro"),
                timeout_secs: env_or_parse("GRADER_TIMEOUT_SECS", 30_u64),
                approve_threshold: env_or_parse("GRADER_APPROVE_THRESHOLD", 70_u32),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
