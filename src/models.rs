use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameInfo {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    pub target_score: u32,
    pub time_limit: u32,
}

#[derive(Debug, Serialize)]
pub struct StartGameRequest<'a> {
    pub game_type: &'a str,
    pub tracking_method: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StartGameResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub game_type: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub tracking_method: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateScoreRequest {
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Achievement {
    #[serde(default)]
    pub achievement_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub points_reward: Option<i64>,
}

/// Authoritative end-of-game scoring from the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameResult {
    pub points_earned: i64,
    pub calories_burned: f64,
    #[serde(default)]
    pub new_badges: Vec<String>,
    #[serde(default)]
    pub new_achievements: Vec<Achievement>,
    /// Minutes.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub total_points: Option<i64>,
    #[serde(default)]
    pub best_score: Option<u32>,
    #[serde(default)]
    pub is_personal_best: Option<bool>,
    #[serde(default)]
    pub current_streak: Option<u32>,
    #[serde(default)]
    pub longest_streak: Option<u32>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub username: String,
    pub best_score: u32,
    pub games_played: u32,
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyPoint {
    pub day: String,
    pub calories: f64,
    pub workouts: u32,
    pub time_active: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DashboardStats {
    pub points: i64,
    #[serde(default)]
    pub badges: u32,
    pub workouts_completed: u32,
    pub calories_burned: f64,
    pub time_active: f64,
    #[serde(default)]
    pub daily_usage: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AchievementProgress {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Percentage, 0 to 100.
    pub progress: f64,
    pub current: f64,
    #[serde(default)]
    pub target: Option<f64>,
}

pub type AchievementProgressMap = BTreeMap<String, AchievementProgress>;
