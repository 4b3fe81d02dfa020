//! HTTP clients for the FitPlay server's `/games` and `/dashboard` endpoints.

use crate::config::ClientConfig;
use crate::models::{
    AchievementProgressMap, DashboardStats, GameResult, LeaderboardEntry, StartGameRequest,
    StartGameResponse, UpdateScoreRequest, WeeklyPoint,
};
use crate::variant::VariantKind;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure or an undecodable body.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server replied {status}: {body}")]
    Status { status: u16, body: String },
}

/// Shared plumbing: base URL plus a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
struct Http {
    client: reqwest::Client,
    base_url: String,
}

impl Http {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        parse_response(response).await
    }

    async fn post(&self, path: &str, body: &impl serde::Serialize) -> Result<reqwest::Response, ApiError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        ensure_success(response).await
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}

fn build_http(config: &ClientConfig) -> Result<Http, ApiError> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    Ok(Http {
        client,
        base_url: config.base_url.clone(),
    })
}

#[derive(Debug, Clone)]
pub struct GamesClient {
    http: Http,
}

impl GamesClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http: build_http(config)?,
        })
    }

    /// `GET /games/game_data`, left raw so bad entries can be skipped one by one.
    pub async fn game_data(&self) -> Result<BTreeMap<String, serde_json::Value>, ApiError> {
        self.http.get_json("/games/game_data").await
    }

    /// `POST /games/start_game`. An empty or non-JSON success body is fine.
    pub async fn start_game(&self, kind: VariantKind) -> Result<StartGameResponse, ApiError> {
        let body = StartGameRequest {
            game_type: kind.as_str(),
            tracking_method: "manual",
        };
        let response = self.http.post("/games/start_game", &body).await?;
        Ok(response.json::<StartGameResponse>().await.unwrap_or_default())
    }

    pub async fn update_score(&self, score: u32) -> Result<(), ApiError> {
        self.http
            .post("/games/update_score", &UpdateScoreRequest { score })
            .await?;
        Ok(())
    }

    pub async fn end_game(&self) -> Result<GameResult, ApiError> {
        let response = self
            .http
            .post("/games/end_game", &serde_json::json!({}))
            .await?;
        Ok(response.json::<GameResult>().await?)
    }

    pub async fn leaderboard(&self, kind: VariantKind) -> Result<Vec<LeaderboardEntry>, ApiError> {
        self.http
            .get_json(&format!("/games/leaderboard/{}", kind.as_str()))
            .await
    }
}

#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: Http,
}

impl DashboardClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http: build_http(config)?,
        })
    }

    /// Oldest day first.
    pub async fn weekly_progress(&self) -> Result<Vec<WeeklyPoint>, ApiError> {
        self.http.get_json("/dashboard/weekly_progress").await
    }

    pub async fn stats(&self) -> Result<DashboardStats, ApiError> {
        self.http.get_json("/dashboard/stats").await
    }

    pub async fn achievement_progress(&self) -> Result<AchievementProgressMap, ApiError> {
        self.http.get_json("/dashboard/achievement_progress").await
    }
}
