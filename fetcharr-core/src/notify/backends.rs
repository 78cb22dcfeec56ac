//! §6/§4.J player backend implementations: one `reqwest`-backed adapter per
//! [`PlayerBackendKind`]. Each call is a single attempt — retry policy is
//! the update-queue processor's job (§4.J step 4), not the backend's.

use async_trait::async_trait;
use fetcharr_contracts::player::{PlaybackState, PlayerBackend, PlayerError};
use fetcharr_model::{MediaPlayer, PlayerBackendKind};

fn classify(err: reqwest::Error) -> PlayerError {
    if err.is_timeout() || err.is_connect() {
        PlayerError::Transient(err.to_string())
    } else {
        PlayerError::Rejected(err.to_string())
    }
}

pub struct KodiBackend {
    client: reqwest::Client,
    base_url: String,
}

#[async_trait]
impl PlayerBackend for KodiBackend {
    async fn notify_library_changed(&self, player_facing_path: &str) -> Result<(), PlayerError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "VideoLibrary.Scan",
            "params": { "directory": player_facing_path },
        });
        let response = self
            .client
            .post(format!("{}/jsonrpc", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(classify)?;
        if response.status().is_success() { Ok(()) } else { Err(PlayerError::Rejected(response.status().to_string())) }
    }

    async fn probe_playback_state(&self) -> Result<PlaybackState, PlayerError> {
        let body = serde_json::json!({ "jsonrpc": "2.0", "id": 1, "method": "Player.GetActivePlayers" });
        let response = self.client.post(format!("{}/jsonrpc", self.base_url)).json(&body).send().await.map_err(classify)?;
        let parsed: serde_json::Value = response.json().await.map_err(classify)?;
        let active = parsed.get("result").and_then(|r| r.as_array()).map(|a| !a.is_empty()).unwrap_or(false);
        Ok(if active { PlaybackState::Playing } else { PlaybackState::Idle })
    }
}

pub struct JellyfinBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl JellyfinBackend {
    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("X-Emby-Token", key),
            None => builder,
        }
    }
}

#[async_trait]
impl PlayerBackend for JellyfinBackend {
    async fn notify_library_changed(&self, player_facing_path: &str) -> Result<(), PlayerError> {
        let builder = self
            .client
            .post(format!("{}/Library/Media/Updated", self.base_url))
            .json(&serde_json::json!({ "Updates": [{ "Path": player_facing_path, "UpdateType": "Modified" }] }));
        let response = self.authed(builder).send().await.map_err(classify)?;
        if response.status().is_success() { Ok(()) } else { Err(PlayerError::Rejected(response.status().to_string())) }
    }

    async fn probe_playback_state(&self) -> Result<PlaybackState, PlayerError> {
        let builder = self.client.get(format!("{}/Sessions", self.base_url));
        let response = self.authed(builder).send().await.map_err(classify)?;
        let sessions: Vec<serde_json::Value> = response.json().await.map_err(classify)?;
        let playing = sessions.iter().any(|s| s.get("NowPlayingItem").is_some_and(|v| !v.is_null()));
        Ok(if playing { PlaybackState::Playing } else { PlaybackState::Idle })
    }
}

pub struct PlexBackend {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl PlexBackend {
    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.query(&[("X-Plex-Token", token.as_str())]),
            None => builder,
        }
    }
}

#[async_trait]
impl PlayerBackend for PlexBackend {
    async fn notify_library_changed(&self, player_facing_path: &str) -> Result<(), PlayerError> {
        let builder = self
            .client
            .get(format!("{}/library/sections/all/refresh", self.base_url))
            .query(&[("path", player_facing_path)]);
        let response = self.authed(builder).send().await.map_err(classify)?;
        if response.status().is_success() { Ok(()) } else { Err(PlayerError::Rejected(response.status().to_string())) }
    }

    async fn probe_playback_state(&self) -> Result<PlaybackState, PlayerError> {
        let builder = self.client.get(format!("{}/status/sessions", self.base_url));
        let response = self.authed(builder).send().await.map_err(classify)?;
        let body: serde_json::Value = response.json().await.map_err(classify)?;
        let playing = body
            .get("MediaContainer")
            .and_then(|m| m.get("size"))
            .and_then(|s| s.as_i64())
            .is_some_and(|n| n > 0);
        Ok(if playing { PlaybackState::Playing } else { PlaybackState::Idle })
    }
}

/// Builds the right backend for a [`MediaPlayer`] row, sharing one
/// `reqwest::Client` across every backend instance.
pub fn build(player: &MediaPlayer, client: reqwest::Client, api_key: Option<String>) -> std::sync::Arc<dyn PlayerBackend> {
    match player.backend {
        PlayerBackendKind::Kodi => std::sync::Arc::new(KodiBackend { client, base_url: player.base_url.clone() }),
        PlayerBackendKind::Jellyfin => std::sync::Arc::new(JellyfinBackend { client, base_url: player.base_url.clone(), api_key }),
        PlayerBackendKind::Plex => std::sync::Arc::new(PlexBackend { client, base_url: player.base_url.clone(), token: api_key }),
    }
}
