//! Engine configuration.
//!
//! Every tunable the protocols depend on lives here with its default, so
//! nothing in the engine hard-codes a timer or a point value. The
//! defaults are the values the game shipped with.

use std::time::Duration;

use lexiduel_protocol::GameMode;

/// Configuration for one game session.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Players per room. The game is a duel.
    pub max_players: usize,

    /// Points for a dictionary-valid word in an online round.
    pub online_points_per_word: u32,

    /// Points for a dictionary-valid word in solo play. The two modes
    /// have always scored differently; both values are configuration.
    pub solo_points_per_word: u32,

    /// Flat penalty for a voluntary early stop with every category
    /// answered and at least one invalid word. Round scores floor at 0.
    pub early_stop_penalty: u32,

    /// Round timer. The countdown itself is driven by the caller; the
    /// engine only carries the duration.
    pub round_timer: Duration,

    /// Grace delay before auto-submitting once the opponent finishes,
    /// so the player sees the "opponent finished" notice first.
    pub auto_submit_grace: Duration,

    /// Poll interval for opponent-finished detection.
    pub opponent_poll_interval: Duration,

    /// Poll interval for the both-ready barrier between rounds.
    pub barrier_poll_interval: Duration,

    /// Poll interval while waiting for an end-game response.
    pub response_poll_interval: Duration,

    /// Poll interval for detecting an incoming end-game request.
    pub request_poll_interval: Duration,

    /// Poll interval while waiting for vote resolution.
    pub vote_poll_interval: Duration,

    /// How long the requester waits for an end-game response before
    /// abandoning the request client-side.
    pub response_timeout: Duration,

    /// Ceiling on the both-ready barrier and the guest's wait for the
    /// next round to appear.
    pub barrier_timeout: Duration,

    /// Ceiling on waiting for every ballot of a contested word.
    pub vote_timeout: Duration,

    /// Waiting rooms older than this are fair game for housekeeping.
    pub stale_room_age: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_players: 2,
            online_points_per_word: 2,
            solo_points_per_word: 10,
            early_stop_penalty: 3,
            round_timer: Duration::from_secs(120),
            auto_submit_grace: Duration::from_secs(1),
            opponent_poll_interval: Duration::from_millis(500),
            barrier_poll_interval: Duration::from_secs(1),
            response_poll_interval: Duration::from_secs(1),
            request_poll_interval: Duration::from_secs(2),
            vote_poll_interval: Duration::from_secs(1),
            response_timeout: Duration::from_secs(30),
            barrier_timeout: Duration::from_secs(60),
            vote_timeout: Duration::from_secs(60),
            stale_room_age: Duration::from_secs(30 * 60),
        }
    }
}

impl GameConfig {
    /// Points awarded per valid word under the given mode.
    pub fn points_per_word(&self, mode: GameMode) -> u32 {
        match mode {
            GameMode::Solo => self.solo_points_per_word,
            GameMode::Online => self.online_points_per_word,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = GameConfig::default();
        assert_eq!(config.max_players, 2);
        assert_eq!(config.early_stop_penalty, 3);
        assert_eq!(config.round_timer, Duration::from_secs(120));
        assert_eq!(config.response_timeout, Duration::from_secs(30));
        assert_eq!(config.vote_timeout, Duration::from_secs(60));
        assert_eq!(
            config.opponent_poll_interval,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_points_are_mode_keyed() {
        let config = GameConfig::default();
        assert_eq!(config.points_per_word(GameMode::Online), 2);
        assert_eq!(config.points_per_word(GameMode::Solo), 10);
    }
}
