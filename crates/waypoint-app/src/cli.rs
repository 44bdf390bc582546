//! Command line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;
use waypoint_geo::{StopPolicy, TrackerConfig};
use waypoint_net::DEFAULT_DIRECTIONS_URL;
use waypoint_session::SessionConfig;

#[derive(Parser, Debug)]
#[command(name = "waypoint")]
#[command(about = "Replay a recorded track through a live navigation session")]
pub struct Cli {
    /// Recorded track: a JSON array of fixes ({"lat", "lng", ...})
    #[arg(long)]
    pub track: PathBuf,

    /// Directions provider access token
    #[arg(long, env = "WAYPOINT_MAPBOX_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Directions provider base URL
    #[arg(long, env = "WAYPOINT_DIRECTIONS_URL", default_value = DEFAULT_DIRECTIONS_URL)]
    pub directions_url: Url,

    /// Address history API base URL
    #[arg(long, env = "WAYPOINT_BACKEND_URL")]
    pub backend_url: Url,

    /// Destination name
    #[arg(long, requires_all = ["lng", "lat"])]
    pub to: Option<String>,

    /// Destination longitude
    #[arg(long, allow_negative_numbers = true)]
    pub lng: Option<f64>,

    /// Destination latitude
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Navigate to the Nth recent destination (0 is the newest)
    #[arg(long, conflicts_with = "to")]
    pub history: Option<usize>,

    /// Time between replayed fixes
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Keep the camera on the destination
    #[arg(long)]
    pub no_follow: bool,

    /// Keep the last position after tracking stops
    #[arg(long)]
    pub retain_last_position: bool,

    /// Answer the location prompt with "deny"
    #[arg(long)]
    pub deny_location: bool,
}

impl Cli {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn session_config(&self) -> SessionConfig {
        let stop_policy = if self.retain_last_position {
            StopPolicy::RetainLastKnown
        } else {
            StopPolicy::ClearPosition
        };

        SessionConfig {
            tracker: TrackerConfig {
                stop_policy,
                ..TrackerConfig::default()
            },
            follow_user: !self.no_follow,
            ..SessionConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let base = ["waypoint", "--track", "t.json", "--access-token", "pk.test", "--backend-url", "http://localhost:8080/api"];
        Cli::try_parse_from(base.iter().chain(args))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.directions_url.as_str(), "https://api.mapbox.com/");
        assert_eq!(cli.session_config(), SessionConfig::default());
    }

    #[test]
    fn test_negative_coordinates() {
        let cli = parse(&["--to", "Cafe", "--lng", "-73.6", "--lat", "45.6"]).unwrap();
        assert_eq!(cli.lng, Some(-73.6));
        assert_eq!(cli.lat, Some(45.6));
    }

    #[test]
    fn test_destination_needs_coordinates() {
        assert!(parse(&["--to", "Cafe", "--lng", "-73.6"]).is_err());
        assert!(parse(&["--to", "Cafe", "--lng", "-73.6", "--lat", "45.6", "--history", "0"]).is_err());
    }

    #[test]
    fn test_flags_reach_session_config() {
        let config = parse(&["--no-follow", "--retain-last-position"]).unwrap().session_config();
        assert!(!config.follow_user);
        assert_eq!(config.tracker.stop_policy, StopPolicy::RetainLastKnown);
    }
}
