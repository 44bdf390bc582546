//! Recorded track files

use std::path::Path;

use anyhow::{Context, Result, bail};
use waypoint_geo::Fix;

/// Read a JSON array of fixes
pub fn load(path: &Path) -> Result<Vec<Fix>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read track {}", path.display()))?;
    parse(&text).with_context(|| format!("Invalid track {}", path.display()))
}

fn parse(text: &str) -> Result<Vec<Fix>> {
    let fixes: Vec<Fix> = serde_json::from_str(text)?;
    if fixes.is_empty() {
        bail!("track has no fixes");
    }
    Ok(fixes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_track() {
        let fixes = parse(r#"[{"lat": 45.5, "lng": -73.5, "accuracy": 8.0}, {"lat": 45.51, "lng": -73.51}]"#).unwrap();
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].accuracy, Some(8.0));
    }

    #[test]
    fn test_empty_track_rejected() {
        assert!(parse("[]").is_err());
        assert!(parse("{}").is_err());
    }
}
