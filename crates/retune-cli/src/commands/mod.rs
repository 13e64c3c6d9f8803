pub mod check;
pub mod config;
pub mod plan;

use std::io::Read;
use std::path::{Path, PathBuf};

use retune_core::RetuneConfig;

/// Read a request snapshot from a file, or stdin when the path is `-`.
pub fn read_input(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()).into())
}

/// Load config from an explicit path, or the default location.
pub fn load_config(path: Option<&PathBuf>) -> Result<RetuneConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => RetuneConfig::load_from(p)?,
        None => RetuneConfig::load()?,
    };
    Ok(config)
}
