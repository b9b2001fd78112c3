use std::path::Path;

use base64::Engine;

use crate::error::{Result, SynthError};

pub const DEFAULT_BACKEND_USERDATA: &str = include_str!("../assets/backend-userdata.sh");

const SHEBANG: &str = "#!/bin/bash";

/// fills in the `FQDN=` assignment of a bootstrap script. Only the first
/// assignment is replaced, the script refers to `$FQDN` afterwards.
pub fn render(script: &str, fqdn: &str) -> Result<String> {
    if !script.contains("FQDN=") {
        return Err(SynthError::ConfigError("bootstrap script has no FQDN= assignment to substitute".to_string()));
    }
    let body = script.replacen("FQDN=", &format!("FQDN={fqdn}"), 1);
    if body.starts_with("#!") {
        return Ok(body);
    }
    Ok(format!("{SHEBANG}\n{body}"))
}

pub fn load(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p)
            .map_err(|e| SynthError::io(format!("Failed to read bootstrap script {}", p.display()), e)),
        None => Ok(DEFAULT_BACKEND_USERDATA.to_string()),
    }
}

/// EC2 expects user data base64 encoded
pub fn encode(rendered: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(rendered)
}
