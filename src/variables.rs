use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, SynthError};

/// values that `${NAME}` placeholders in the configuration file resolve to.
/// entries loaded from a .env file take precedence over the process environment.
#[derive(Debug, Default, Clone)]
pub struct Variables {
    dot_env: HashMap<String, String>,
    use_process_env: bool,
}

impl Variables {
    pub fn from_process_env() -> Self {
        Self { dot_env: HashMap::new(), use_process_env: true }
    }

    /// only the given pairs are visible. Used by tests so they do not depend
    /// on whatever the surrounding shell exports.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let dot_env = pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { dot_env, use_process_env: false }
    }

    pub fn load_dot_env<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SynthError::io(format!("Failed to load .env file {}", path.display()), e))?;
        self.dot_env.extend(parse_dot_env(&contents));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(val) = self.dot_env.get(key) {
            return Some(val.clone());
        }
        if self.use_process_env {
            return std::env::var(key).ok();
        }
        None
    }

    /// replaces every `${NAME}` in `input`. Text that is not a placeholder is copied as is.
    pub fn resolve(&self, input: &str) -> Result<String> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = match after.find('}') {
                Some(end) => end,
                None => {
                    return Err(SynthError::ConfigError(format!("unterminated variable in {:?}", input)));
                }
            };
            let name = &after[..end];
            match self.get(name) {
                Some(val) => out.push_str(&val),
                None => return Err(SynthError::UnresolvedVariable(name.to_string())),
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn parse_dot_env(contents: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("#") {
            continue;
        }
        if let Some((key, val)) = line.split_once("=") {
            let val = val.trim().trim_matches('"');
            map.insert(key.trim().to_string(), val.to_string());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_placeholders() {
        let vars = Variables::from_pairs([("ACCOUNT_ID", "123456789012"), ("REGION", "us-east-1")]);
        assert_eq!(vars.resolve("${ACCOUNT_ID}").unwrap(), "123456789012");
        assert_eq!(vars.resolve("arn:${REGION}:${ACCOUNT_ID}").unwrap(), "arn:us-east-1:123456789012");
        assert_eq!(vars.resolve("no placeholders").unwrap(), "no placeholders");
    }

    #[test]
    fn unresolved_placeholders_are_errors() {
        let vars = Variables::from_pairs(Vec::<(String, String)>::new());
        match vars.resolve("${MISSING}") {
            Err(SynthError::UnresolvedVariable(name)) => assert_eq!(name, "MISSING"),
            x => panic!("expected unresolved variable error, got {:?}", x),
        }
        assert!(vars.resolve("${NOPE").is_err());
    }

    #[test]
    fn dot_env_ignores_comments_and_quotes() {
        let map = parse_dot_env("# comment\n\nACCOUNT_ID=\"123456789012\"\nREGION = eu-west-1\n");
        assert_eq!(map.get("ACCOUNT_ID").map(String::as_str), Some("123456789012"));
        assert_eq!(map.get("REGION").map(String::as_str), Some("eu-west-1"));
        assert_eq!(map.len(), 2);
    }
}
