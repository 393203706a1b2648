//! `.env` file loading.
//!
//! Lines are `KEY=value`, optionally prefixed with `export`. Values may be bare
//! (a trailing `# comment` is dropped), single-quoted (literal) or
//! double-quoted (with `\n`, `\r`, `\t`, `\\` and `\"` escapes). Variables
//! already present in the process environment are never overwritten.

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum EnvFileError {
    #[error("env file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}: {message}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

#[derive(Debug)]
pub struct LoadedEnvFile {
    pub path: PathBuf,
    pub explicit: bool,
    /// Assignments actually applied (not shadowed by the process environment).
    pub applied: usize,
}

/// Load `explicit` if given (it must exist), else `./.env` when present.
pub fn load_from(explicit: Option<&Path>) -> Result<Option<LoadedEnvFile>, EnvFileError> {
    let (path, is_explicit) = match explicit {
        Some(path) if !path.is_file() => return Err(EnvFileError::NotFound(path.to_path_buf())),
        Some(path) => (path.to_path_buf(), true),
        None => {
            let cwd = std::env::current_dir().map_err(|source| EnvFileError::Io {
                path: PathBuf::from("."),
                source,
            })?;
            let default_path = cwd.join(".env");
            if !default_path.is_file() {
                return Ok(None);
            }
            (default_path, false)
        }
    };

    let text = fs::read_to_string(&path).map_err(|source| EnvFileError::Io {
        path: path.clone(),
        source,
    })?;
    let assignments = parse(&text).map_err(|(line, message)| EnvFileError::Syntax {
        path: path.clone(),
        line,
        message,
    })?;

    let mut applied = 0;
    for (key, value) in assignments {
        if std::env::var_os(&key).is_none() {
            // Mutating the process environment is unsafe once threads exist; this runs first in main.
            unsafe {
                std::env::set_var(key, value);
            }
            applied += 1;
        }
    }
    Ok(Some(LoadedEnvFile {
        path,
        explicit: is_explicit,
        applied,
    }))
}

/// All assignments in file order; errors carry the 1-based line number.
fn parse(text: &str) -> Result<Vec<(String, String)>, (usize, String)> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| parse_line(line).map_err(|e| (i + 1, e)).transpose())
        .collect()
}

fn parse_line(line: &str) -> Result<Option<(String, String)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);

    let (key, raw) = line.split_once('=').ok_or_else(|| "missing '=' in assignment".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("environment variable name cannot be empty".to_string());
    }
    if key.contains(char::is_whitespace) {
        return Err(format!("environment variable name contains whitespace: {key}"));
    }
    Ok(Some((key.to_string(), parse_value(raw.trim())?)))
}

fn parse_value(raw: &str) -> Result<String, String> {
    if let Some(rest) = raw.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = rest.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '\\' => match chars.next() {
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some(other) => value.push(other),
                    None => return Err("unterminated escape sequence in double-quoted value".to_string()),
                },
                '"' => return closed(value, chars.as_str(), "double"),
                other => value.push(other),
            }
        }
        Err("unterminated double-quoted value".to_string())
    } else if let Some(rest) = raw.strip_prefix('\'') {
        match rest.split_once('\'') {
            Some((value, tail)) => closed(value.to_string(), tail, "single"),
            None => Err("unterminated single-quoted value".to_string()),
        }
    } else {
        let bare = raw.split_once('#').map_or(raw, |(value, _)| value);
        Ok(bare.trim_end().to_string())
    }
}

/// Only whitespace or a comment may follow a closing quote.
fn closed(value: String, tail: &str, quote: &str) -> Result<String, String> {
    let tail = tail.trim();
    if tail.is_empty() || tail.starts_with('#') {
        Ok(value)
    } else {
        Err(format!("unexpected characters after closing {quote} quote"))
    }
}
