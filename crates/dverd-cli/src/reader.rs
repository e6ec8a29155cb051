use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// A file with its path and content.
pub struct ErdFile {
    pub path: String,
    pub content: String,
}

/// Project configuration from dverd.config.yaml.
#[derive(Debug, Deserialize)]
pub struct DverdConfig {
    pub url: Option<String>,
    pub prefix: Option<String>,
    pub sources: Option<Vec<String>>,
}

/// Read ERD files from a path (file or directory).
pub fn read_erd_files(input_path: &Path) -> Result<Vec<ErdFile>, String> {
    if !input_path.exists() {
        return Err(format!("Path does not exist: {}", input_path.display()));
    }

    if input_path.is_file() {
        let content = fs::read_to_string(input_path)
            .map_err(|e| format!("Failed to read {}: {}", input_path.display(), e))?;
        return Ok(vec![ErdFile {
            path: input_path.to_string_lossy().to_string(),
            content,
        }]);
    }

    if input_path.is_dir() {
        // Check for dverd.config.yaml
        let config_path = input_path.join("dverd.config.yaml");
        if config_path.exists() {
            return read_from_config(&config_path, input_path);
        }

        // Default: scan for *.erd and *.dbml files
        return scan_directory(input_path);
    }

    Err(format!(
        "Path is neither a file nor a directory: {}",
        input_path.display()
    ))
}

/// Read project config from dverd.config.yaml if it exists. For a file
/// input, the config is looked up next to the file.
pub fn read_project_config(input_path: &Path) -> Option<DverdConfig> {
    let dir = if input_path.is_dir() {
        input_path
    } else {
        input_path.parent()?
    };
    let config_path = dir.join("dverd.config.yaml");
    if !config_path.exists() {
        return None;
    }

    let content = fs::read_to_string(&config_path).ok()?;
    serde_yaml::from_str(&content).ok()
}

fn scan_directory(dir_path: &Path) -> Result<Vec<ErdFile>, String> {
    let pattern_erd = dir_path.join("**/*.erd");
    let pattern_dbml = dir_path.join("**/*.dbml");

    let mut paths: Vec<PathBuf> = Vec::new();

    for pattern in [&pattern_erd, &pattern_dbml] {
        let pattern_str = pattern.to_string_lossy().replace('\\', "/");
        let entries =
            glob::glob(&pattern_str).map_err(|e| format!("Invalid glob pattern: {}", e))?;

        for entry in entries {
            match entry {
                Ok(path) => {
                    if !paths.contains(&path) {
                        paths.push(path);
                    }
                }
                Err(e) => {
                    return Err(format!("Glob error: {}", e));
                }
            }
        }
    }

    paths.sort();

    let mut files = Vec::new();
    for path in paths {
        let content = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        files.push(ErdFile {
            path: path.to_string_lossy().to_string(),
            content,
        });
    }

    Ok(files)
}

fn read_from_config(config_path: &Path, base_dir: &Path) -> Result<Vec<ErdFile>, String> {
    let yaml_content =
        fs::read_to_string(config_path).map_err(|e| format!("Failed to read config: {}", e))?;

    let config: DverdConfig =
        serde_yaml::from_str(&yaml_content).map_err(|e| format!("Invalid YAML config: {}", e))?;

    let source_patterns = match config.sources {
        Some(ref s) if !s.is_empty() => s.clone(),
        _ => return scan_directory(base_dir),
    };

    let mut files: Vec<ErdFile> = Vec::new();
    let mut seen: std::collections::HashSet<PathBuf> = std::collections::HashSet::new();

    for pattern in &source_patterns {
        let full_pattern = base_dir.join(pattern);
        let pattern_str = full_pattern.to_string_lossy().replace('\\', "/");
        let entries = glob::glob(&pattern_str)
            .map_err(|e| format!("Invalid glob pattern '{}': {}", pattern, e))?;

        let mut matched: Vec<PathBuf> = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => {
                    if !seen.contains(&path) {
                        seen.insert(path.clone());
                        matched.push(path);
                    }
                }
                Err(e) => return Err(format!("Glob error: {}", e)),
            }
        }
        matched.sort();

        for path in matched {
            let content = fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            files.push(ErdFile {
                path: path.to_string_lossy().to_string(),
                content,
            });
        }
    }

    Ok(files)
}
