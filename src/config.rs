use directories::ProjectDirs;
use sheetsmith_core::Config;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB
const FILES_DIR_ENV: &str = "SHEETSMITH_FILES_DIR";

/// Load the config from `explicit` or the platform config directory.
///
/// Problems never stop the program: they come back as warnings and the
/// defaults are used in place of anything unreadable.
pub fn load_config(explicit: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let config_path = explicit.map(Path::to_path_buf).or_else(user_config_path);
    let mut config = Config::default();

    if let Some(path) = config_path.as_ref() {
        if path.exists() {
            match std::fs::metadata(path) {
                Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
                    warnings.push(format!(
                        "Refusing to read {}: file too large ({} bytes, max {})",
                        path.display(),
                        meta.len(),
                        MAX_CONFIG_FILE_BYTES
                    ));
                }
                Ok(_) => match std::fs::read_to_string(path) {
                    Ok(content) => match toml::from_str::<Config>(&content) {
                        Ok(parsed) => config = parsed,
                        Err(err) => {
                            warnings.push(format!("Failed to parse {}: {}", path.display(), err))
                        }
                    },
                    Err(err) => {
                        warnings.push(format!("Failed to read {}: {}", path.display(), err))
                    }
                },
                Err(err) => warnings.push(format!(
                    "Failed to read metadata for {}: {}",
                    path.display(),
                    err
                )),
            }
        } else if explicit.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
    }

    if let Some(dir) = std::env::var_os(FILES_DIR_ENV).filter(|v| !v.is_empty()) {
        config.files_dir = Some(PathBuf::from(dir));
    }

    (config, warnings)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "sheetsmith")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}
