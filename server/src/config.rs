use std::path::PathBuf;

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_DIST_DIR: &str = "client/dist";
pub const DEFAULT_DATA_DIR: &str = "data";

/// Files larger than this are skipped when building the catalog.
pub const MAX_DATASET_BYTES: u64 = 64 * 1024 * 1024;

pub fn server_port() -> u16 {
    std::env::var("HAZARDMAP_PORT")
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn dist_dir() -> PathBuf {
    dir_from_env("HAZARDMAP_DIST_DIR", DEFAULT_DIST_DIR)
}

pub fn data_dir() -> PathBuf {
    dir_from_env("HAZARDMAP_DATA_DIR", DEFAULT_DATA_DIR)
}

fn dir_from_env(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_when_unset_or_invalid() {
        temp_env::with_var_unset("HAZARDMAP_PORT", || {
            assert_eq!(server_port(), DEFAULT_SERVER_PORT);
        });
        temp_env::with_var("HAZARDMAP_PORT", Some("not-a-port"), || {
            assert_eq!(server_port(), DEFAULT_SERVER_PORT);
        });
        temp_env::with_var("HAZARDMAP_PORT", Some("0"), || {
            assert_eq!(server_port(), DEFAULT_SERVER_PORT);
        });
    }

    #[test]
    fn port_reads_env() {
        temp_env::with_var("HAZARDMAP_PORT", Some(" 8080 "), || {
            assert_eq!(server_port(), 8080);
        });
    }

    #[test]
    fn empty_dir_values_fall_back() {
        temp_env::with_var("HAZARDMAP_DATA_DIR", Some("   "), || {
            assert_eq!(data_dir(), PathBuf::from(DEFAULT_DATA_DIR));
        });
        temp_env::with_var_unset("HAZARDMAP_DIST_DIR", || {
            assert_eq!(dist_dir(), PathBuf::from(DEFAULT_DIST_DIR));
        });
    }

    #[test]
    fn dir_values_override_defaults() {
        temp_env::with_var("HAZARDMAP_DATA_DIR", Some("/srv/hazards"), || {
            assert_eq!(data_dir(), PathBuf::from("/srv/hazards"));
        });
    }
}
