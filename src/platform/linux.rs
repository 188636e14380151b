// DevPulse config path for Linux: $XDG_CONFIG_HOME/devpulse or ~/.config/devpulse

use std::env;
use std::path::PathBuf;

pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("devpulse"),
        _ => {
            let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
            PathBuf::from(home).join(".config").join("devpulse")
        }
    }
}
