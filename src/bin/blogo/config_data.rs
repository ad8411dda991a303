use std::fs;
use std::io;
use std::path::Path;

const CONFIG_SAMPLE: &str = r#"[blog]
name = "Blogo"
title = "My blog"
# Timestamps are stored in this offset
utc_offset = "+00:00"
page_size = 10

# Every value here can be overridden with BLOGO_USERNAME, BLOGO_PASSWORD,
# BLOGO_SECRET_KEY and BLOGO_COOKIE_NAME, also read from a .env file
[auth]
username = "admin"
password = "change-me-please"
secret_key = "{{SECRET_KEY}}"
cookie_name = "blogo_session"
token_validity_secs = 86400

# For the file locations, If you want it to be relative to the executable directory
# use ${exe_dir}/location
[paths]
public_dir = "res/public"
data_file = "data/blogo.json"

[server]
address = "0.0.0.0"
port = 8001

# Remove this section to log to the console only
[log]
level = "Info"
log_to_console = true
"#;

pub(crate) fn write_sample_cfg(file_path: &Path) -> io::Result<()> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, get_sample_cfg())
}

/// The secret is a placeholder, long enough to start but meant to be replaced.
fn get_sample_cfg() -> String {
    let secret_key = format!("replace-me-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default());
    CONFIG_SAMPLE.replace("{{SECRET_KEY}}", &format!("{:-<40}", secret_key))
}
