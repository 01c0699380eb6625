use std::path::{Path, PathBuf};

pub const STATE_DIR: &str = ".chat_panel";
pub const STATE_FILE_NAME: &str = "client_state.json";

#[must_use]
pub fn state_root(home: &Path) -> PathBuf {
    home.join(STATE_DIR)
}

#[must_use]
pub fn state_file(home: &Path) -> PathBuf {
    state_root(home).join(STATE_FILE_NAME)
}
