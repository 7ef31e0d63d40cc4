//! Workspace path rules and the embedded bootstrap script.

use std::path::{Component, Path, PathBuf};

use anyhow::Result;

use crate::domain::error::LifecycleError;

/// Validate an operator-supplied workspace path.
///
/// The path must be relative and must not climb out of the workspace with
/// `..`. Returns the normalized relative path using `/` separators.
///
/// # Errors
///
/// Returns `LifecycleError::InvalidPath` for absolute, empty, or escaping paths.
pub fn validate_relative_path(raw: &str) -> Result<String> {
    let invalid = || LifecycleError::InvalidPath(raw.to_string());
    let path = Path::new(raw);
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(invalid)?),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(invalid().into());
            }
        }
    }
    if parts.is_empty() {
        return Err(invalid().into());
    }
    Ok(parts.join("/"))
}

/// Join a validated relative path onto the remote workspace directory.
#[must_use]
pub fn remote_join(remote_dir: &str, relative: &str) -> String {
    format!("{}/{relative}", remote_dir.trim_end_matches('/'))
}

/// Join a validated relative path onto the local workspace directory.
#[must_use]
pub fn local_join(local_dir: &Path, relative: &str) -> PathBuf {
    relative.split('/').fold(local_dir.to_path_buf(), |p, part| p.join(part))
}

/// Source argument that copies a directory's contents rather than the
/// directory itself.
#[must_use]
pub fn contents_of(dir: &str) -> String {
    format!("{}/.", dir.trim_end_matches('/'))
}

/// Quote a string for a POSIX shell.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Default bootstrap: install the notebook stack into a venv and start the
/// server detached, then print its log so the token can be read.
#[must_use]
pub fn bootstrap_script(venv_name: &str, port: u16) -> String {
    format!(
        r#"
set -e
apt update -y
apt upgrade -y
apt install -y python3.12-venv jupyter-notebook

cd /scratch
python3 -m venv {venv_name}
source {venv_name}/bin/activate
pip install --upgrade pip
pip install jupyterlab ipykernel
python3 -m ipykernel install --user --name={venv_name} --display-name "Python ({venv_name})"
setsid jupyter notebook --no-browser --port={port} --allow-root --ip=0.0.0.0 --notebook-dir=/scratch > /tmp/jupyter.log 2>&1 < /dev/null &
sleep 5
cat /tmp/jupyter.log
"#
    )
}
