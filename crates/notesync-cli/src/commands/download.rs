use std::path::{Path, PathBuf};

use crate::commands::common::{open_controller, parse_note_id, ResolvedProfile};
use crate::error::CliError;

pub async fn run_download(
    resolved: &ResolvedProfile,
    raw_id: &str,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let id = parse_note_id(raw_id)?;
    let controller = open_controller(resolved).await?;
    let file = controller.download(id).await?;

    let path = output.map_or_else(
        || default_output_path(&file.file_name, raw_id),
        Path::to_path_buf,
    );
    tokio::fs::write(&path, &file.bytes).await?;
    println!("{}", path.display());
    Ok(())
}

/// Keep only the final component of a stored name so downloads land in the
/// working directory.
pub fn default_output_path(file_name: &str, raw_id: &str) -> PathBuf {
    Path::new(file_name)
        .file_name()
        .map_or_else(
            || PathBuf::from(format!("note-{}", raw_id.trim())),
            PathBuf::from,
        )
}
