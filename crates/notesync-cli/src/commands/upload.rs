use std::path::PathBuf;

use notesync_core::backend::UploadFile;
use notesync_core::upload::UploadForm;
use notesync_core::NoteType;

use crate::commands::common::{build_controller, ResolvedProfile};
use crate::error::CliError;

#[derive(Debug, Clone)]
pub struct UploadArgs {
    pub title: String,
    pub subject: String,
    pub note_type: NoteType,
    pub description: Option<String>,
    pub author: Option<String>,
    pub file: Option<PathBuf>,
}

pub async fn run_upload(resolved: &ResolvedProfile, args: UploadArgs) -> Result<(), CliError> {
    let mut controller = build_controller(resolved)?;
    controller.open_upload().await?;

    let file = match args.file.as_deref() {
        Some(path) => match UploadFile::from_path(path).await {
            Ok(file) => Some(file),
            Err(error) => {
                controller.close_upload();
                return Err(error.into());
            }
        },
        None => None,
    };
    controller.set_form(UploadForm {
        title: args.title,
        subject: args.subject,
        note_type: args.note_type,
        description: args.description.unwrap_or_default(),
        author: args.author.unwrap_or_default(),
        file,
    });

    let receipt = controller.submit_upload().await?;
    if let Some(note) = receipt.note {
        println!("{}", note.id);
    }
    Ok(())
}
