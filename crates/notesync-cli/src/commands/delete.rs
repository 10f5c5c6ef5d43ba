use crate::commands::common::{open_controller, parse_note_id, ResolvedProfile};
use crate::error::CliError;

/// Delete a note. Without `--password` the configured admin secret is used;
/// with neither the request is cancelled.
pub async fn run_delete(
    resolved: &ResolvedProfile,
    raw_id: &str,
    password: Option<&str>,
) -> Result<(), CliError> {
    let id = parse_note_id(raw_id)?;
    let mut controller = open_controller(resolved).await?;
    let password = password.or(resolved.config.admin_secret.as_deref());

    if !controller.delete_note(id, password).await? {
        println!("Delete cancelled.");
    }
    Ok(())
}
