use crate::cli::FilterArgs;
use crate::commands::common::{apply_filter, format_view_lines, open_controller, ResolvedProfile};
use crate::error::CliError;

pub async fn run_list(
    resolved: &ResolvedProfile,
    filter: &FilterArgs,
    as_json: bool,
) -> Result<(), CliError> {
    let mut controller = open_controller(resolved).await?;
    let view = apply_filter(&mut controller, filter);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        for line in format_view_lines(&view) {
            println!("{line}");
        }
    }

    Ok(())
}
