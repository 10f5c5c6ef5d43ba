use crate::auth::{
    clear_stored_session, load_stored_session, AuthError, AuthSession, SupabaseAuthService,
};
use crate::cli::AuthCommands;
use crate::commands::common::{resolve_profile, GlobalOptions, ResolvedProfile};
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, options: &GlobalOptions) -> Result<(), CliError> {
    let resolved = resolve_profile(options)?;
    let profile_name = resolved.name.as_str();
    let service = SupabaseAuthService::for_config(profile_name, &resolved.config)?;

    match command {
        AuthCommands::Login { email, password } => {
            let session = require_service(service, &resolved)?
                .sign_in(&email, &password)
                .await?;
            println!(
                "Signed in profile '{profile_name}' as {}",
                session_label(&session)
            );
        }
        AuthCommands::Google { id_token } => {
            let session = require_service(service, &resolved)?
                .sign_in_with_google(&id_token)
                .await?;
            println!(
                "Signed in profile '{profile_name}' as {}",
                session_label(&session)
            );
        }
        AuthCommands::GoogleUrl { redirect_to } => {
            let url = require_service(service, &resolved)?
                .google_authorize_url(redirect_to.as_deref());
            println!("{url}");
        }
        AuthCommands::Status => {
            let session = match &service {
                Some(service) => service.restore_session().await?,
                None => load_stored_session(profile_name)?,
            };
            let Some(session) = session else {
                println!("Profile '{profile_name}' is not signed in.");
                return Ok(());
            };
            if let Some(service) = &service {
                match service.current_user(&session).await {
                    Ok(user) => tracing::debug!("Server confirmed user {}", user.id),
                    Err(AuthError::NotSignedIn) => {
                        println!("Profile '{profile_name}' session was rejected by the server.");
                        return Ok(());
                    }
                    Err(error) => tracing::warn!("Could not verify session: {}", error),
                }
            }
            println!(
                "Profile '{}' is signed in as {} (expires_at={})",
                profile_name,
                session_label(&session),
                session.expires_at
            );
        }
        AuthCommands::Logout => {
            let stored_session = load_stored_session(profile_name)?;
            if let (Some(service), Some(session)) = (service, stored_session) {
                if let Err(error) = service.sign_out(&session.access_token).await {
                    tracing::warn!("Remote sign-out failed: {}", error);
                }
            }
            clear_stored_session(profile_name)?;
            println!("Signed out profile '{profile_name}'");
        }
    }

    Ok(())
}

fn require_service(
    service: Option<SupabaseAuthService>,
    resolved: &ResolvedProfile,
) -> Result<SupabaseAuthService, CliError> {
    service.ok_or_else(|| CliError::SupabaseNotConfigured(resolved.name.clone()))
}

fn session_label(session: &AuthSession) -> &str {
    session
        .user
        .email
        .as_deref()
        .or(session.user.full_name.as_deref())
        .unwrap_or("(no email)")
}
