use serde::Serialize;

use ghost_core::config::normalize_base_url;

use crate::cli::ConfigCommands;
use crate::config_profiles::{default_config_path, CliProfilesConfig};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct ResolvedConfigView {
    pub profile: String,
    pub api_base_url: String,
    pub public_uploads: bool,
    pub timeout_secs: u64,
    pub config_path: Option<String>,
}

pub fn run_config(
    command: ConfigCommands,
    global_profile: Option<&str>,
    explicit_api_base_url: Option<String>,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_base_url,
            public_uploads,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            api_base_url.or(explicit_api_base_url),
            public_uploads,
            no_activate,
        ),
        ConfigCommands::Show { profile, json } => {
            let config = CliProfilesConfig::load()?;
            let view =
                resolve_config_view(&config, profile.as_deref().or(global_profile), explicit_api_base_url)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                for line in format_config_lines(&view) {
                    println!("{line}");
                }
            }
            Ok(())
        }
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    api_base_url: Option<String>,
    public_uploads: Option<bool>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load()?;
    let profile_name = init_profile(&mut config, profile_name, api_base_url, public_uploads, no_activate)?;
    let path = config.save()?;
    println!("Profile '{profile_name}' initialized at {}", path.display());
    Ok(())
}

/// Merge explicit values into the named profile and optionally activate it.
pub fn init_profile(
    config: &mut CliProfilesConfig,
    profile_name: Option<&str>,
    api_base_url: Option<String>,
    public_uploads: Option<bool>,
    no_activate: bool,
) -> Result<String, CliError> {
    let profile_name = config.resolve_profile_name(profile_name);
    let api_base_url = ghost_core::util::normalize_text_option(api_base_url)
        .map(|url| normalize_base_url(&url))
        .transpose()?;

    let profile = config.profile_mut_or_default(&profile_name);
    if let Some(url) = api_base_url {
        profile.api_base_url = Some(url);
    }
    if let Some(public_uploads) = public_uploads {
        profile.public_uploads = Some(public_uploads);
    }
    profile.validate()?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }
    Ok(profile_name)
}

pub fn resolve_config_view(
    config: &CliProfilesConfig,
    profile_name: Option<&str>,
    explicit_api_base_url: Option<String>,
) -> Result<ResolvedConfigView, CliError> {
    let profile = config.resolve_profile_name(profile_name);
    let client = config.client_config(&profile, explicit_api_base_url)?;
    Ok(ResolvedConfigView {
        profile,
        api_base_url: client.api_base_url,
        public_uploads: client.public_uploads,
        timeout_secs: client.timeout_secs,
        config_path: default_config_path()
            .ok()
            .map(|path| path.display().to_string()),
    })
}

pub fn format_config_lines(view: &ResolvedConfigView) -> Vec<String> {
    vec![
        format!("Profile:        {}", view.profile),
        format!("API base URL:   {}", view.api_base_url),
        format!("Public uploads: {}", view.public_uploads),
        format!("Timeout:        {}s", view.timeout_secs),
        format!(
            "Config file:    {}",
            view.config_path.as_deref().unwrap_or("unavailable")
        ),
    ]
}
