use ghost_core::expiration::format_naive_timestamp;
use ghost_core::{calculate_expiration, ExpirationResult, Lifetime};

use crate::error::CliError;

pub fn run_expiry(lifetime: Lifetime, as_json: bool) -> Result<(), CliError> {
    let result = calculate_expiration(lifetime);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in format_expiry_lines(lifetime, &result) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_expiry_lines(lifetime: Lifetime, result: &ExpirationResult) -> Vec<String> {
    let expires_at = result
        .expires_at
        .as_ref()
        .map_or_else(|| "never".to_string(), format_naive_timestamp);
    vec![
        format!("Lifetime:   {}", lifetime.label()),
        format!("Expires at: {expires_at}"),
        format!("Timezone:   {}", result.timezone),
    ]
}
