use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use url::Url;

use crate::cli::actions::{Action, SeedUser};
use crate::cli::commands::{self, policy, raindrop};
use crate::gate::config::{MfaMethod, PolicyConfig};
use crate::raindrop::RaindropConfig;

fn parse_seed_user(raw: &str) -> Result<SeedUser> {
    let mut parts = raw.splitn(3, ':');
    let username = parts
        .next()
        .filter(|part| !part.is_empty())
        .ok_or_else(|| anyhow!("seed user {raw:?} is missing a username"))?;
    let password = parts
        .next()
        .filter(|part| !part.is_empty())
        .ok_or_else(|| anyhow!("seed user {raw:?} is missing a password"))?;
    let admin = match parts.next() {
        None => false,
        Some("admin") => true,
        Some(other) => return Err(anyhow!("unknown seed user suffix {other:?}")),
    };
    Ok(SeedUser {
        username: username.to_string(),
        password: password.to_string(),
        admin,
    })
}

/// Build the action from parsed arguments.
///
/// # Errors
/// Returns an error when a required argument is missing or malformed.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let api_base = matches
        .get_one::<String>(raindrop::ARG_RAINDROP_API_URL)
        .ok_or_else(|| anyhow!("missing required argument: --{}", raindrop::ARG_RAINDROP_API_URL))?;
    let api_base = Url::parse(api_base)
        .with_context(|| format!("invalid --{}", raindrop::ARG_RAINDROP_API_URL))?;

    let required = |name: &str| -> Result<String> {
        matches
            .get_one::<String>(name)
            .cloned()
            .ok_or_else(|| anyhow!("missing required argument: --{name}"))
    };

    let raindrop_config = RaindropConfig::new(
        api_base,
        required(raindrop::ARG_RAINDROP_CLIENT_ID)?,
        SecretString::from(required(raindrop::ARG_RAINDROP_CLIENT_SECRET)?),
        required(raindrop::ARG_RAINDROP_APPLICATION_ID)?,
    );

    // Environment first, then explicit flags on top.
    let mut policy_config = PolicyConfig::from_env();
    if let Some(method) = matches.get_one::<MfaMethod>(policy::ARG_MFA_METHOD) {
        policy_config = policy_config.with_method(*method);
    }
    if let Some(max_attempts) = matches.get_one::<u32>(policy::ARG_MAX_ATTEMPTS) {
        policy_config = policy_config.with_max_attempts(*max_attempts);
    }
    if matches.get_flag(policy::ARG_MFA_DISABLED) {
        policy_config = policy_config.with_enabled(false);
    }

    let seed_users = matches
        .get_many::<String>(commands::ARG_SEED_USER)
        .into_iter()
        .flatten()
        .map(|raw| parse_seed_user(raw))
        .collect::<Result<Vec<_>>>()?;

    Ok(Action::Server {
        port: matches
            .get_one::<u16>(commands::ARG_PORT)
            .copied()
            .unwrap_or(8080),
        secure_cookies: matches.get_flag(commands::ARG_SECURE_COOKIES),
        policy: policy_config,
        raindrop: raindrop_config,
        seed_users,
    })
}
