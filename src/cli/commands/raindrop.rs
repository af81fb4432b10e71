use clap::{Arg, Command};

pub const ARG_RAINDROP_API_URL: &str = "raindrop-api-url";
pub const ARG_RAINDROP_CLIENT_ID: &str = "raindrop-client-id";
pub const ARG_RAINDROP_CLIENT_SECRET: &str = "raindrop-client-secret";
pub const ARG_RAINDROP_APPLICATION_ID: &str = "raindrop-application-id";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_RAINDROP_API_URL)
                .long(ARG_RAINDROP_API_URL)
                .help("Hydro Raindrop API base URL")
                .default_value("https://api.hydrogenplatform.com/hydro/v1/")
                .env("HYDROGATE_RAINDROP_API_URL"),
        )
        .arg(
            Arg::new(ARG_RAINDROP_CLIENT_ID)
                .long(ARG_RAINDROP_CLIENT_ID)
                .help("Hydro Raindrop OAuth client id")
                .env("HYDROGATE_RAINDROP_CLIENT_ID")
                .required(true),
        )
        .arg(
            Arg::new(ARG_RAINDROP_CLIENT_SECRET)
                .long(ARG_RAINDROP_CLIENT_SECRET)
                .help("Hydro Raindrop OAuth client secret")
                .env("HYDROGATE_RAINDROP_CLIENT_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_RAINDROP_APPLICATION_ID)
                .long(ARG_RAINDROP_APPLICATION_ID)
                .help("Hydro Raindrop application id")
                .env("HYDROGATE_RAINDROP_APPLICATION_ID")
                .required(true),
        )
}
