pub mod logging;
pub mod policy;
pub mod raindrop;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";
pub const ARG_SEED_USER: &str = "seed-user";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("hydrogate")
        .about("HydroID multi-factor authentication gate")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("HYDROGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long(ARG_SECURE_COOKIES)
                .help("Mark cookies Secure even without an x-forwarded-proto hint")
                .env("HYDROGATE_SECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_SEED_USER)
                .long(ARG_SEED_USER)
                .help("Provision a user at startup, formatted user:password[:admin]")
                .env("HYDROGATE_SEED_USER")
                .action(ArgAction::Append),
        );

    let command = raindrop::with_args(command);
    let command = policy::with_args(command);
    logging::with_args(command)
}
