use clap::{builder::ValueParser, Arg, ArgAction, Command};

use crate::gate::config::MfaMethod;

pub const ARG_MFA_METHOD: &str = "mfa-method";
pub const ARG_MAX_ATTEMPTS: &str = "max-attempts";
pub const ARG_MFA_DISABLED: &str = "mfa-disabled";

fn validator_method() -> ValueParser {
    ValueParser::from(
        move |value: &str| -> std::result::Result<MfaMethod, String> {
            MfaMethod::from_str(value)
                .ok_or_else(|| "expected one of: optional, prompted, enforced".to_string())
        },
    )
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MFA_METHOD)
                .long(ARG_MFA_METHOD)
                .help("Enrollment policy: optional, prompted or enforced")
                .env("HYDROGATE_MFA_METHOD")
                .value_parser(validator_method()),
        )
        .arg(
            Arg::new(ARG_MAX_ATTEMPTS)
                .long(ARG_MAX_ATTEMPTS)
                .help("Failed verifications tolerated before lockout (0 = unlimited)")
                .env("HYDROGATE_MAX_ATTEMPTS")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_MFA_DISABLED)
                .long(ARG_MFA_DISABLED)
                .help("Disable the MFA gate entirely; logins pass straight through")
                .env("HYDROGATE_MFA_DISABLED")
                .action(ArgAction::SetTrue),
        )
}
