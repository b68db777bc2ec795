//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        ApplicationError::Domain(e).into()
    }
}

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } | InfraError::Console(_) => exitcode::IOERR,
                InfraError::Application(e) => match e {
                    ApplicationError::Domain(d) => domain_exit_code(d),
                    ApplicationError::RosterParse { .. } => exitcode::DATAERR,
                    ApplicationError::UnitNotFound(_) => exitcode::USAGE,
                    ApplicationError::RosterNotFound(_) => exitcode::NOINPUT,
                    ApplicationError::Config { .. } => exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => exitcode::IOERR,
                },
            },
        }
    }
}

fn domain_exit_code(e: &DomainError) -> i32 {
    match e {
        DomainError::DuplicateKey(_)
        | DomainError::MalformedRecord { .. }
        | DomainError::InvalidDice(_) => exitcode::DATAERR,
        DomainError::InvariantViolation { .. } => exitcode::SOFTWARE,
        DomainError::UnknownCombatKind(_)
        | DomainError::NotPsyker(_)
        | DomainError::NoWeapons(_)
        | DomainError::Slain(_)
        | DomainError::SameUnit(_) => exitcode::USAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        let not_found: CliError = ApplicationError::UnitNotFound("Nobody".into()).into();
        assert_eq!(not_found.exit_code(), exitcode::USAGE);

        let missing: CliError = ApplicationError::RosterNotFound(PathBuf::from("army.txt")).into();
        assert_eq!(missing.exit_code(), exitcode::NOINPUT);

        let malformed: CliError = ApplicationError::RosterParse {
            path: PathBuf::from("army.txt"),
            source: DomainError::malformed("bad").at_line(3),
        }
        .into();
        assert_eq!(malformed.exit_code(), exitcode::DATAERR);

        let broken: CliError = DomainError::InvariantViolation {
            name: "A".into(),
            message: "unbalanced".into(),
        }
        .into();
        assert_eq!(broken.exit_code(), exitcode::SOFTWARE);

        let config: CliError = ApplicationError::Config { message: "x".into() }.into();
        assert_eq!(config.exit_code(), exitcode::CONFIG);

        let io: CliError = InfraError::io("write", std::io::Error::other("disk")).into();
        assert_eq!(io.exit_code(), exitcode::IOERR);

        let console: CliError = InfraError::Console(std::io::Error::other("closed")).into();
        assert_eq!(console.exit_code(), exitcode::IOERR);
        assert_eq!(console.to_string(), "console error: closed");
    }

    #[test]
    fn test_message_passes_through_layers() {
        let err: CliError = DomainError::NotPsyker("Grunt".into()).into();
        assert_eq!(err.to_string(), "Grunt is not a psyker");
    }
}
