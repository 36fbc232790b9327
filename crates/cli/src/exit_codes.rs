//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: CI jobs rely on them.
//!
//! | Code | Description                                          |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args, missing or invalid config)    |
//! | 3    | Local content could not be read or parsed            |
//! | 4    | Two or more local documents share an identity key    |
//! | 5    | Remote API error (transport, status, decode)         |
//! | 6    | Run finished with recorded failures (continue policy)|
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `recon_exit_code`

use guidesync_client::ClientError;
use guidesync_content::ContentError;
use guidesync_recon::{ConfigError, ReconError};

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// A content file is unreadable, or lacks a title or the content element.
pub const EXIT_CONTENT: u8 = 3;

/// Duplicate identity keys in the local corpus. Nothing was sent.
pub const EXIT_DUPLICATE_IDENTITY: u8 = 4;

/// The remote API failed or rejected a call.
pub const EXIT_REMOTE: u8 = 5;

/// `--on-error continue` finished, but some mutations failed.
pub const EXIT_INCOMPLETE: u8 = 6;

pub fn content_exit_code(err: &ContentError) -> u8 {
    match err {
        ContentError::RootMissing(_) | ContentError::Selector(_) => EXIT_USAGE,
        ContentError::Walk { .. } | ContentError::Parse { .. } => EXIT_CONTENT,
    }
}

pub fn client_exit_code(err: &ClientError) -> u8 {
    match err {
        ClientError::Config(_) => EXIT_USAGE,
        _ => EXIT_REMOTE,
    }
}

pub fn config_exit_code(_err: &ConfigError) -> u8 {
    EXIT_USAGE
}

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::DuplicateIdentity { .. } => EXIT_DUPLICATE_IDENTITY,
        ReconError::Content(e) => content_exit_code(e),
        ReconError::Remote(e) => client_exit_code(e),
        ReconError::Config(e) => config_exit_code(e),
        ReconError::Incomplete { .. } => EXIT_INCOMPLETE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidesync_client::Operation;
    use guidesync_recon::RunReport;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_CONTENT,
            EXIT_DUPLICATE_IDENTITY,
            EXIT_REMOTE,
            EXIT_INCOMPLETE,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn recon_errors_map_to_codes() {
        let dup = ReconError::DuplicateIdentity { groups: vec![] };
        assert_eq!(recon_exit_code(&dup), EXIT_DUPLICATE_IDENTITY);

        let remote = ReconError::Remote(ClientError::Transport {
            operation: Operation::List,
            message: "refused".into(),
        });
        assert_eq!(recon_exit_code(&remote), EXIT_REMOTE);

        let bad_client = ReconError::Remote(ClientError::Config("bad url".into()));
        assert_eq!(recon_exit_code(&bad_client), EXIT_USAGE);

        let parse = ReconError::Content(ContentError::Parse {
            path: "a.html".into(),
            reason: "missing <title>".into(),
        });
        assert_eq!(recon_exit_code(&parse), EXIT_CONTENT);

        let incomplete = ReconError::Incomplete {
            failures: vec![],
            report: RunReport::default(),
        };
        assert_eq!(recon_exit_code(&incomplete), EXIT_INCOMPLETE);
    }
}
