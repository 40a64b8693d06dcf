//! Process exit codes
//!
//! Library errors map onto these through `mt_core::Error::exit_code`.

/// Exit status of an `mt` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    UsageError = 2,
    NetworkError = 3,
    AuthError = 4,
    NotFound = 5,
    Conflict = 6,
}

impl ExitCode {
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExitCode::Success),
            1 => Some(ExitCode::GeneralError),
            2 => Some(ExitCode::UsageError),
            3 => Some(ExitCode::NetworkError),
            4 => Some(ExitCode::AuthError),
            5 => Some(ExitCode::NotFound),
            6 => Some(ExitCode::Conflict),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Exit code for a library error
    pub fn from_error(error: &mt_core::Error) -> Self {
        Self::from_i32(error.exit_code()).unwrap_or(ExitCode::GeneralError)
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        for code in 0..=6 {
            assert_eq!(ExitCode::from_i32(code).unwrap().as_i32(), code);
        }
        assert_eq!(ExitCode::from_i32(42), None);
    }

    #[test]
    fn test_from_error() {
        let err = mt_core::Error::InvalidPath("bad".into());
        assert_eq!(ExitCode::from_error(&err), ExitCode::UsageError);

        let err = mt_core::Error::Remote(mt_core::RemoteError {
            status: 404,
            server_code: None,
            server_message: None,
            request_id: None,
            path: "/acct/stor/x".into(),
        });
        assert_eq!(ExitCode::from_error(&err), ExitCode::NotFound);
    }
}
