use std::fmt;

/// Machine-readable error codes surfaced by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidParameter,
    InputNotFound,
    InputReadFailed,
    SchemaMismatch,
    RowParseFailed,
    InvalidLength,
    InvalidWeight,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidParameter => "E1002",
            Self::InputNotFound => "E2001",
            Self::InputReadFailed => "E2002",
            Self::SchemaMismatch => "E3001",
            Self::RowParseFailed => "E3002",
            Self::InvalidLength => "E3003",
            Self::InvalidWeight => "E4001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidParameter => "Invalid estimator parameter",
            Self::InputNotFound => "Input file not found",
            Self::InputReadFailed => "Input file read failed",
            Self::SchemaMismatch => "Input header does not match src,dst,length",
            Self::RowParseFailed => "Input row could not be parsed",
            Self::InvalidLength => "Edge length is not a finite number",
            Self::InvalidWeight => "Edge length is negative or not finite",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in roadcent.toml and retry."),
            Self::InvalidParameter => Some("Use a pivot count of at least 1, or `--exact`."),
            Self::InputNotFound => Some("Pass the edge list path explicitly or set input.path."),
            Self::InputReadFailed => Some("Check file permissions and that the file is not truncated."),
            Self::SchemaMismatch => {
                Some("The header must name exactly the columns src, dst and length.")
            }
            Self::RowParseFailed => {
                Some("src and dst must be 32-bit integers and length a decimal number.")
            }
            Self::InvalidLength => Some("Replace NaN/inf lengths before loading."),
            Self::InvalidWeight => Some("Fix the lengths, or rerun with `--weight hops`."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::InvalidParameter,
            ErrorCode::InputNotFound,
            ErrorCode::InputReadFailed,
            ErrorCode::SchemaMismatch,
            ErrorCode::RowParseFailed,
            ErrorCode::InvalidLength,
            ErrorCode::InvalidWeight,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::RowParseFailed.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(ErrorCode::SchemaMismatch.to_string(), "E3001");
    }
}
