use std::fmt;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InputReadFailed,
    InputParseFailed,
    ConfigParseError,
    WeightingUnspecified,
    LayoutDiverged,
    RenderInvalid,
    OutputWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputReadFailed => "E1001",
            Self::InputParseFailed => "E1002",
            Self::ConfigParseError => "E1003",
            Self::WeightingUnspecified => "E2001",
            Self::LayoutDiverged => "E3001",
            Self::RenderInvalid => "E4001",
            Self::OutputWriteFailed => "E4002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputReadFailed => "Input file could not be read",
            Self::InputParseFailed => "Input file could not be parsed",
            Self::ConfigParseError => "Config file parse error",
            Self::WeightingUnspecified => "Closeness weighting not specified",
            Self::LayoutDiverged => "Layout produced non-finite positions",
            Self::RenderInvalid => "Invalid render request",
            Self::OutputWriteFailed => "Output file write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InputReadFailed => Some("Check the --input path and its permissions."),
            Self::InputParseFailed => {
                Some("JSON input must be an array of string arrays, e.g. [[\"A\",\"B\"]].")
            }
            Self::ConfigParseError => Some("Fix syntax in linemap.toml and retry."),
            Self::WeightingUnspecified => Some(
                "Pass --weighting raw|inverted or set closeness.weighting in linemap.toml.",
            ),
            Self::LayoutDiverged => Some("Retry with a different --seed or another layout."),
            Self::RenderInvalid => Some("Use a .svg or .dot output with non-zero dimensions."),
            Self::OutputWriteFailed => Some("Check disk space and write permissions."),
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

    const ALL: [ErrorCode; 8] = [
        ErrorCode::InputReadFailed,
        ErrorCode::InputParseFailed,
        ErrorCode::ConfigParseError,
        ErrorCode::WeightingUnspecified,
        ErrorCode::LayoutDiverged,
        ErrorCode::RenderInvalid,
        ErrorCode::OutputWriteFailed,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let s = code.code();
            assert_eq!(s.len(), 5);
            assert!(s.starts_with('E'));
            assert!(s.chars().skip(1).all(|c| c.is_ascii_digit()));
            assert_eq!(code.to_string(), s);
        }
    }

    #[test]
    fn every_code_has_a_hint() {
        assert!(ALL.iter().all(|c| c.hint().is_some()));
    }
}
