use std::io::{self, Write};

/// Every way a subsystem run can end.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum Outcome {
    /// Everything executed correctly.
    NoError,
    /// The file would need to be overridden, but `--force` was not passed.
    OverrideNoForce(String),
    /// `subsys` needs to be run beforehand to produce `fname`.
    RequiredFileFromSubsystemNonexistant { subsys: &'static str, fname: String },
    /// `subsys` needs to be run beforehand to produce the data described by `desc`.
    RequiredDataFromSubsystemNonexistant { subsys: &'static str, desc: String },
    /// The backend refused a request.
    TwitterAPIError(String),
    /// `desc` could not be parsed.
    FileParsingFailed { desc: &'static str, errors: Vec<String> },
    /// Reading or writing state failed while doing `desc`.
    Io { desc: String, error: String },
}

impl Outcome {
    /// Print the user-facing description of this outcome.
    ///
    /// ```
    /// # use tweetr::Outcome;
    /// let mut out = Vec::new();
    /// Outcome::OverrideNoForce("doctest".to_string()).print_error(&mut out).unwrap();
    /// assert_eq!(String::from_utf8(out).unwrap(),
    ///            "File \"doctest\" was not overriden to prevent data loss.\n\
    ///             Pass --force to override it.\n");
    /// ```
    pub fn print_error<W: Write>(&self, err_out: &mut W) -> io::Result<()> {
        match self {
            Outcome::NoError => Ok(()),
            Outcome::OverrideNoForce(fname) => {
                writeln!(err_out, "File \"{fname}\" was not overriden to prevent data loss.")?;
                writeln!(err_out, "Pass --force to override it.")
            }
            Outcome::RequiredFileFromSubsystemNonexistant { subsys, fname } => {
                writeln!(err_out, "Run the {subsys} subsystem first to produce \"{fname}\".")
            }
            Outcome::RequiredDataFromSubsystemNonexistant { subsys, desc } => {
                writeln!(err_out, "Run the {subsys} subsystem first to {desc}.")
            }
            Outcome::TwitterAPIError(error) => writeln!(err_out, "Twitter API error: {error}"),
            Outcome::FileParsingFailed { desc, errors } => {
                let sep = if errors.is_empty() { '.' } else { ':' };
                writeln!(err_out, "Failed to parse {desc}{sep}")?;
                for err in errors {
                    writeln!(err_out, "  {err}")?;
                }
                Ok(())
            }
            Outcome::Io { desc, error } => writeln!(err_out, "I/O error while {desc}: {error}"),
        }
    }

    /// The process exit code for this outcome.
    pub fn exit_value(&self) -> i32 {
        match self {
            Outcome::NoError => 0,
            Outcome::OverrideNoForce(_) => 1,
            Outcome::RequiredFileFromSubsystemNonexistant { .. }
            | Outcome::RequiredDataFromSubsystemNonexistant { .. } => 2,
            Outcome::TwitterAPIError(_) => 3,
            Outcome::FileParsingFailed { .. } => 4,
            Outcome::Io { .. } => 5,
        }
    }

    pub(crate) fn io(desc: impl Into<String>, error: io::Error) -> Self {
        Outcome::Io {
            desc: desc.into(),
            error: error.to_string(),
        }
    }
}

impl From<crate::backend::BackendError> for Outcome {
    fn from(e: crate::backend::BackendError) -> Self {
        Outcome::TwitterAPIError(e.to_string())
    }
}
