use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Normalize = 3,
    OnbuildDepth = 5,
    Io = 6,
    Render = 7,
    Usage = 64,
}

impl ExitCode {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(value: &Error) -> Self {
        match value {
            Error::Io { .. } => Self::Io,
            Error::Normalize { .. } => Self::Normalize,
            Error::OnbuildDepth { .. } => Self::OnbuildDepth,
            Error::Render { .. } => Self::Render,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::exit_code::ExitCode;

    #[test]
    fn maps_error_variants_to_exit_codes() {
        assert_eq!(
            ExitCode::from(&Error::normalize("FROM", "requires an image")),
            ExitCode::Normalize
        );
        assert_eq!(
            ExitCode::from(&Error::onbuild_depth(16)),
            ExitCode::OnbuildDepth
        );
        assert_eq!(
            ExitCode::from(&Error::io(std::io::Error::from(std::io::ErrorKind::Other))),
            ExitCode::Io
        );
        assert_eq!(ExitCode::from(&Error::render("bad")), ExitCode::Render);
        assert_eq!(ExitCode::Usage.as_i32(), 64);
    }
}
