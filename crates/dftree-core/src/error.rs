use core::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io {
        path: Option<PathBuf>,
        source: std::io::Error,
    },
    Normalize {
        instruction: String,
        msg: String,
    },
    OnbuildDepth {
        limit: usize,
    },
    Render {
        msg: String,
    },
}

impl Error {
    pub fn io(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }

    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }

    pub fn normalize(instruction: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Normalize {
            instruction: instruction.into(),
            msg: msg.into(),
        }
    }

    pub const fn onbuild_depth(limit: usize) -> Self {
        Self::OnbuildDepth { limit }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render { msg: msg.into() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                path: Some(path),
                source,
            } => write!(f, "io error reading {}: {source}", path.display()),
            Self::Io { path: None, source } => write!(f, "io error: {source}"),
            Self::Normalize { instruction, msg } => write!(f, "invalid {instruction}: {msg}"),
            Self::OnbuildDepth { limit } => {
                write!(f, "ONBUILD triggers nested deeper than {limit} levels")
            }
            Self::Render { msg } => write!(f, "render error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Io { source, .. } = self {
            Some(source)
        } else {
            None
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::io(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::render(value.to_string())
    }
}
