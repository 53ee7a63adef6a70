use core::fmt;

/// Recognized Dockerfile instruction keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    From,
    Maintainer,
    Run,
    Cmd,
    Label,
    Expose,
    Env,
    Add,
    Copy,
    Entrypoint,
    Volume,
    User,
    Workdir,
    Onbuild,
}

impl Keyword {
    pub const ALL: [Self; 14] = [
        Self::From,
        Self::Maintainer,
        Self::Run,
        Self::Cmd,
        Self::Label,
        Self::Expose,
        Self::Env,
        Self::Add,
        Self::Copy,
        Self::Entrypoint,
        Self::Volume,
        Self::User,
        Self::Workdir,
        Self::Onbuild,
    ];

    /// Case-insensitive keyword lookup.
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|keyword| keyword.as_str().eq_ignore_ascii_case(token))
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::From => "FROM",
            Self::Maintainer => "MAINTAINER",
            Self::Run => "RUN",
            Self::Cmd => "CMD",
            Self::Label => "LABEL",
            Self::Expose => "EXPOSE",
            Self::Env => "ENV",
            Self::Add => "ADD",
            Self::Copy => "COPY",
            Self::Entrypoint => "ENTRYPOINT",
            Self::Volume => "VOLUME",
            Self::User => "USER",
            Self::Workdir => "WORKDIR",
            Self::Onbuild => "ONBUILD",
        }
    }

    /// Document key for the instruction's data.
    pub const fn field(self) -> &'static str {
        match self {
            Self::From => "from",
            Self::Maintainer => "maintainer",
            Self::Run => "run",
            Self::Cmd => "cmd",
            Self::Label => "label",
            Self::Expose => "expose",
            Self::Env => "env",
            Self::Add => "add",
            Self::Copy => "copy",
            Self::Entrypoint => "entrypoint",
            Self::Volume => "volume",
            Self::User => "user",
            Self::Workdir => "workdir",
            Self::Onbuild => "onbuild",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub keyword: Keyword,
    /// Arguments with whitespace runs collapsed to single spaces.
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tokenized {
    Instruction(Instruction),
    /// First word is not an instruction keyword (empty for blank lines).
    Unknown(String),
}

/// Splits a logical line into its keyword and argument string.
pub fn tokenize(line: &str) -> Tokenized {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Tokenized::Unknown(String::new());
    };

    match Keyword::parse(first) {
        Some(keyword) => Tokenized::Instruction(Instruction {
            keyword,
            raw: words.collect::<Vec<_>>().join(" "),
        }),
        None => Tokenized::Unknown(first.to_string()),
    }
}
