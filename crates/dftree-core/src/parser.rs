use std::path::Path;

use tracing::{debug, trace};

use crate::document::Document;
use crate::error::Error;
use crate::identity::{RandomStageIdentity, StageIdentity};
use crate::instruction::{Instruction, Keyword, Tokenized, tokenize};
use crate::normalize::{DefaultNormalizer, Normalizer};
use crate::source::{logical_lines, read_lines};
use crate::value::{Map, Value};

pub const DEFAULT_WORKDIR: &str = "/";
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_MAX_ONBUILD_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Key every stage by a synthetic identifier instead of writing flat.
    pub stage_qualified: bool,
    /// Deepest allowed nesting of `ONBUILD` triggers.
    pub max_onbuild_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            stage_qualified: false,
            max_onbuild_depth: DEFAULT_MAX_ONBUILD_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Flat,
    StageQualified,
    /// ONBUILD trigger sets: everything lands on the root document.
    SubDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    Halted,
}

/// Build context tracked while walking the instructions.
#[derive(Debug)]
struct Context {
    stage: Option<String>,
    workdir: String,
    user: String,
    first_stage: bool,
    deferred: Vec<String>,
    state: State,
}

impl Context {
    fn new(stage: Option<String>) -> Self {
        Self {
            stage,
            workdir: DEFAULT_WORKDIR.to_string(),
            user: DEFAULT_USER.to_string(),
            first_stage: true,
            deferred: Vec::new(),
            state: State::Running,
        }
    }

    fn stage_path(&self) -> Vec<String> {
        self.stage.iter().cloned().collect()
    }

    fn bucket_path(&self, mode: Mode) -> Vec<String> {
        let mut path = self.stage_path();
        if mode != Mode::SubDocument {
            path.extend([
                Keyword::Workdir.field().to_string(),
                self.workdir.clone(),
                self.user.clone(),
            ]);
        }
        path
    }
}

/// Turns Dockerfile instructions into a [`Document`].
///
/// Every `parse_*` call starts from an empty document and a fresh context.
pub struct Parser {
    options: ParseOptions,
    normalizer: Box<dyn Normalizer>,
    identity: Box<dyn StageIdentity>,
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            normalizer: Box::new(DefaultNormalizer),
            identity: Box::new(RandomStageIdentity::new()),
        }
    }

    pub fn with_identity(mut self, identity: impl StageIdentity + 'static) -> Self {
        self.identity = Box::new(identity);
        self
    }

    pub fn with_normalizer(mut self, normalizer: impl Normalizer + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn parse_str(&mut self, input: &str) -> Result<Document, Error> {
        let lines = input.lines().collect::<Vec<_>>();
        self.parse_lines(&logical_lines(&lines))
    }

    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<Document, Error> {
        let lines = read_lines(path.as_ref())?;
        self.parse_lines(&logical_lines(&lines))
    }

    /// Parses already reconstructed logical lines.
    pub fn parse_lines<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<Document, Error> {
        let mode = if self.options.stage_qualified {
            Mode::StageQualified
        } else {
            Mode::Flat
        };
        self.run(lines, mode, 0)
    }

    fn run<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        mode: Mode,
        depth: usize,
    ) -> Result<Document, Error> {
        let stage = (mode == Mode::StageQualified)
            .then(|| self.identity.identify(first_stage_value(lines)));
        let mut context = Context::new(stage);
        let mut document = Document::new();

        let mut lines = lines.iter();
        while context.state == State::Running {
            let Some(line) = lines.next() else {
                break;
            };

            match tokenize(line.as_ref()) {
                Tokenized::Instruction(instruction) => {
                    self.step(&mut document, &mut context, mode, depth, instruction)?;
                }
                Tokenized::Unknown(keyword) => {
                    debug!(%keyword, depth, "halting on unknown instruction");
                    context.state = State::Halted;
                }
            }
        }

        Ok(document)
    }

    fn step(
        &mut self,
        document: &mut Document,
        context: &mut Context,
        mode: Mode,
        depth: usize,
        instruction: Instruction,
    ) -> Result<(), Error> {
        trace!(keyword = %instruction.keyword, raw = %instruction.raw, depth, "dispatching");

        // Stage at the start of the instruction; a FROM may move on.
        let stage = context.stage_path();
        if mode == Mode::StageQualified {
            document.get_or_create(&stage);
        }

        self.dispatch(document, context, mode, instruction)?;

        if !context.deferred.is_empty() {
            let triggers = self.onbuild(&context.deferred, depth)?;
            document
                .get_or_create(&stage)
                .insert(Keyword::Onbuild.field().to_string(), triggers.into_value());
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        document: &mut Document,
        context: &mut Context,
        mode: Mode,
        instruction: Instruction,
    ) -> Result<(), Error> {
        let Instruction { keyword, raw } = instruction;
        let field = keyword.field();
        let stage = context.stage_path();
        let bucket = context.bucket_path(mode);
        let normalizer = &*self.normalizer;

        match keyword {
            Keyword::From => {
                let from = normalizer.from(&raw)?;
                let target = if mode == Mode::StageQualified && !context.first_stage {
                    let id = self.identity.identify(&raw);
                    debug!(stage = %id, from = %raw, "opening build stage");
                    context.stage = Some(id.clone());
                    document.reset(&id)
                } else {
                    context.first_stage = false;
                    document.get_or_create(&stage)
                };
                target.insert(field.to_string(), from);
            }
            Keyword::Maintainer => {
                let value = normalizer.maintainer(&raw)?;
                document
                    .get_or_create(&stage)
                    .insert(field.to_string(), value);
            }
            Keyword::Label => accumulate(
                document.get_or_create(&stage),
                field,
                Value::empty_object(),
                |acc| normalizer.label(acc, &raw),
            )?,
            Keyword::Expose => accumulate(
                document.get_or_create(&stage),
                field,
                Value::empty_array(),
                |acc| normalizer.expose(acc, &raw),
            )?,
            Keyword::Env => accumulate(
                document.get_or_create(&stage),
                field,
                Value::empty_object(),
                |acc| normalizer.env(acc, &raw),
            )?,
            Keyword::Volume => accumulate(
                document.get_or_create(&stage),
                field,
                Value::empty_array(),
                |acc| normalizer.volume(acc, &raw),
            )?,
            Keyword::Run => accumulate(
                document.get_or_create(&bucket),
                field,
                Value::empty_array(),
                |acc| normalizer.run(acc, &raw),
            )?,
            Keyword::Cmd => accumulate(
                document.get_or_create(&bucket),
                field,
                Value::empty_array(),
                |acc| normalizer.cmd(acc, &raw),
            )?,
            Keyword::Add => accumulate(
                document.get_or_create(&bucket),
                field,
                Value::empty_array(),
                |acc| normalizer.add(acc, &raw),
            )?,
            Keyword::Copy => accumulate(
                document.get_or_create(&bucket),
                field,
                Value::empty_array(),
                |acc| normalizer.copy(acc, &raw),
            )?,
            Keyword::Entrypoint => {
                let value = normalizer.entrypoint(&raw)?;
                document
                    .get_or_create(&bucket)
                    .insert(field.to_string(), value);
            }
            Keyword::User => context.user = raw,
            Keyword::Workdir => context.workdir = raw,
            Keyword::Onbuild => context.deferred.push(raw),
        }
        Ok(())
    }

    /// Re-parses the whole trigger buffer as a flat sub-document.
    fn onbuild(&mut self, triggers: &[String], depth: usize) -> Result<Document, Error> {
        let depth = depth + 1;
        if depth > self.options.max_onbuild_depth {
            return Err(Error::onbuild_depth(self.options.max_onbuild_depth));
        }
        debug!(triggers = triggers.len(), depth, "parsing ONBUILD triggers");
        self.run(triggers, Mode::SubDocument, depth)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}

/// Replaces `field` with the normalized successor of its current value.
fn accumulate(
    target: &mut Map,
    field: &str,
    empty: Value,
    normalize: impl FnOnce(Value) -> Result<Value, Error>,
) -> Result<(), Error> {
    let accumulated = target
        .get_mut(field)
        .map(std::mem::take)
        .unwrap_or(empty);
    let value = normalize(accumulated)?;
    target.insert(field.to_string(), value);
    Ok(())
}

/// Last word of the first line that starts with a literal `FROM `.
fn first_stage_value<S: AsRef<str>>(lines: &[S]) -> &str {
    lines
        .iter()
        .find_map(|line| {
            let mut words = line.as_ref().split(' ').map(str::trim);
            if words.next() != Some("FROM") {
                return None;
            }
            Some(words.last().unwrap_or("FROM"))
        })
        .unwrap_or_default()
}

pub fn parse_dockerfile(input: &str, options: ParseOptions) -> Result<Document, Error> {
    Parser::new(options).parse_str(input)
}

pub fn parse_file(path: impl AsRef<Path>, options: ParseOptions) -> Result<Document, Error> {
    Parser::new(options).parse_file(path)
}
