use std::io::{Read, Write};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum, error::ErrorKind};
use clap_complete::{
    generate,
    shells::{Bash, Fish, Zsh},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use dftree_core::Error;
use dftree_core::document::Document;
use dftree_core::exit_code::ExitCode;
use dftree_core::parser::{DEFAULT_MAX_ONBUILD_DEPTH, ParseOptions, parse_dockerfile, parse_file};

const LONG_ABOUT: &str = "Parse a Dockerfile into a JSON tree of build contexts.\n\nStage-wide instructions (FROM, MAINTAINER, LABEL, EXPOSE, ENV, VOLUME, ONBUILD) sit on the stage. RUN, CMD, ADD, COPY and ENTRYPOINT are grouped under workdir -> WORKDIR path -> USER. Parsing stops quietly at the first instruction it does not know.";

const AFTER_HELP: &str = "Examples:\n  dftree\n  dftree -f build/Dockerfile --compact\n  dftree --stage-ids -f Dockerfile.multi\n  cat Dockerfile | dftree --stdin\n  dftree completion zsh > _dftree";

fn main() {
    let code = match run() {
        Ok(()) => ExitCode::Success,
        Err(app_error) => {
            if !app_error.message.is_empty() {
                eprintln!("{}", app_error.message);
            }
            app_error.code
        }
    };
    std::process::exit(code.as_i32());
}

#[derive(Debug)]
struct AppError {
    code: ExitCode,
    message: String,
}

impl AppError {
    fn usage(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::Usage,
            message: message.into(),
        }
    }
}

impl From<Error> for AppError {
    fn from(value: Error) -> Self {
        Self {
            code: ExitCode::from(&value),
            message: value.to_string(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum, value_name = "SHELL")]
        shell: CompletionShell,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Debug, Parser)]
#[command(
    name = "dftree",
    version,
    about = "Turn a Dockerfile into a JSON build-context tree",
    long_about = LONG_ABOUT,
    after_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(
        short = 'f',
        long = "file",
        value_name = "PATH",
        help = "Read Dockerfile from a file path",
        long_help = "Read Dockerfile content from PATH. If omitted, dftree uses ./Dockerfile."
    )]
    file: Option<PathBuf>,

    #[arg(
        long = "stdin",
        help = "Read Dockerfile from stdin",
        long_help = "Read Dockerfile content from stdin. This conflicts with --file."
    )]
    stdin: bool,

    #[arg(
        short = 's',
        long = "stage-ids",
        help = "Key each build stage by a synthetic id",
        long_help = "Nest every build stage under a generated container-id style key. The ids are random per run; only the document shape is stable."
    )]
    stage_ids: bool,

    #[arg(
        long = "compact",
        help = "Emit single-line JSON",
        long_help = "Emit the document on a single line instead of the default two-space indented JSON."
    )]
    compact: bool,

    #[arg(
        long = "max-onbuild-depth",
        value_name = "N",
        default_value_t = DEFAULT_MAX_ONBUILD_DEPTH,
        help = "Limit ONBUILD nesting",
        long_help = "Fail when ONBUILD triggers nest more than N levels deep."
    )]
    max_onbuild_depth: usize,

    #[arg(
        short = 'v',
        long = "verbose",
        help = "Print debug logs to stderr",
        long_help = "Print parser debug logs (stage switches, ONBUILD re-parses, early stops) to stderr while keeping stdout clean. RUST_LOG overrides the filter."
    )]
    verbose: bool,
}

fn run() -> Result<(), AppError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) {
                print!("{err}");
                return Ok(());
            }
            return Err(AppError::usage(err.to_string()));
        }
    };

    init_logging(cli.verbose);
    execute(cli)
}

fn init_logging(verbose: bool) {
    let fallback = if verbose {
        "dftree=debug,dftree_core=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn execute(cli: Cli) -> Result<(), AppError> {
    if let Some(command) = cli.command {
        return execute_command(command);
    }

    validate_cli(&cli)?;

    let options = ParseOptions {
        stage_qualified: cli.stage_ids,
        max_onbuild_depth: cli.max_onbuild_depth,
    };
    let document = read_document(&cli, options)?;
    debug!(entries = document.len(), "parsed dockerfile");

    let rendered = if cli.compact {
        document.to_json_string()?
    } else {
        document.to_json_pretty()?
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes()).map_err(Error::from)?;
    stdout.write_all(b"\n").map_err(Error::from)?;
    Ok(())
}

fn execute_command(command: Commands) -> Result<(), AppError> {
    match command {
        Commands::Completion { shell } => write_completion(shell),
    }
}

fn write_completion(shell: CompletionShell) -> Result<(), AppError> {
    let mut command = Cli::command();
    let mut stdout = std::io::stdout().lock();
    match shell {
        CompletionShell::Bash => generate(Bash, &mut command, "dftree", &mut stdout),
        CompletionShell::Zsh => generate(Zsh, &mut command, "dftree", &mut stdout),
        CompletionShell::Fish => generate(Fish, &mut command, "dftree", &mut stdout),
    }
    stdout.flush().map_err(Error::from).map_err(AppError::from)
}

fn validate_cli(cli: &Cli) -> Result<(), AppError> {
    if cli.stdin && cli.file.is_some() {
        return Err(AppError::usage("--stdin is mutually exclusive with --file"));
    }
    Ok(())
}

fn read_document(cli: &Cli, options: ParseOptions) -> Result<Document, AppError> {
    if cli.stdin {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .map_err(Error::from)?;
        return Ok(parse_dockerfile(&input, options)?);
    }

    let path = cli
        .file
        .clone()
        .unwrap_or_else(|| PathBuf::from("Dockerfile"));
    debug!(path = %path.display(), "reading dockerfile");
    Ok(parse_file(&path, options)?)
}
