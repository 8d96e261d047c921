use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use colored::*;

use siccar::coverage::Coverage;
use siccar::error::{format_error_context, get_error_suggestion};
use siccar::harness::verify_fixture;
use siccar::logging;
use siccar::parser::parse;
use siccar::report::{binary, Reporter, ReporterArgs};
use siccar::{CoverageSession, Interpreter, LineCoverage, SiccarError};

const EXIT_PARSE: i32 = 65;
const EXIT_RUNTIME: i32 = 70;

/// siccar - branch coverage fer braw.
/// Mak siccar yer branches actually ran!
#[derive(Parser)]
#[command(name = "siccar")]
#[command(version = "0.1.0")]
#[command(about = "Branch coverage fer the braw language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a .braw program under instrumentation and save a session file
    Run {
        /// The .braw file to run
        file: PathBuf,

        /// Session file to write (defaults to <file>.ic)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Gather line coverage only, nae branch probes
        #[arg(long)]
        lines: bool,

        /// Fold this run intae an existing session file
        #[arg(long)]
        merge: bool,
    },

    /// Render an XML report frae session files
    Report {
        /// JSON args file describing the report
        args: Option<PathBuf>,

        /// Session files (alternative tae an args file)
        #[arg(long)]
        ic: Vec<PathBuf>,

        /// Where the XML goes (stdout if omitted)
        #[arg(long)]
        xml: Option<PathBuf>,
    },

    /// Show a session file as a coloured per-class summary
    Show {
        /// The session file
        ic: PathBuf,
    },

    /// Run a fixture and check it against its ain coverage markers
    Verify {
        /// The .braw fixture wi markers
        file: PathBuf,

        /// Check line markers rather than branch markers
        #[arg(long)]
        lines: bool,
    },

    /// Check a .braw file for syntax errors without running it
    Check {
        /// The .braw file to check
        file: PathBuf,
    },
}

fn main() {
    logging::init_from_env();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            file,
            output,
            lines,
            merge,
        } => cmd_run(&file, output, lines, merge),
        Commands::Report { args, ic, xml } => cmd_report(args, ic, xml),
        Commands::Show { ic } => cmd_show(&ic),
        Commands::Verify { file, lines } => cmd_verify(&file, lines),
        Commands::Check { file } => cmd_check(&file),
    };

    if let Err((code, message)) = outcome {
        eprintln!("{}", message.red());
        process::exit(code);
    }
}

type CommandResult = Result<(), (i32, String)>;

fn read_source(path: &Path) -> Result<String, (i32, String)> {
    fs::read_to_string(path).map_err(|e| (1, format!("Cannae read '{}': {}", path.display(), e)))
}

fn exit_code_for(error: &SiccarError) -> i32 {
    match error {
        SiccarError::UnkentToken { .. }
        | SiccarError::UnexpectedToken { .. }
        | SiccarError::ParseError { .. } => EXIT_PARSE,
        _ => EXIT_RUNTIME,
    }
}

fn format_with_context(source: &str, error: &SiccarError) -> String {
    let mut msg = format!("{}", error);
    if let Some(line) = error.line() {
        msg.push_str("\n\n");
        msg.push_str(&format_error_context(source, line));
    }
    if let Some(suggestion) = get_error_suggestion(error) {
        msg.push('\n');
        msg.push_str(suggestion);
    }
    msg
}

fn cmd_run(file: &Path, output: Option<PathBuf>, lines: bool, merge: bool) -> CommandResult {
    let source = read_source(file)?;
    let program = parse(&source).map_err(|e| (EXIT_PARSE, format_with_context(&source, &e)))?;

    let unit_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());
    let kind = if lines { Coverage::Line } else { Coverage::Branch };
    let filters = siccar::coverage::default_filters();
    let (mut project, probes) = siccar::coverage::enumerate(&program, &unit_name, kind, &filters);

    let mut interpreter = Interpreter::new().with_coverage(CoverageSession::new(probes));
    interpreter
        .interpret(&program)
        .map_err(|e| (exit_code_for(&e), format_with_context(&source, &e)))?;
    if let Some(session) = interpreter.take_session() {
        session.apply_to(&mut project);
    }

    let session_path = output.unwrap_or_else(|| {
        let mut path = file.as_os_str().to_owned();
        path.push(".ic");
        PathBuf::from(path)
    });

    if merge && session_path.exists() {
        let existing = binary::load(&session_path).map_err(|e| (1, e.to_string()))?;
        project.merge(&existing);
    }
    binary::save(&project, &session_path).map_err(|e| (1, e.to_string()))?;
    eprintln!(
        "{}",
        format!("Coverage saved tae {}", session_path.display()).green()
    );
    Ok(())
}

fn cmd_report(args: Option<PathBuf>, ic: Vec<PathBuf>, xml: Option<PathBuf>) -> CommandResult {
    let args = match args {
        Some(path) => ReporterArgs::from_file(&path).map_err(|e| (1, e.to_string()))?,
        None => {
            if ic.is_empty() {
                return Err((
                    1,
                    format!(
                        "Report needs an args file or at least ane --ic session.\n{}",
                        ReporterArgs::help()
                    ),
                ));
            }
            let entries = ic
                .iter()
                .map(|p| format!(r#"{{"ic": "{}"}}"#, p.display()))
                .collect::<Vec<_>>()
                .join(",");
            ReporterArgs::from_json(&format!(r#"{{"reports": [{}]}}"#, entries))
                .map_err(|e| (1, e.to_string()))?
        }
    };

    let reporter = Reporter::new(args);
    let report = reporter.xml_report().map_err(|e| (1, e.to_string()))?;

    let destination = xml.or_else(|| reporter.args().xml.clone());
    match destination {
        Some(path) => {
            fs::write(&path, report)
                .map_err(|e| (1, format!("Cannae write '{}': {}", path.display(), e)))?;
            eprintln!("{}", format!("Report written tae {}", path.display()).green());
        }
        None => print!("{}", report),
    }
    Ok(())
}

fn cmd_show(ic: &Path) -> CommandResult {
    let project = binary::load(ic).map_err(|e| (1, e.to_string()))?;

    for class in project.classes() {
        println!("{}", class.name.bold());
        for line in class.lines() {
            let counts = line.branch_counts();
            let branches = if counts.total > 0 {
                format!("  [{}/{} branches]", counts.covered, counts.total)
            } else {
                String::new()
            };
            let text = format!(
                "  line {:>4}: {:>3} hits ({}){}",
                line.line,
                line.hits,
                line.status(),
                branches
            );
            let coloured = match line.status() {
                LineCoverage::Full => text.green(),
                LineCoverage::Partial => text.yellow(),
                LineCoverage::None => text.red(),
            };
            println!("{}", coloured);
        }
    }
    println!();
    print!("{}", Reporter::render_text(&project));
    Ok(())
}

fn cmd_verify(file: &Path, lines: bool) -> CommandResult {
    let kind = if lines { Coverage::Line } else { Coverage::Branch };
    let problems =
        verify_fixture(file, kind).map_err(|e| (exit_code_for(&e), e.to_string()))?;

    if problems.is_empty() {
        println!("{}", format!("{}: markers haud", file.display()).green());
        Ok(())
    } else {
        for problem in &problems {
            eprintln!("{}", problem.yellow());
        }
        Err((
            1,
            format!(
                "{}: {} marker(s) dinnae match",
                file.display(),
                problems.len()
            ),
        ))
    }
}

fn cmd_check(file: &Path) -> CommandResult {
    let source = read_source(file)?;
    match parse(&source) {
        Ok(_) => {
            println!("{}", format!("{} is braw!", file.display()).green());
            Ok(())
        }
        Err(e) => Err((EXIT_PARSE, format_with_context(&source, &e))),
    }
}
