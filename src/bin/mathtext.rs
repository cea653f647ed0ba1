//! mathtext CLI - render chat content with LaTeX math

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::path::Path;
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use mathtext::{
    diagnostics::{check_latex, format_diagnostics},
    engine::TypstEngine,
    fix_syntax, split_mixed_content, strip_layout, FallbackSource, MathEngine, MathRenderer,
    MathTextResult, MixedRenderer, RenderOptions, RenderReport,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "mathtext")]
#[command(version)]
#[command(about = "mathtext - render chat LaTeX with OCR-error recovery", long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input file path (reads from stdin if not provided)
    input_file: Option<String>,

    /// Output file path (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Typesetting engine
    #[arg(short, long, value_enum, default_value_t = EngineKind::default(), global = true)]
    engine: EngineKind,

    /// TOML file with render options
    #[arg(long, global = true)]
    config: Option<String>,

    /// Source drawn by the error fallback
    #[arg(long, value_enum, global = true)]
    fallback: Option<FallbackSource>,

    /// Skip the repair stages and go straight to the error fallback
    #[arg(long, global = true)]
    no_repair: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Render mixed text/math content (default action)
    Render {
        /// Input file path
        input: Option<String>,

        /// Output file path
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Render a single formula
    Math {
        /// LaTeX source (reads from stdin if not provided)
        latex: Option<String>,

        /// Block layout instead of inline
        #[arg(short, long)]
        display: bool,

        /// Print every ladder attempt to stderr
        #[arg(long)]
        trace: bool,
    },

    /// Print the text/math segments as JSON
    Split {
        /// Input file path
        input: Option<String>,
    },

    /// Apply a sanitizer stage to a formula
    Sanitize {
        /// LaTeX source (reads from stdin if not provided)
        latex: Option<String>,

        /// Sanitizer stage
        #[arg(short, long, value_enum, default_value_t = SanitizeStage::Layout)]
        stage: SanitizeStage,
    },

    /// Check a formula for OCR artifacts and syntax errors
    Check {
        /// Input file to check
        input: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Render every .md/.txt file in a directory
    Batch {
        /// Input directory or single file
        input: String,

        /// Output directory
        #[arg(short, long)]
        output_dir: String,

        /// File extension for output files
        #[arg(short = 'x', long)]
        extension: Option<String>,
    },

    /// Show version and engine info
    Info,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum EngineKind {
    /// KaTeX HTML
    Katex,
    /// Typst math markup
    Typst,
}

#[cfg(feature = "cli")]
impl Default for EngineKind {
    fn default() -> Self {
        if cfg!(any(feature = "katex", feature = "katex-wasm")) {
            EngineKind::Katex
        } else {
            EngineKind::Typst
        }
    }
}

#[cfg(feature = "cli")]
impl EngineKind {
    fn extension(self) -> &'static str {
        match self {
            EngineKind::Katex => "html",
            EngineKind::Typst => "typ",
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum SanitizeStage {
    /// Drop \nonumber, \left, \right and &
    Syntax,
    /// Syntax fix plus \underbrace collapse and array unwrapping
    Layout,
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: u8) {
    // -v raises the level, otherwise use RUST_LOG or default to WARN
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("mathtext=info"),
        2 => EnvFilter::new("mathtext=debug"),
        _ => EnvFilter::new("mathtext=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> MathTextResult<()> {
    let options = load_options(&cli)?;
    let engine = build_engine(cli.engine, &options)?;

    match cli.command {
        Some(cmd) => handle_subcommand(cmd, cli.engine, engine, &options),
        None => {
            let input = read_input(cli.input_file.as_deref())?;
            let result = MixedRenderer::with_options(engine, &options).render_to_string(&input);
            write_output(cli.output.as_deref(), &result)
        }
    }
}

#[cfg(feature = "cli")]
fn load_options(cli: &Cli) -> MathTextResult<RenderOptions> {
    let mut options = match cli.config {
        Some(ref path) => RenderOptions::load(path)?,
        None => RenderOptions::default(),
    };

    if let Some(fallback) = cli.fallback {
        options.fallback_source = fallback;
    }
    if cli.no_repair {
        options.repair = false;
    }

    Ok(options)
}

#[cfg(feature = "cli")]
fn build_engine(
    kind: EngineKind,
    options: &RenderOptions,
) -> MathTextResult<Box<dyn MathEngine>> {
    match kind {
        #[cfg(any(feature = "katex", feature = "katex-wasm"))]
        EngineKind::Katex => Ok(Box::new(mathtext::engine::KatexEngine::from_options(
            options,
        ))),
        #[cfg(not(any(feature = "katex", feature = "katex-wasm")))]
        EngineKind::Katex => Err(mathtext::MathTextError::invalid_option(
            "the katex engine is not compiled in; rebuild with --features katex",
        )),
        EngineKind::Typst => Ok(Box::new(TypstEngine::from_options(options))),
    }
}

#[cfg(feature = "cli")]
fn handle_subcommand(
    cmd: Commands,
    kind: EngineKind,
    engine: Box<dyn MathEngine>,
    options: &RenderOptions,
) -> MathTextResult<()> {
    match cmd {
        Commands::Render { input, output } => {
            let content = read_input(input.as_deref())?;
            let result = MixedRenderer::with_options(engine, options).render_to_string(&content);
            write_output(output.as_deref(), &result)?;
        }

        Commands::Math {
            latex,
            display,
            trace,
        } => {
            let latex = match latex {
                Some(latex) => latex,
                None => read_input(None)?,
            };
            let renderer = MathRenderer::with_options(engine, options);
            let rendered = renderer.render(latex.trim(), display);
            if trace {
                print_report(&rendered.report);
            }
            println!("{}", rendered.markup);
        }

        Commands::Split { input } => {
            let content = read_input(input.as_deref())?;
            let segments = split_mixed_content(&content).into_segments();
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &segments).map_err(io::Error::from)?;
            writeln!(stdout)?;
        }

        Commands::Sanitize { latex, stage } => {
            let latex = match latex {
                Some(latex) => latex,
                None => read_input(None)?,
            };
            let result = match stage {
                SanitizeStage::Syntax => fix_syntax(&latex),
                SanitizeStage::Layout => strip_layout(&latex),
            };
            println!("{}", result);
        }

        Commands::Check { input, no_color } => {
            let content = read_input(input.as_deref())?;
            let result = check_latex(&content);
            println!("{}", format_diagnostics(&result, !no_color));

            if result.has_errors() {
                std::process::exit(1);
            }
        }

        Commands::Batch {
            input,
            output_dir,
            extension,
        } => {
            fs::create_dir_all(&output_dir)?;
            let out_ext = extension.unwrap_or_else(|| kind.extension().to_string());
            let renderer = MixedRenderer::with_options(engine, options);

            let input_path = Path::new(&input);
            let files: Vec<_> = if input_path.is_dir() {
                fs::read_dir(input_path)?
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|path| {
                        matches!(
                            path.extension().and_then(|s| s.to_str()),
                            Some("md") | Some("txt")
                        )
                    })
                    .collect()
            } else {
                vec![input_path.to_path_buf()]
            };

            let mut success_count = 0;
            let mut error_count = 0;

            for file_path in files {
                let filename = file_path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("output");
                let output_path = Path::new(&output_dir).join(format!("{}.{}", filename, out_ext));

                match fs::read_to_string(&file_path) {
                    Ok(content) => {
                        let output = renderer.render(&content);
                        let fallbacks = output.reports().filter(|r| r.used_fallback()).count();
                        let result = output.to_markup(renderer.math_renderer().engine());

                        match fs::write(&output_path, &result) {
                            Ok(_) => {
                                if fallbacks > 0 {
                                    eprintln!(
                                        "⚠ {} ({} formula(s) drawn as errors)",
                                        output_path.display(),
                                        fallbacks
                                    );
                                } else {
                                    eprintln!("✓ {}", output_path.display());
                                }
                                success_count += 1;
                            }
                            Err(e) => {
                                eprintln!("✗ {} - write error: {}", output_path.display(), e);
                                error_count += 1;
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("✗ {} - read error: {}", file_path.display(), e);
                        error_count += 1;
                    }
                }
            }

            eprintln!(
                "\nBatch rendering complete: {} succeeded, {} failed",
                success_count, error_count
            );

            if error_count > 0 {
                std::process::exit(1);
            }
        }

        Commands::Info => {
            println!("mathtext - LaTeX math rendering with OCR-error recovery");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Engines:");
            if cfg!(any(feature = "katex", feature = "katex-wasm")) {
                println!("  ✓ katex (HTML/MathML)");
            } else {
                println!("  ✗ katex (not compiled in)");
            }
            println!("  ✓ typst (Typst math markup via mitex)");
            println!();
            println!("Recovery ladder:");
            for stage in MathRenderer::with_options(engine, options).ladder().stages() {
                println!(
                    "  {}. {} ({}, {})",
                    stage.index, stage.kind, stage.transform, stage.mode
                );
            }
            println!();
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn read_input(path: Option<&str>) -> MathTextResult<String> {
    match path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

#[cfg(feature = "cli")]
fn write_output(path: Option<&str>, result: &str) -> MathTextResult<()> {
    match path {
        Some(path) => {
            let mut file = fs::File::create(path)?;
            writeln!(file, "{}", result)?;
            eprintln!("✓ Output written to: {}", path);
        }
        None => println!("{}", result),
    }
    Ok(())
}

/// Print the ladder attempts to stderr
#[cfg(feature = "cli")]
fn print_report(report: &RenderReport) {
    eprintln!();
    for attempt in &report.attempts {
        let mark = if attempt.succeeded { "✓" } else { "✗" };
        eprintln!(
            "  {} stage {} ({}): {}",
            mark, attempt.attempt_index, attempt.stage, attempt.engine_input
        );
        if let Some(ref error) = attempt.error {
            eprintln!("      {}", error);
        }
    }
    eprintln!();
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install mathtext --features cli");
    eprintln!("  mathtext [OPTIONS] [INPUT_FILE]");
}
