//! `rimuc`: renders Rimu source files to HTML.

use std::cell::RefCell;
use std::fs;
use std::io::Read as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::{Context, Result};
use rimu_core::{Engine, RenderOptions};

const USAGE: &str = "\
rimuc - render Rimu markup to HTML

USAGE:
  rimuc [OPTIONS] [FILE...]

Reads the FILEs (or standard input) in order as one document and writes
the rendered HTML to standard output.

OPTIONS:
  -o, --output FILE         Write the HTML to FILE instead of stdout
  -p, --prepend SOURCE      Render SOURCE first; macro and other
                            definitions carry into the input
      --safe-mode N         Safe mode bit set (default 0: render all)
      --html-replacement T  Replacement text for raw HTML in safe mode 2
  -h, --help                Print this help
";

struct Args {
    output: Option<PathBuf>,
    prepend: Vec<String>,
    safe_mode: Option<u8>,
    html_replacement: Option<String>,
    files: Vec<PathBuf>,
}

fn parse_args() -> Result<Option<Args>> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        return Ok(None);
    }
    let parsed = Args {
        output: args.opt_value_from_str(["-o", "--output"])?,
        prepend: args.values_from_str(["-p", "--prepend"])?,
        safe_mode: args.opt_value_from_str("--safe-mode")?,
        html_replacement: args.opt_value_from_str("--html-replacement")?,
        files: args.finish().into_iter().map(PathBuf::from).collect(),
    };
    Ok(Some(parsed))
}

fn read_source(args: &Args) -> Result<String> {
    let mut source = String::new();
    for text in &args.prepend {
        source.push_str(text);
        source.push_str("\n\n");
    }
    if args.files.is_empty() {
        std::io::stdin()
            .read_to_string(&mut source)
            .context("cannot read standard input")?;
    } else {
        for file in &args.files {
            let text = fs::read_to_string(file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            source.push_str(&text);
            source.push_str("\n\n");
        }
    }
    Ok(source)
}

fn run() -> Result<usize> {
    let Some(args) = parse_args()? else {
        print!("{USAGE}");
        return Ok(0);
    };
    let source = read_source(&args)?;
    let error_count = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&error_count);
    let mut engine = Engine::new();
    engine.update_options(RenderOptions {
        safe_mode: args.safe_mode,
        html_replacement: args.html_replacement.clone(),
        callback: Some(Box::new(move |message| {
            *counter.borrow_mut() += 1;
            eprintln!("rimuc: {message}");
        })),
        ..Default::default()
    });
    let html = engine.render(&source);
    match &args.output {
        Some(path) => fs::write(path, html)
            .with_context(|| format!("cannot write {}", path.display()))?,
        None => println!("{html}"),
    }
    Ok(*error_count.borrow())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(0) => ExitCode::SUCCESS,
        Ok(errors) => {
            eprintln!("rimuc: {errors} error(s)");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("rimuc: {err:#}");
            ExitCode::FAILURE
        }
    }
}
