use std::error::Error;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use jsonize::config::{
    ClassAttributeHandling, EmptyTextNodeHandling, NullValueHandling, OutputFormat,
    TextNodeFormat,
};
use jsonize::{Configuration, Jsonizer};
use tracing::{info, span, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Convert an HTML document to JSON

USAGE:
  jsonize [OPTIONS] [INPUT]

ARGS:
  <INPUT>                 HTML file to read, or `-` for stdin (default)

OPTIONS:
  -o, --output <FILE>     Write JSON to FILE instead of stdout
  --no-attributes         Leave element attributes out
  --raw-text              Keep text exactly as written instead of trimming it
  --keep-empty-text       Keep whitespace-only text nodes
  --text-as-string        Emit text nodes as bare strings
  --class-array           Split the class attribute into an array
  --include-nulls         Write `null` for elements without attributes
  --indent                Pretty-print the JSON
  --tag-key <KEY>         Key for tag names [default: tag]
  --children-key <KEY>    Key for child lists [default: children]
  --text-key <KEY>        Key for text content [default: text]
  --attributes-key <KEY>  Key for attribute objects [default: attributes]
  --max-depth <N>         Deepest node allowed below the root, 1 to 512 [default: 512]
  -t, --trace             Log progress to stderr (filter with RUST_LOG)
  -h, --help              Print this help
";

#[derive(Debug)]
struct Args {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub trace: bool,
    pub config: Configuration,
}

fn main() {
    let args = match parse_args(pico_args::Arguments::from_env()) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print!("{}", HELP);
            return;
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };
    if args.trace {
        tracing_subscriber::fmt::fmt()
            .with_span_events(FmtSpan::ACTIVE)
            .with_max_level(Level::TRACE)
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .finish()
            .init();
        info!("Logger initialized");
    }

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Map command line flags onto [`Args`]; `Ok(None)` asks for the help text
fn parse_args(mut pargs: pico_args::Arguments) -> Result<Option<Args>, pico_args::Error> {
    if pargs.contains(["-h", "--help"]) {
        return Ok(None);
    }
    let defaults = Configuration::default();
    let config = Configuration {
        include_attributes: !pargs.contains("--no-attributes"),
        trim_whitespace: !pargs.contains("--raw-text"),
        empty_text_nodes: if pargs.contains("--keep-empty-text") {
            EmptyTextNodeHandling::Include
        } else {
            EmptyTextNodeHandling::Ignore
        },
        text_nodes: if pargs.contains("--text-as-string") {
            TextNodeFormat::String
        } else {
            TextNodeFormat::Object
        },
        class_attribute: if pargs.contains("--class-array") {
            ClassAttributeHandling::Array
        } else {
            ClassAttributeHandling::String
        },
        null_values: if pargs.contains("--include-nulls") {
            NullValueHandling::Include
        } else {
            NullValueHandling::Ignore
        },
        output: if pargs.contains("--indent") {
            OutputFormat::Indented
        } else {
            OutputFormat::Compact
        },
        tag_key: pargs
            .opt_value_from_str("--tag-key")?
            .unwrap_or(defaults.tag_key),
        children_key: pargs
            .opt_value_from_str("--children-key")?
            .unwrap_or(defaults.children_key),
        text_key: pargs
            .opt_value_from_str("--text-key")?
            .unwrap_or(defaults.text_key),
        attributes_key: pargs
            .opt_value_from_str("--attributes-key")?
            .unwrap_or(defaults.attributes_key),
        max_depth: pargs
            .opt_value_from_str("--max-depth")?
            .unwrap_or(defaults.max_depth),
    };
    let args = Args {
        output: pargs.opt_value_from_str(["-o", "--output"])?,
        trace: pargs.contains(["-t", "--trace"]),
        input: pargs
            .opt_free_from_str::<PathBuf>()?
            .filter(|p| p.as_os_str() != "-"),
        config,
    };
    let rest = pargs.finish();
    if !rest.is_empty() {
        return Err(pico_args::Error::ArgumentParsingFailed {
            cause: format!("unexpected arguments {:?}", rest),
        });
    }
    Ok(Some(args))
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let jsonizer = Jsonizer::new(args.config)?;

    let html = {
        let span = span!(Level::DEBUG, "Reading input");
        let _enter = span.enter();
        match &args.input {
            Some(path) => std::fs::read_to_string(path)?,
            None => {
                let mut buf = String::new();
                io::stdin().read_to_string(&mut buf)?;
                buf
            }
        }
    };

    let json = jsonizer.parse_to_string(&html)?;

    let span = span!(Level::DEBUG, "Writing result");
    let _enter = span.enter();
    match &args.output {
        Some(path) => std::fs::write(path, json + "\n")?,
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}
