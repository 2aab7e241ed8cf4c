use linea::render::{ChartOptions, LineageChart, SvgRenderOptions, render_frame_svg};
use linea::{Dimensions, Direction, Labels, Lineage, compact};
use serde::Serialize;
use std::io::Read;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    Render(linea::render::Error),
    NoLineage,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::NoLineage => write!(f, "Payload has no upstream or downstream entities"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<linea::render::Error> for CliError {
    fn from(value: linea::render::Error) -> Self {
        Self::Render(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    Compact,
    Layout,
    #[default]
    Render,
}

#[derive(Debug)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    width: f64,
    height: f64,
    upstream_label: Option<String>,
    downstream_label: Option<String>,
    scale_radius_by_usage: bool,
    animate: bool,
    out: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            command: Command::Render,
            input: None,
            pretty: false,
            width: 1280.0,
            height: 800.0,
            upstream_label: None,
            downstream_label: None,
            scale_radius_by_usage: false,
            animate: true,
            out: None,
        }
    }
}

#[derive(Serialize)]
struct CompactOut {
    upstream: Vec<linea::CompactedItem>,
    downstream: Vec<linea::CompactedItem>,
}

fn usage() -> &'static str {
    "linea-cli\n\
\n\
USAGE:\n\
  linea-cli compact [--pretty] [<path>|-]\n\
  linea-cli layout [--pretty] [--width <w>] [--height <h>] [<path>|-]\n\
  linea-cli [render] [--width <w>] [--height <h>] [--upstream-label <s>] [--downstream-label <s>] [--usage-radius] [--static] [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - Input is a lineage JSON payload with `upstream_entities` and `downstream_entities` arrays.\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - compact prints the deduplicated entity lists per direction as JSON.\n\
  - layout prints the first rendered frame (nodes, edges, anchor) as JSON.\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
  - --static omits the SMIL entrance transitions from the SVG.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "compact" => args.command = Command::Compact,
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "--usage-radius" => args.scale_radius_by_usage = true,
            "--static" => args.animate = false,
            "--width" => {
                let Some(w) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.width = w.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
            }
            "--height" => {
                let Some(h) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.height = h.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
            }
            "--upstream-label" => {
                let Some(label) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.upstream_label = Some(label.clone());
            }
            "--downstream-label" => {
                let Some(label) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.downstream_label = Some(label.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    if !(args.width.is_finite() && args.width > 0.0) {
        return Err(CliError::Usage(usage()));
    }
    if !(args.height.is_finite() && args.height > 0.0) {
        return Err(CliError::Usage(usage()));
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn labels_from(args: &Args) -> Labels {
    let mut labels = Labels::default();
    if let Some(upstream) = &args.upstream_label {
        labels.upstream = upstream.clone();
    }
    if let Some(downstream) = &args.downstream_label {
        labels.downstream = downstream.clone();
    }
    labels
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let lineage: Lineage = serde_json::from_str(&text)?;
    if !lineage.has_lineage_data() {
        return Err(CliError::NoLineage);
    }

    let dimensions = Dimensions {
        width: args.width,
        height: args.height,
    };
    let options = ChartOptions {
        scale_radius_by_usage: args.scale_radius_by_usage,
        ..Default::default()
    };

    match args.command {
        Command::Compact => {
            let out = CompactOut {
                upstream: compact(Direction::Upstream, &lineage.upstream_entities),
                downstream: compact(Direction::Downstream, &lineage.downstream_entities),
            };
            write_json(&out, args.pretty)?;
            Ok(())
        }
        Command::Layout => {
            let chart = LineageChart::create(&lineage, dimensions, labels_from(&args), options)?;
            write_json(chart.frame(), args.pretty)?;
            Ok(())
        }
        Command::Render => {
            let chart = LineageChart::create(&lineage, dimensions, labels_from(&args), options)?;
            let svg = if args.animate {
                chart.svg()
            } else {
                let svg_options = SvgRenderOptions {
                    animate: false,
                    scale_radius_by_usage: args.scale_radius_by_usage,
                    ..Default::default()
                };
                render_frame_svg(chart.frame(), dimensions, &labels_from(&args), &svg_options)
            };
            write_text(&svg, args.out.as_deref())?;
            Ok(())
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(CliError::NoLineage) => {
            eprintln!("{}", CliError::NoLineage);
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
