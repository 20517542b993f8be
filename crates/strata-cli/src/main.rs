use anyhow::{Context, Result, bail};
use std::{
    env,
    path::{Path, PathBuf},
    process,
};
use strata_config::Config;
use strata_engine::{Direction, DocumentView, encode_path};
use strata_syntax::TextFormat;

const USAGE: &str = "\
Usage: strata-cli [--format <mime>] <file> [command]
       strata-cli init-config

Commands (lines are 1-based):
  outline            sections as an indented tree (default)
  intervals          byte range and path of every section
  anchors            anchors of the named sections
  anchor <line>      anchor of the section containing a line
  goto <anchor>      first line of the section an anchor points to
  crumbs <line>      section path at a line with sibling names
  next <line>        line of the next section
  prev <line>        line of the previous section";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Outline,
    Intervals,
    Anchors,
    Anchor(usize),
    Goto(String),
    Crumbs(usize),
    Jump(usize, Direction),
}

#[derive(Debug, PartialEq, Eq)]
enum Invocation {
    InitConfig,
    Inspect {
        path: PathBuf,
        format: Option<TextFormat>,
        command: Command,
    },
}

fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut args = args.iter().map(String::as_str);
    let mut format = None;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg {
            "--format" => {
                let mime = args.next().context("--format needs a value")?;
                format = Some(mime.parse::<TextFormat>()?);
            }
            "-h" | "--help" => bail!("{USAGE}"),
            _ => positional.push(arg),
        }
    }

    let Some((&first, rest)) = positional.split_first() else {
        bail!("{USAGE}");
    };
    if first == "init-config" && rest.is_empty() {
        return Ok(Invocation::InitConfig);
    }

    let command = match rest {
        [] | ["outline"] => Command::Outline,
        ["intervals"] => Command::Intervals,
        ["anchors"] => Command::Anchors,
        ["anchor", line] => Command::Anchor(parse_line(line)?),
        ["goto", anchor] => Command::Goto((*anchor).to_string()),
        ["crumbs", line] => Command::Crumbs(parse_line(line)?),
        ["next", line] => Command::Jump(parse_line(line)?, Direction::Next),
        ["prev", line] => Command::Jump(parse_line(line)?, Direction::Previous),
        _ => bail!("{USAGE}"),
    };

    Ok(Invocation::Inspect {
        path: PathBuf::from(first),
        format,
        command,
    })
}

/// 1-based line argument to a 0-based line.
fn parse_line(arg: &str) -> Result<usize> {
    let line: usize = arg
        .parse()
        .with_context(|| format!("invalid line number {arg:?}"))?;
    line.checked_sub(1).context("line numbers start at 1")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let invocation = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };

    let config_path = Config::config_path();
    log::info!("Config path: {}", config_path.display());

    match invocation {
        Invocation::InitConfig => {
            if config_path.exists() {
                bail!("Config file already exists at {}", config_path.display());
            }
            Config::default().save_to_path(&config_path)?;
            println!("Wrote {}", config_path.display());
            Ok(())
        }
        Invocation::Inspect {
            path,
            format,
            command,
        } => {
            let config = Config::load_from_path(&config_path)?.unwrap_or_default();
            let view = open_document(&path, format, &config)?;
            let found = run(&view, &command);
            if !found {
                process::exit(1);
            }
            Ok(())
        }
    }
}

fn open_document(path: &Path, format: Option<TextFormat>, config: &Config) -> Result<DocumentView> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let format = format
        .or_else(|| config.format_for(path))
        .unwrap_or_else(|| TextFormat::detect(&content, Some(path)));
    log::info!("Treating {} as {format}", path.display());

    Ok(DocumentView::new(&content, format, config.discovery_options()))
}

/// Prints the result of `command`. Returns false when there was nothing to
/// show.
fn run(view: &DocumentView, command: &Command) -> bool {
    let lines = render(view, command);
    for line in &lines {
        println!("{line}");
    }
    !lines.is_empty()
}

fn render(view: &DocumentView, command: &Command) -> Vec<String> {
    let meta = view.metadata();
    match command {
        Command::Outline => {
            let Some(tree) = meta.tree() else {
                return Vec::new();
            };
            tree.iter_depth_first(tree.root())
                .skip(1)
                .map(|id| {
                    let node = tree.node(id);
                    let depth = tree.path_of(id).len();
                    let key = node.key().map(ToString::to_string).unwrap_or_default();
                    format!("{}{key}  (line {})", "  ".repeat(depth - 1), node.line_number + 1)
                })
                .collect()
        }
        Command::Intervals => {
            let Some(tree) = meta.tree() else {
                return Vec::new();
            };
            tree.iter_depth_first(tree.root())
                .skip(1)
                .map(|id| {
                    let node = tree.node(id);
                    format!("{}..{}\t{}", node.start, node.stop, encode_path(&tree.path_of(id)))
                })
                .collect()
        }
        Command::Anchors => view.anchors().into_iter().collect(),
        Command::Anchor(line) => view.anchor_for_line(*line).into_iter().collect(),
        Command::Goto(anchor) => view
            .line_for_anchor(anchor)
            .map(|line| (line + 1).to_string())
            .into_iter()
            .collect(),
        Command::Crumbs(line) => view
            .breadcrumbs(*line)
            .into_iter()
            .map(|crumb| format!("{}\t{}", crumb.key, crumb.possibilities.join(", ")))
            .collect(),
        Command::Jump(line, direction) => view
            .adjacent_section(*line, *direction)
            .map(|line| (line + 1).to_string())
            .into_iter()
            .collect(),
    }
}
