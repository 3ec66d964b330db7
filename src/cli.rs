use crate::builder::GraphModelBuilder;
use crate::config::{DiagramKind, LayoutConfig, load_config};
use crate::ir::GraphInput;
use crate::layout::{LayoutResult, LayoutSession, Point};
use crate::layout_dump::{LayoutDump, read_layout_dump, write_layout_dump};
use crate::store::{JsonFilePositionStore, MemoryPositionStore, PositionStore};
use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "erdl", version, about = "Column layout for ERD and glossary relationship diagrams")]
pub struct Args {
    /// Relation data (JSON) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout JSON. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Diagram type
    #[arg(short = 'k', long = "kind", value_enum, default_value = "erd")]
    pub kind: DiagramKind,

    /// Layout config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Diagram id scoping stored positions. Defaults to `<kind>:<focus id>`.
    #[arg(short = 'd', long = "diagram-id")]
    pub diagram_id: Option<String>,

    /// Position store file. Positions are kept in memory when omitted.
    #[arg(short = 's', long = "store")]
    pub store: Option<PathBuf>,

    /// Layout JSON from an earlier run, used for carry-over
    #[arg(short = 'p', long = "previous")]
    pub previous: Option<PathBuf>,

    /// Toggle the collapse state of a node after layout (repeatable)
    #[arg(long = "toggle", value_name = "NODE")]
    pub toggle: Vec<String>,

    /// Finish a drag of a node at a position, as NODE=X,Y (repeatable)
    #[arg(long = "drag", value_name = "NODE=X,Y", value_parser = parse_drag)]
    pub drag: Vec<(String, Point)>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
    log::debug!(args:?; "Parsed arguments");

    let config = load_config(args.config.as_deref())?;
    let layout_config = config.layout(args.kind).clone();

    let input = read_input(args.input.as_deref())?;
    let graph: GraphInput = serde_json::from_str(&input)?;
    let diagram_id = args
        .diagram_id
        .clone()
        .unwrap_or_else(|| format!("{}:{}", args.kind, graph.focus_id()));

    let previous = match args.previous.as_deref() {
        Some(path) => Some(read_layout_dump(path)?.into_layout()),
        None => None,
    };

    let result = match args.store.as_deref() {
        Some(path) => {
            let store = JsonFilePositionStore::open(path)?;
            run_session(&args, &graph, &diagram_id, layout_config, store, previous)?
        }
        None => run_session(
            &args,
            &graph,
            &diagram_id,
            layout_config,
            MemoryPositionStore::new(),
            previous,
        )?,
    };

    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, &result, args.kind)?,
        None => {
            let dump = LayoutDump::from_layout(&result, args.kind);
            let json = serde_json::to_string_pretty(&dump)?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    log::info!(diagram_id:% = diagram_id, nodes = result.nodes.len(); "Layout written");
    Ok(())
}

fn run_session<S: PositionStore>(
    args: &Args,
    graph: &GraphInput,
    diagram_id: &str,
    config: LayoutConfig,
    store: S,
    previous: Option<LayoutResult>,
) -> Result<LayoutResult> {
    let model = GraphModelBuilder::new(args.kind, &config).build_input(graph);
    let mut session = LayoutSession::new(diagram_id, config, store)?;
    if let Some(previous) = previous {
        session = session.with_previous(previous);
    }
    session.apply_graph(model)?;
    for node_id in &args.toggle {
        session.toggle_collapse(node_id)?;
    }
    for (node_id, position) in &args.drag {
        session.drag_end(node_id, *position)?;
    }
    let (result, _store) = session.into_parts();
    Ok(result.unwrap_or_default())
}

fn parse_drag(value: &str) -> Result<(String, Point), String> {
    let (node_id, coords) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NODE=X,Y, got '{value}'"))?;
    let (x, y) = coords
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y coordinates, got '{coords}'"))?;
    let x: f32 = x.trim().parse().map_err(|_| format!("invalid x coordinate '{x}'"))?;
    let y: f32 = y.trim().parse().map_err(|_| format!("invalid y coordinate '{y}'"))?;
    let node_id = node_id.trim();
    if node_id.is_empty() {
        return Err("node id must not be empty".to_string());
    }
    let point = Point::new(x, y);
    if !point.is_finite() {
        return Err(format!("coordinates must be finite, got '{coords}'"));
    }
    Ok((node_id.to_string(), point))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
