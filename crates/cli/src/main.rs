//! # CLI - asset container shell
//!
//! A REPL over the container codec. Reads commands from stdin, runs them
//! against the currently loaded container, and prints results to stdout.
//! Works interactively or scripted (pipe commands via stdin).
//!
//! ## Commands
//!
//! ```text
//! LOAD path      Open a container (and its references if ASSETKIT_RESOLVE_REFS=true)
//! INFO           Header fields, block extents and counts
//! OBJECTS        One line per object: id, class, size, schema or opaque
//! DUMP id        Decode an object and print its value tree
//! SIZE id        Bytes the object's value occupies, via the measurer
//! REFS           External references and where they resolved
//! SAVE path      Write the container to `path`
//! EXIT / QUIT    Leave the shell
//! ```
//!
//! ## Configuration
//!
//! ```text
//! ASSETKIT_SCHEMA_BUNDLE  schema bundle path           (default: unset, empty repository)
//! ASSETKIT_CLASS_TABLE    class id -> name table path  (default: unset)
//! ASSETKIT_RESOLVE_REFS   load external references     (default: "false")
//! ASSETKIT_LOG            tracing filter directive     (default: "warn")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ ASSETKIT_SCHEMA_BUNDLE=types.dat cargo run -p cli
//! assetkit started (schemas=312, classes=0, resolve_refs=false)
//! > LOAD level0.assets
//! OK (format 15, 1204 objects, 3 externals)
//! > DUMP 1
//! {
//!   m_Name: "Main Camera"
//!   ...
//! }
//! > EXIT
//! bye
//! ```

use anyhow::{anyhow, bail, Context, Result};
use config::{ClassNames, ToolConfig};
use container::{Container, ReferenceGraph};
use std::io::{self, BufRead, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;
use typetree::SchemaRepository;

struct Shell {
    config: ToolConfig,
    repo: SchemaRepository,
    classes: ClassNames,
    graph: Option<ReferenceGraph>,
    current: Option<Container>,
}

impl Shell {
    fn new(config: ToolConfig) -> Result<Self> {
        let repo = match &config.schema_bundle {
            Some(path) => SchemaRepository::open(path)
                .with_context(|| format!("loading schema bundle {}", path.display()))?,
            None => SchemaRepository::empty(),
        };
        let classes = match &config.class_table {
            Some(path) => ClassNames::load(path)?,
            None => ClassNames::default(),
        };
        Ok(Self {
            config,
            repo,
            classes,
            graph: None,
            current: None,
        })
    }

    fn container(&self) -> Result<&Container> {
        self.current
            .as_ref()
            .ok_or_else(|| anyhow!("no container loaded (use LOAD path)"))
    }

    /// Runs one command. Returns `false` when the shell should exit.
    fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<bool> {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Ok(true);
        };
        let arg = parts.collect::<Vec<&str>>().join(" ");

        match cmd.to_uppercase().as_str() {
            "LOAD" => {
                if arg.is_empty() {
                    bail!("usage: LOAD path");
                }
                self.load(&arg)?;
                let c = self.container()?;
                write!(
                    out,
                    "OK (format {}, {} objects, {} externals",
                    c.format_version(),
                    c.objects().len(),
                    c.externals().len()
                )?;
                if let Some(graph) = &self.graph {
                    write!(out, ", {} containers loaded", graph.len())?;
                }
                writeln!(out, ")")?;
            }
            "INFO" => self.info(out)?,
            "OBJECTS" => self.list_objects(out)?,
            "DUMP" => {
                let id = parse_id(&arg, "DUMP")?;
                let value = self.container()?.decode_object(id)?;
                writeln!(out, "{value}")?;
            }
            "SIZE" => {
                let id = parse_id(&arg, "SIZE")?;
                let len = self.container()?.object_byte_len(id)?;
                writeln!(out, "{len} bytes")?;
            }
            "REFS" => self.list_refs(out)?,
            "SAVE" => {
                if arg.is_empty() {
                    bail!("usage: SAVE path");
                }
                let container = self
                    .current
                    .as_mut()
                    .ok_or_else(|| anyhow!("no container loaded (use LOAD path)"))?;
                container.save(&arg)?;
                writeln!(out, "OK ({} bytes)", container.header().file_size)?;
            }
            "EXIT" | "QUIT" => {
                writeln!(out, "bye")?;
                return Ok(false);
            }
            other => writeln!(out, "unknown command: {other}")?,
        }
        Ok(true)
    }

    fn load(&mut self, path: &str) -> Result<()> {
        if self.config.resolve_refs {
            let graph = ReferenceGraph::load(path, &self.repo)?;
            self.current = Some(graph.root().clone());
            self.graph = Some(graph);
        } else {
            self.current = Some(Container::open(path, &self.repo)?);
            self.graph = None;
        }
        info!(
            path,
            containers = self.graph.as_ref().map_or(1, ReferenceGraph::len),
            "loaded"
        );
        Ok(())
    }

    fn info<W: Write>(&self, out: &mut W) -> Result<()> {
        let c = self.container()?;
        let h = c.header();
        writeln!(out, "signature:      {}", c.signature())?;
        writeln!(out, "format version: {}", h.format_version)?;
        writeln!(out, "byte order:     {:?}", c.byte_order())?;
        writeln!(out, "metadata size:  {}", h.metadata_size)?;
        writeln!(out, "file size:      {}", h.file_size)?;
        writeln!(out, "data offset:    {}", h.data_offset)?;
        writeln!(out, "schemas:        {}", c.schema_table().entries.len())?;
        writeln!(out, "objects:        {}", c.objects().len())?;
        writeln!(out, "externals:      {}", c.externals().len())?;
        writeln!(out, "preload:        {}", c.preload_table().len())?;
        for (name, extent) in c.extents().named() {
            writeln!(out, "{name:<15} {extent}")?;
        }
        Ok(())
    }

    fn list_objects<W: Write>(&self, out: &mut W) -> Result<()> {
        let c = self.container()?;
        if c.objects().is_empty() {
            writeln!(out, "(empty)")?;
            return Ok(());
        }
        for object in c.objects() {
            let info = object.info();
            writeln!(
                out,
                "{} {} {} bytes{}",
                info.object_id,
                self.classes.name_or_id(info.class_id),
                info.byte_size,
                if object.is_opaque() { " (opaque)" } else { "" }
            )?;
        }
        writeln!(out, "({} objects)", c.objects().len())?;
        Ok(())
    }

    fn list_refs<W: Write>(&self, out: &mut W) -> Result<()> {
        let c = self.container()?;
        if c.externals().is_empty() {
            writeln!(out, "(empty)")?;
            return Ok(());
        }
        for reference in c.externals() {
            match &reference.resolved {
                Some(path) => writeln!(out, "{} -> {}", reference.file_path, path.display())?,
                None => writeln!(out, "{} (unresolved)", reference.file_path)?,
            }
        }
        Ok(())
    }
}

fn parse_id(arg: &str, cmd: &str) -> Result<i64> {
    if arg.is_empty() {
        bail!("usage: {cmd} id");
    }
    arg.parse()
        .with_context(|| format!("invalid object id '{arg}'"))
}

fn main() -> Result<()> {
    let config = ToolConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut shell = Shell::new(config)?;

    println!(
        "assetkit started (schemas={}, classes={}, resolve_refs={})",
        shell.repo.len(),
        shell.classes.len(),
        shell.config.resolve_refs
    );
    println!("Commands: LOAD path | INFO | OBJECTS | DUMP id | SIZE id | REFS");
    println!("          SAVE path | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        match shell.execute(&line, &mut stdout) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("ERR {e:#}"),
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}
