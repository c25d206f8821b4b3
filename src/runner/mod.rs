//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! handles command execution: load the manifest, configure the toolchain,
//! assemble the rule graph and write the Makefile or the target list.

mod error;
mod path_helpers;

pub use error::RunnerError;

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use camino::Utf8Path;
use tracing::{debug, info};

use crate::ast::KumikiManifest;
use crate::cli::{Cli, Commands, EmitArgs};
use crate::configure::{Toolchain, configure};
use crate::headers::HeaderResolver;
use crate::ir::{GraphAssembler, RuleGraph};
use crate::make_gen::SpecialTargets;
use crate::probe::{FlagProbe, ProcessProbe};
use crate::{make_gen, manifest};

use path_helpers::{
    ensure_manifest_exists_or_error, resolve_manifest_path, resolve_output_path, source_root,
};

/// A configured manifest together with the graph assembled from it.
#[derive(Debug, Clone)]
pub struct Generated {
    /// Manifest after toolchain selection and flag normalisation.
    pub manifest: KumikiManifest,
    /// Rules for every project.
    pub graph: RuleGraph,
}

impl Generated {
    /// Render the Makefile text.
    #[must_use]
    pub fn makefile(&self) -> String {
        let specials = SpecialTargets {
            silent: self.manifest.silent.as_deref(),
            suffixes: self.manifest.suffixes.as_deref(),
        };
        make_gen::generate(&self.graph, &self.manifest.macros, specials)
    }
}

/// Execute the parsed [`Cli`] commands, writing command output to stdout.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, a project is invalid,
/// or the output cannot be written.
pub fn run(cli: &Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_output(cli, &mut out)
}

/// Execute the parsed [`Cli`] commands, writing command output to `out`.
///
/// # Errors
///
/// See [`run`].
pub fn run_with_output(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| Commands::Emit(EmitArgs::default()));
    let generated = generate(cli)?;
    match command {
        Commands::Emit(args) => handle_emit(cli, &args, &generated, out),
        Commands::Targets => {
            for target in make_gen::ordered_targets(&generated.graph) {
                writeln!(out, "{target}").context("failed to write target list")?;
            }
            Ok(())
        }
    }
}

fn handle_emit(cli: &Cli, args: &EmitArgs, generated: &Generated, out: &mut dyn Write) -> Result<()> {
    let makefile = generated.makefile();
    if args.to_stdout() {
        out.write_all(makefile.as_bytes())
            .context("failed to write Makefile to stdout")?;
        return out.flush().context("failed to flush stdout");
    }
    let path = resolve_output_path(cli, &args.output);
    write_makefile(&path, &makefile)
}

fn write_makefile(path: &Utf8Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent directory {parent}"))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write Makefile to {path}"))?;
    info!("Generated Makefile at {path}");
    Ok(())
}

/// Load, configure and assemble the manifest referenced by `cli`.
///
/// # Errors
///
/// Returns an error if the manifest is missing or malformed, or if any
/// project cannot be translated into rules.
pub fn generate(cli: &Cli) -> Result<Generated> {
    let manifest_path = resolve_manifest_path(cli)?;
    ensure_manifest_exists_or_error(cli, &manifest_path)?;
    let mut manifest = manifest::from_path(&manifest_path)
        .with_context(|| format!("loading manifest {manifest_path}"))?;

    let toolchain = Toolchain::resolve(&cli.toolchain_overrides(), &manifest.macros);
    if cli.no_probe {
        configure::<ProcessProbe>(&mut manifest, &toolchain, None);
    } else {
        let mut probe = FlagProbe::system();
        configure(&mut manifest, &toolchain, Some(&mut probe));
    }

    let root = source_root(&manifest_path);
    let graph = assemble(&manifest, &root)?;
    Ok(Generated { manifest, graph })
}

fn assemble(manifest: &KumikiManifest, root: &Utf8Path) -> Result<RuleGraph> {
    debug!(root = %root, projects = manifest.projects.len(), "assembling projects");
    let headers = HeaderResolver::new(root);
    let mut assembler = GraphAssembler::new(&headers);
    for project in &manifest.projects {
        assembler
            .add_project(project)
            .with_context(|| format!("building project '{}'", project.name))?;
    }
    assembler.finish().context("validating the rule graph")
}
