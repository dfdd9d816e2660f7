//! CLI binary for stackdeps: validate, query and plan template dependencies.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stackdeps_core::export::ExportFormat;
use stackdeps_core::{order, validate};
use stackdeps_parser::project::{Project, load_project};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "stackdeps",
    version,
    about = "Dependency graph for infrastructure templates"
)]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that every required variable has a provider and the graph is acyclic
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the templates a template depends on
    Deps {
        /// Template ID (path relative to the template root)
        template: String,

        /// Follow dependencies transitively
        #[arg(short, long)]
        transitive: bool,
    },

    /// List the templates that depend on a template
    Dependents {
        /// Template ID (path relative to the template root)
        template: String,

        /// Follow dependents transitively
        #[arg(short, long)]
        transitive: bool,
    },

    /// Print the subset of templates that can be acted on as a unit
    Closed {
        /// Candidate template IDs
        #[arg(required = true)]
        templates: Vec<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print deploy order (providers first), or retract order with --retract
    Order {
        /// Target templates (defaults to every template in the project)
        templates: Vec<String>,

        /// Plan a retraction instead of a deploy
        #[arg(long)]
        retract: bool,
    },

    /// Export graph as DOT (Graphviz) or Mermaid flowchart
    Export {
        /// Output format: dot, mermaid
        #[arg(short, long, default_value = "dot")]
        format: ExportFormat,
    },

    /// Show project statistics
    Info,
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;

    match cli.command {
        Commands::Check { json } => cmd_check(&project_root, json),
        Commands::Deps {
            template,
            transitive,
        } => cmd_deps(&project_root, &template, transitive),
        Commands::Dependents {
            template,
            transitive,
        } => cmd_dependents(&project_root, &template, transitive),
        Commands::Closed { templates, json } => cmd_closed(&project_root, &templates, json),
        Commands::Order { templates, retract } => cmd_order(&project_root, &templates, retract),
        Commands::Export { format } => cmd_export(&project_root, format),
        Commands::Info => cmd_info(&project_root),
    }
}

/// Load the project behind a spinner.
fn load(project_root: &Path) -> Result<Project> {
    use indicatif::{ProgressBar, ProgressStyle};

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message("Scanning templates...");
    spinner.tick();

    let project = load_project(project_root);
    spinner.finish_and_clear();
    project
}

fn note_unknown(project: &Project, template: &str) {
    if !project.graph.contains(template) {
        eprintln!("Note: {} is not a known template.", template);
    }
}

fn print_list(items: &[String]) {
    if items.is_empty() {
        eprintln!("(none)");
    }
    for item in items {
        println!("{}", item);
    }
}

fn cmd_check(project_root: &Path, json: bool) -> Result<()> {
    let project = load(project_root)?;
    let report = validate::validate(&project.graph, &project.config.validation);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for undefined in &report.undefined {
            let level = if report.allow_undefined { "WARN" } else { "ERROR" };
            print!(
                "{}: undefined variable {} (required by {})",
                level,
                undefined.variable,
                undefined.required_by.join(", ")
            );
            match &undefined.suggestion {
                Some(suggestion) => println!(", did you mean {}?", suggestion),
                None => println!(),
            }
        }
        for dup in &report.duplicate_providers {
            let level = if report.strict_providers { "ERROR" } else { "WARN" };
            println!(
                "{}: variable {} is provided by {} templates: {}",
                level,
                dup.variable,
                dup.providers.len(),
                dup.providers.join(", ")
            );
        }
        if let Some(cycle) = &report.cycle {
            println!("ERROR: dependency cycle: {}", cycle.join(" → "));
        }
    }

    if report.is_ok() {
        eprintln!(
            "Project is valid. {} templates, {} variables, {} edges.",
            project.graph.template_count(),
            project.graph.variable_count(),
            project.graph.edge_count()
        );
        Ok(())
    } else {
        anyhow::bail!("validation failed with {} issue(s)", report.issue_count())
    }
}

fn cmd_deps(project_root: &Path, template: &str, transitive: bool) -> Result<()> {
    let project = load(project_root)?;
    note_unknown(&project, template);
    let deps = if transitive {
        project.graph.transitive_dependencies(template)
    } else {
        project.graph.dependencies_for(template)
    };
    print_list(&deps);
    Ok(())
}

fn cmd_dependents(project_root: &Path, template: &str, transitive: bool) -> Result<()> {
    let project = load(project_root)?;
    note_unknown(&project, template);
    let dependents = if transitive {
        project.graph.transitive_dependents(template)
    } else {
        project.graph.dependents_for(template)
    };
    print_list(&dependents);
    Ok(())
}

fn cmd_closed(project_root: &Path, templates: &[String], json: bool) -> Result<()> {
    let project = load(project_root)?;
    let report = project.graph.closure_report(templates);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_list(&report.kept);
    for dropped in &report.dropped {
        eprintln!(
            "Excluded {}: still needed by {}",
            dropped.template,
            dropped.blocked_by.join(", ")
        );
    }
    Ok(())
}

fn cmd_order(project_root: &Path, templates: &[String], retract: bool) -> Result<()> {
    let project = load(project_root)?;
    let graph = &project.graph;

    let planned = match (retract, templates.is_empty()) {
        (false, true) => order::deploy_order(graph)?,
        (false, false) => order::deploy_plan(graph, templates)?,
        (true, true) => order::retract_order(graph)?,
        (true, false) => {
            let plan = order::retract_plan(graph, templates)?;
            for dropped in &plan.dropped {
                eprintln!(
                    "Skipping {}: still needed by {}",
                    dropped.template,
                    dropped.blocked_by.join(", ")
                );
            }
            plan.order
        }
    };

    for (i, template) in planned.iter().enumerate() {
        println!("{:>3}. {}", i + 1, template);
    }
    Ok(())
}

fn cmd_export(project_root: &Path, format: ExportFormat) -> Result<()> {
    let project = load(project_root)?;
    print!("{}", stackdeps_core::export::export(&project.graph, format));
    Ok(())
}

fn cmd_info(project_root: &Path) -> Result<()> {
    let project = load(project_root)?;
    let graph = &project.graph;

    println!("Template root: {}", project.template_root.display());
    println!("Templates: {}", graph.template_count());
    println!("Variables: {}", graph.variable_count());
    println!("Edges: {}", graph.edge_count());
    println!("Undefined variables: {}", graph.undefined_variables().len());
    println!("Shared variables: {}", graph.duplicate_providers().len());
    Ok(())
}
