use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use scholar_lib::graph::{Consolidator, GraphAnalysis, TutorResponse};

use crate::app::App;
use crate::OutputFormat;

pub fn run_ingest(app: &App, file: &Path, format: &OutputFormat) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let response: TutorResponse =
        serde_json::from_str(&content).context("Failed to parse tutor response")?;

    let graph = app.load_graph()?;
    let before = (graph.concepts.len(), graph.links.len());

    let result = Consolidator::new(&app.config.graph).consolidate(&graph, &response);
    app.save_graph(&result.graph)?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "concepts": result.graph.concepts.len(),
                "links": result.graph.links.len(),
                "addedConcepts": result.graph.concepts.len() - before.0,
                "addedLinks": result.graph.links.len().saturating_sub(before.1),
                "aliases": result.aliases,
                "isValidTree": result.is_valid_tree,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!(
                "Graph now has {} concepts (+{}) and {} links (+{})",
                result.graph.concepts.len(),
                result.graph.concepts.len() - before.0,
                result.graph.links.len(),
                result.graph.links.len().saturating_sub(before.1)
            );
            let mut aliases: Vec<_> = result.aliases.iter().collect();
            aliases.sort();
            for (from, to) in aliases {
                println!("  merged {} into {}", from, to);
            }
            if !result.is_valid_tree {
                println!("Warning: the graph contains a cycle");
            }
        }
    }

    Ok(())
}

pub fn run_validate(app: &App, format: &OutputFormat) -> Result<()> {
    let graph = app.load_graph()?;
    let valid = graph.validate();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "isValidTree": valid,
                "concepts": graph.concepts.len(),
                "links": graph.links.len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if valid {
                println!(
                    "Graph is valid ({} concepts, {} links)",
                    graph.concepts.len(),
                    graph.links.len()
                );
            } else {
                println!(
                    "Graph is invalid: dangling link or cycle (run with RUST_LOG=warn for details)"
                );
            }
        }
    }

    Ok(())
}

pub fn run_analyze(app: &App, format: &OutputFormat) -> Result<()> {
    let graph = app.load_graph()?;
    let analysis =
        GraphAnalysis::analyze(&graph.concepts, &graph.links, app.config.graph.max_chains);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        OutputFormat::Plain => {
            if graph.is_empty() {
                println!("No concepts yet.");
                return Ok(());
            }

            let name = |id: &str| {
                graph
                    .concept(id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| id.to_string())
            };
            let names = |ids: &[String]| {
                ids.iter()
                    .map(|id| name(id.as_str()))
                    .collect::<Vec<_>>()
                    .join(", ")
            };

            println!("Roots:    {}", names(&analysis.roots));
            println!("Leaves:   {}", names(&analysis.leaves));
            println!();

            let name_width = graph
                .concepts
                .iter()
                .map(|c| c.name.len())
                .max()
                .unwrap_or(7)
                .clamp(7, 40);
            println!("{:<width$} {:<10} Depth", "Concept", "Mastery", width = name_width);
            println!(
                "{} {} {}",
                "\u{2500}".repeat(name_width),
                "\u{2500}".repeat(10),
                "\u{2500}".repeat(5)
            );
            for concept in &graph.concepts {
                println!(
                    "{:<width$} {:<10} {}",
                    crate::app::truncate(&concept.name, name_width),
                    concept.mastery.as_str(),
                    analysis.depth_of(&concept.id),
                    width = name_width
                );
            }

            if !analysis.chains.is_empty() {
                println!("\nLearning paths:");
                for chain in &analysis.chains {
                    let path: Vec<String> = chain.iter().map(|id| name(id.as_str())).collect();
                    println!("  {}", path.join(" \u{2192} "));
                }
            }

            println!("\n{} cluster(s)", analysis.clusters.len());
            for (i, cluster) in analysis.clusters.iter().enumerate() {
                println!("  {}. {}", i + 1, names(cluster));
            }
        }
    }

    Ok(())
}

/// Show one concept with its neighborhood
pub fn run_show(app: &App, id: &str, format: &OutputFormat) -> Result<()> {
    let graph = app.load_graph()?;
    let concept = graph
        .concept(id)
        .with_context(|| format!("No concept with id '{}'", id))?;
    let analysis =
        GraphAnalysis::analyze(&graph.concepts, &graph.links, app.config.graph.max_chains);
    let cards: Vec<_> = app
        .list_cards()?
        .into_iter()
        .filter(|c| c.concept_id.as_deref() == Some(id))
        .collect();

    match format {
        OutputFormat::Json => {
            let neighbors: Vec<serde_json::Value> = graph
                .neighbors(id)
                .map(|(node, link)| {
                    serde_json::json!({
                        "id": node.id,
                        "name": node.name,
                        "relationship": link.relationship,
                        "outgoing": link.source == id,
                    })
                })
                .collect();
            let output = serde_json::json!({
                "concept": concept,
                "depth": analysis.depth_of(id),
                "clusterSize": analysis.cluster_size(id),
                "neighbors": neighbors,
                "cards": cards.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{} [{}]", concept.name, concept.mastery);
            if let Some(description) = &concept.description {
                println!("  {}", description);
            }
            println!(
                "  Depth {} in a cluster of {}",
                analysis.depth_of(id),
                analysis.cluster_size(id)
            );
            for (node, link) in graph.neighbors(id) {
                let arrow = if link.source == id { "\u{2192}" } else { "\u{2190}" };
                println!("  {} {} ({}) [{}]", arrow, node.name, link.relationship, node.mastery);
            }
            if !cards.is_empty() {
                println!("  {} review card(s)", cards.len());
            }
        }
    }

    Ok(())
}
