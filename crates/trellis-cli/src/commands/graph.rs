//! Graph view export.

use std::path::Path;

use color_eyre::Result;

use trellis_core::graph::GraphBuilder;
use trellis_core::storage::{FileStorage, Storage};

/// Builds the graph view and writes it as JSON to stdout or a file.
pub fn run(storage: &FileStorage, output: Option<&Path>) -> Result<()> {
    let catalog = storage.load()?;
    let graph = GraphBuilder::new().build(&catalog.entities, &catalog.relations);

    let json = serde_json::to_string_pretty(&graph)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!(
                "Wrote {} nodes, {} edges to {}",
                graph.nodes.len(),
                graph.edges.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
