// Parallel graph builder using rayon

use super::builder::{merge, prepare};
use super::{Graph, GraphBuilder, GraphFragment, GraphInput};
use rayon::prelude::*;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Parallel graph builder for faster ingestion
///
/// Each worker converts one fragment into graph entities on its own, then
/// merges it through the single mutation section guarding the shared graph.
pub struct ParallelGraphBuilder;

impl ParallelGraphBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build a graph from fragments using parallel processing
    pub fn build_from_fragments(&self, fragments: Vec<GraphFragment>) -> Graph {
        info!("Ingesting {} fragments in parallel...", fragments.len());

        let shared = Mutex::new(Graph::new());

        fragments.into_par_iter().for_each(|fragment| {
            let path = fragment.file.path.clone();
            let prepared = prepare(fragment);
            debug!(
                "Prepared {} declarations from {}",
                prepared.declaration_count(),
                path.display()
            );

            let mut graph = shared.lock().unwrap_or_else(PoisonError::into_inner);
            merge(&mut graph, prepared);
        });

        let graph = shared.into_inner().unwrap_or_else(PoisonError::into_inner);

        info!(
            "Ingested {} declarations, {} references",
            graph.declaration_count(),
            graph.reference_count()
        );

        graph
    }

    /// Build a graph from a complete front-end document
    pub fn build(&self, input: GraphInput) -> Graph {
        let GraphInput {
            fragments,
            module_exports,
            asset_references,
        } = input;

        let graph = self.build_from_fragments(fragments);
        let mut builder = GraphBuilder::from_graph(graph);
        builder.add_metadata(module_exports, asset_references);
        builder.build()
    }
}

impl Default for ParallelGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
