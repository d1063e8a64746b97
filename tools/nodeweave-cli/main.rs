use clap::Parser;
use itertools::Itertools;
use nodeweave::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Inspect, validate and re-serialize a node graph document
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the node prototype definitions JSON file
    prototypes_path: String,
    /// Path to the graph document JSON file
    document_path: String,

    /// Optional editor configuration JSON file
    #[arg(short, long)]
    config: Option<String>,

    /// List the nodes whose footprint intersects this world rectangle: x0,y0,x1,y1
    #[arg(long, value_delimiter = ',', num_args = 4)]
    area: Option<Vec<f64>>,

    /// Footprint assumed for every node when answering area queries: width,height
    #[arg(long, value_delimiter = ',', num_args = 2, default_values_t = [200.0, 100.0])]
    node_size: Vec<f64>,

    /// Write the re-serialized document to this path
    #[arg(short, long)]
    output: Option<String>,

    /// Exit with an error if any node was skipped or any link pruned
    #[arg(long)]
    strict: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let total_start = Instant::now();

    // --- 1. File Loading ---
    let prototypes_json = fs::read_to_string(&cli.prototypes_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read prototypes file '{}': {}",
            cli.prototypes_path, e
        ))
    });
    let document_json = fs::read_to_string(&cli.document_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read document file '{}': {}",
            cli.document_path, e
        ))
    });
    let config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to read config file '{}': {}", path, e))
            });
            EditorConfig::from_json_str(&json)
                .unwrap_or_else(|e| exit_with_error(&e.to_string()))
        }
        None => EditorConfig::default(),
    };

    // --- 2. Store Assembly and Load ---
    let registry = PrototypeRegistry::from_json_str(&prototypes_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid prototypes: {}", e)));
    let mut store = GraphStore::builder()
        .with_config(config)
        .with_prototypes(&registry)
        .build()
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    let load_start = Instant::now();
    let report = store
        .load_json_str(&document_json)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let load_duration = load_start.elapsed();

    // --- 3. Summary ---
    println!("--- Document Summary ---");
    println!("Prototypes registered: {}", store.registry().len());
    println!("Nodes loaded:          {}", report.loaded.len());
    println!("Links:                 {}", store.link_count());
    let dynamic_ports = store
        .nodes()
        .flat_map(|n| n.ports.values())
        .filter(|p| p.is_dynamic)
        .count();
    println!("Dynamic ports:         {}", dynamic_ports);
    let collapsed = store.nodes().filter(|n| n.state.is_collapsed).count();
    println!("Collapsed nodes:       {}", collapsed);

    println!("\nNodes by prototype:");
    for (name, count) in store
        .nodes()
        .map(|n| n.prototype_name())
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)))
    {
        println!("  {:<24} {}", name, count);
    }

    // --- 4. Validation ---
    println!("\n--- Validation ---");
    if report.skipped.is_empty() && report.pruned_links.is_empty() {
        println!("Document is consistent with the registered prototypes.");
    }
    for (id, reason) in &report.skipped {
        println!("  skipped node {}: {}", id, reason);
    }
    for id in &report.pruned_links {
        println!("  pruned link {}", id);
    }

    // --- 5. Area Query ---
    if let Some(area) = &cli.area {
        let size = Size::new(cli.node_size[0], cli.node_size[1]);
        let footprints: Vec<RenderedNode> = store
            .nodes()
            .map(|n| RenderedNode {
                node_id: n.id.clone(),
                rect: Rect::from_origin_size(n.offset, size),
                port_offsets: Vec::new(),
            })
            .collect();
        for footprint in footprints {
            if let Err(e) = store.on_node_rendered(footprint) {
                exit_with_error(&e.to_string());
            }
        }

        let query = Rect::from_corners(Point::new(area[0], area[1]), Point::new(area[2], area[3]));
        let hits = store.spatial_index().query_ids_in_area(&query);
        println!("\n--- Area Query {:?} ---", query);
        for node in store.nodes().filter(|n| hits.contains(&n.id)) {
            println!(
                "  {} ({}) at [{}, {}]",
                node.id,
                node.prototype_name(),
                node.offset.x,
                node.offset.y
            );
        }
        println!("{} node(s) found", hits.len());
    }

    // --- 6. Re-serialization ---
    if let Some(path) = &cli.output {
        let json = store
            .to_json(true)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
        fs::write(path, json)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", path, e)));
        println!("\nWrote re-serialized document to '{}'", path);
    }

    println!("\n--- Performance Summary ---");
    println!("Document Load:    {:?}", load_duration);
    println!("Total Execution:  {:?}", total_start.elapsed());

    if cli.strict && (!report.skipped.is_empty() || !report.pruned_links.is_empty()) {
        exit_with_error("document references unknown prototypes or dangling links");
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
