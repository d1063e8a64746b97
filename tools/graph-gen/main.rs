use clap::Parser;
use nodeweave::prelude::*;
use rand::Rng;
use rand::rngs::ThreadRng;
use rand::seq::IndexedRandom;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A CLI tool to generate random node graph documents for load testing
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated graph document to
    #[arg(short, long, default_value = "generated_graph.json")]
    output: String,

    /// The path to write the matching prototype definitions to
    #[arg(long, default_value = "generated_prototypes.json")]
    prototypes: String,

    /// The number of nodes to generate
    #[arg(short, long, default_value_t = 200)]
    nodes: usize,

    /// The number of link attempts per node; invalid attempts are simply dropped
    #[arg(long, default_value_t = 2)]
    links_per_node: usize,

    /// Half the side length of the square the nodes are scattered over
    #[arg(long, default_value_t = 5_000.0)]
    spread: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.spread <= 0.0 {
        eprintln!("Error: --spread must be positive, got {}", cli.spread);
        std::process::exit(1);
    }

    println!("Generating a graph with {} nodes...", cli.nodes);

    let prototypes = generate_prototypes();
    let mut store = GraphStore::builder()
        .with_config(EditorConfig {
            event_history_limit: 0,
            dynamic_port_prototypes: vec!["merge".to_string()],
            ..EditorConfig::default()
        })
        .with_id_generator(SequentialIds::new("g"))
        .with_prototypes(&prototypes)
        .build()?;

    let ids = generate_nodes(&mut store, &mut rng, &prototypes, cli.nodes, cli.spread)?;
    let links = generate_links(&mut store, &mut rng, &ids, cli.links_per_node);
    info!(nodes = ids.len(), links, "generated graph");

    fs::write(&cli.output, store.to_json(true)?)?;
    fs::write(
        &cli.prototypes,
        serde_json::to_string_pretty(&prototypes.iter().map(|p| p.as_ref()).collect::<Vec<_>>())?,
    )?;

    println!(
        "Successfully generated {} nodes and {} links to '{}' (prototypes in '{}')",
        ids.len(),
        links,
        cli.output,
        cli.prototypes
    );

    Ok(())
}

/// A small palette of prototypes covering single and multi-link ports, every built-in
/// field type and one prototype that accepts dynamic ports.
fn generate_prototypes() -> PrototypeRegistry {
    let mut registry = PrototypeRegistry::new();
    registry.register(
        NodePrototype::new("constant")
            .with_category("input")
            .with_port(PortPrototype::output("value", "number").multiple())
            .with_field(FieldPrototype::new("value", "number", 0.0.into())),
    );
    registry.register(
        NodePrototype::new("add")
            .with_category("math")
            .with_port(PortPrototype::input("a", "number"))
            .with_port(PortPrototype::input("b", "number"))
            .with_port(PortPrototype::output("sum", "number").multiple()),
    );
    registry.register(
        NodePrototype::new("label")
            .with_category("output")
            .with_port(PortPrototype::input("value", "any"))
            .with_field(FieldPrototype::new("text", "string", "".into()))
            .with_field(FieldPrototype::new("visible", "boolean", true.into())),
    );
    registry.register(
        NodePrototype::new("merge")
            .with_category("flow")
            .with_port(PortPrototype::output("out", "vector").multiple())
            .with_field(FieldPrototype::new(
                "weights",
                "vector",
                FieldValue::Vector(vec![1.0]),
            )),
    );
    registry
}

fn generate_nodes(
    store: &mut GraphStore,
    rng: &mut ThreadRng,
    prototypes: &PrototypeRegistry,
    count: usize,
    spread: f64,
) -> Result<Vec<String>, GraphError> {
    let names: Vec<&str> = prototypes.names().collect();
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(&name) = names.choose(rng) else {
            break;
        };
        let offset = Point::new(
            rng.random_range(-spread..spread),
            rng.random_range(-spread..spread),
        );
        let id = store.add_node(name, offset)?.id.clone();

        if name == "merge" {
            for i in 0..rng.random_range(1..4) {
                store.add_dynamic_port(
                    &id,
                    &format!("in{}", i),
                    "number",
                    &format!("Input {}", i + 1),
                    PortDirection::Input,
                )?;
            }
        }
        if rng.random_bool(0.1) {
            store.select_by_ids([&id]);
            store.collapse_selected();
        }
        ids.push(id);
    }
    store.clear_selection();
    println!("-> Generated {} nodes.", ids.len());
    Ok(ids)
}

/// Picks random port pairs and keeps whatever the store accepts.
fn generate_links(
    store: &mut GraphStore,
    rng: &mut ThreadRng,
    ids: &[String],
    per_node: usize,
) -> usize {
    let mut created = 0;
    for _ in 0..ids.len() * per_node {
        let (Some(from), Some(to)) = (ids.choose(rng), ids.choose(rng)) else {
            break;
        };
        if from == to {
            continue;
        }
        let pick = |store: &GraphStore, node: &str, rng: &mut ThreadRng| {
            let ports: Vec<String> = store.node(node)?.ports.keys().cloned().collect();
            ports.choose(rng).cloned()
        };
        let from_port = pick(&*store, from, &mut *rng);
        let to_port = pick(&*store, to, &mut *rng);
        let (Some(from_port), Some(to_port)) = (from_port, to_port) else {
            continue;
        };
        if store.add_link(from, &from_port, to, &to_port).is_some() {
            created += 1;
        }
    }
    println!("-> Generated {} links.", created);
    created
}
