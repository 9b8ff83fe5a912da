use std::env;

use carerag_cli::init_tracing;
use carerag_core::config::Config;
use carerag_retriever::Retriever;

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut max_results = settings.retrieval.max_results;
    let mut context_length = settings.retrieval.context_length;
    let mut show_stats = false;
    let mut words: Vec<String> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--max-results" | "-k" => { max_results = parse_number(&args, i, "--max-results"); i += 1; }
            "--context-length" | "-c" => { context_length = parse_number(&args, i, "--context-length"); i += 1; }
            "--stats" => show_stats = true,
            _ => words.push(args[i].clone()),
        }
        i += 1;
    }

    if words.is_empty() && !show_stats {
        eprintln!("Usage: carerag-query [--max-results N] [--context-length N] [--stats] <query>");
        std::process::exit(2);
    }

    let retriever = Retriever::from_config(&config)?;
    retriever.init();

    if show_stats {
        let stats = retriever.get_stats();
        println!("documents: {}  dimension: {}  index size: {}", stats.total_documents, stats.dimension, stats.index_size);
        println!("metadata keys: {}", stats.metadata_keys.join(", "));
    }
    if !words.is_empty() {
        let query = words.join(" ");
        println!("{}", retriever.retrieve_knowledge(&query, max_results, context_length));
    }
    Ok(())
}

fn parse_number(args: &[String], i: usize, flag: &str) -> usize {
    match args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
        Some(n) => n,
        None => {
            eprintln!("Error: {} requires a number", flag);
            std::process::exit(2);
        }
    }
}
