use std::{env, time::Duration};

use carerag_cli::{init_tracing, verify_setup, SMOKE_CONTEXT_LENGTH, SMOKE_MAX_RESULTS, SMOKE_QUERIES};
use carerag_core::config::Config;
use carerag_retriever::Retriever;
use indicatif::{ProgressBar, ProgressStyle};

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut rebuild = false;
    for arg in &args {
        match arg.as_str() {
            "--rebuild" | "-r" => rebuild = true,
            "--help" | "-h" => {
                println!("Usage: carerag-init [--rebuild]");
                return Ok(());
            }
            other => {
                eprintln!("Error: unknown argument '{}'", other);
                std::process::exit(2);
            }
        }
    }

    println!("Mental Health Support - knowledge base initialization");
    println!("{}", "=".repeat(60));

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;

    println!("🔍 Verifying setup...");
    let problems = verify_setup(&config, &settings);
    if !problems.is_empty() {
        for p in &problems { println!("   ❌ {}", p); }
        println!("\nPlease fix the setup issues and try again.");
        std::process::exit(1);
    }
    println!("✅ Setup verification passed");

    if let Err(e) = build(&config, rebuild || settings.knowledge.rebuild_on_start) {
        println!("❌ Error initializing knowledge base: {:#}", e);
        println!("\nPlease ensure you have:");
        println!("1. Set OPENAI_API_KEY in the environment or a .env file (or select the hash embedding provider)");
        println!("2. A readable counselor directory at the configured knowledge.counselors_path");
        std::process::exit(1);
    }

    println!("\n✨ Ready to help students with mental health support!");
    Ok(())
}

fn build(config: &Config, rebuild: bool) -> anyhow::Result<()> {
    let retriever = Retriever::from_config(config)?.with_rebuild_on_start(rebuild);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Loading mental health knowledge base...");
    let restored = retriever.init();
    pb.finish_with_message(if restored { "✅ Knowledge base restored from snapshot" } else { "✅ Knowledge base built" });

    let stats = retriever.get_stats();
    println!("📊 Statistics:");
    println!("   - Total documents: {}", stats.total_documents);
    println!("   - Vector dimension: {}", stats.dimension);
    println!("   - Index size: {}", stats.index_size);
    if !stats.metadata_keys.is_empty() {
        println!("   - Metadata categories: {}", stats.metadata_keys.join(", "));
    }
    if stats.total_documents == 0 {
        anyhow::bail!("no knowledge could be embedded; check the embedding provider");
    }

    println!("\n🧪 Testing retrieval system...");
    for query in SMOKE_QUERIES {
        println!("\n   Query: '{}'", query);
        let context = retriever.retrieve_knowledge(query, SMOKE_MAX_RESULTS, SMOKE_CONTEXT_LENGTH);
        if context.is_empty() {
            println!("    No context retrieved");
        } else {
            println!("    Retrieved context ({} characters)", context.chars().count());
        }
    }

    println!("\n💾 Saving knowledge base to disk...");
    retriever.save_knowledge_base()?;
    println!("\nRAG system initialization complete!");
    Ok(())
}
