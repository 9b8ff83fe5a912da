mod common;

use carerag_core::config::RetrievalSettings;
use carerag_core::types::{ChunkMetadata, Priority};
use carerag_retriever::context::{CRISIS_DEFAULT_CONTEXT, GENERAL_DEFAULT_CONTEXT};
use carerag_retriever::{KnowledgeSources, Retriever};

use common::{concept_store, retriever_in, sources_in, FULL_CORPUS_CHUNKS};

#[test]
fn anxious_about_exams_yields_short_anxiety_context() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let retriever = retriever_in(dir.path());

    let context = retriever.retrieve_knowledge("I'm feeling very anxious about exams", 2, 300);
    assert!(context.starts_with("[Educational] (mental_health_guide)\nAnxiety disorders"), "{context}");
    assert!(context.to_lowercase().contains("anxiety"));
    assert!(context.ends_with("..."));
    assert!(context.chars().count() <= 310, "got {} chars", context.chars().count());
    Ok(())
}

#[test]
fn counselor_contact_question_returns_directory_entry() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let retriever = retriever_in(dir.path());

    let context = retriever.retrieve_knowledge("How can I contact a counselor?", 3, 1500);
    assert!(context.starts_with("[Counselor Info] (counselors_directory)\nCounselor: Dr. Meera Nair"), "{context}");
    assert!(context.contains("Email: meera.nair@christuniversity.in"));
    assert!(context.contains("Phone:"));
    assert_eq!(context.matches("\n\n---\n\n").count(), 2);
    Ok(())
}

#[test]
fn high_priority_chunks_lead_the_context() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let retriever = retriever_in(dir.path());

    // Ranked: academic stress, anxiety, warning signs; warning signs is high priority.
    let context = retriever.retrieve_knowledge("worry about exams and coursework", 3, 1500);
    let headers: Vec<&str> = context
        .split("\n\n---\n\n")
        .filter_map(|block| block.lines().next())
        .collect();
    assert_eq!(
        headers,
        vec![
            "[Warning Signs] (crisis_guide)",
            "[Educational] (student_success_guide)",
            "[Educational] (mental_health_guide)",
        ]
    );
    Ok(())
}

#[test]
fn crisis_query_keeps_similarity_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let retriever = retriever_in(dir.path());

    let context = retriever.retrieve_knowledge("I'm having thoughts of suicide", 2, 1500);
    assert!(context.starts_with("[Crisis Resource] (crisis_guide)\nCrisis resources"), "{context}");
    assert!(context.contains("988"));
    Ok(())
}

#[test]
fn context_respects_budget() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let retriever = retriever_in(dir.path());

    for budget in [0, 120, 150, 300, 450, 800, 1500] {
        for query in ["worry about exams and coursework", "How can I contact a counselor?"] {
            let context = retriever.retrieve_knowledge(query, 3, budget);
            let is_default = context == GENERAL_DEFAULT_CONTEXT || context == CRISIS_DEFAULT_CONTEXT;
            assert!(
                is_default || context.chars().count() <= budget,
                "budget {budget}, query {query:?}: {} chars",
                context.chars().count()
            );
        }
    }
    Ok(())
}

#[test]
fn unmatched_queries_fall_back_by_keyword() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let retriever = retriever_in(dir.path());

    assert_eq!(retriever.retrieve_knowledge("I want to die", 3, 1500), CRISIS_DEFAULT_CONTEXT);
    assert_eq!(retriever.retrieve_knowledge("Where is the library?", 3, 1500), GENERAL_DEFAULT_CONTEXT);
    assert_eq!(retriever.retrieve_knowledge("", 3, 1500), GENERAL_DEFAULT_CONTEXT);
    Ok(())
}

#[test]
fn knowledge_loads_once_under_concurrent_first_queries() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let retriever = retriever_in(dir.path());
    assert!(!retriever.is_knowledge_loaded());

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| retriever.retrieve("How can I contact a counselor?"));
        }
    });

    assert!(retriever.is_knowledge_loaded());
    assert_eq!(retriever.get_stats().total_documents, FULL_CORPUS_CHUNKS);
    retriever.ensure_loaded();
    assert_eq!(retriever.get_stats().total_documents, FULL_CORPUS_CHUNKS);
    Ok(())
}

#[test]
fn missing_counselor_directory_keeps_static_documents() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let sources = KnowledgeSources {
        counselors_path: Some(dir.path().join("absent.json")),
        extra_documents_dir: None,
    };
    let retriever = Retriever::new(concept_store(dir.path()), sources, RetrievalSettings::default());
    retriever.ensure_loaded();

    assert!(retriever.is_knowledge_loaded());
    assert_eq!(retriever.get_stats().total_documents, 8);
    Ok(())
}

#[test]
fn custom_knowledge_is_searchable() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let retriever = retriever_in(dir.path());
    retriever.ensure_loaded();

    assert!(retriever.add_custom_knowledge("Peer support circle for exam stress meets every Friday.", None));
    assert!(!retriever.add_custom_knowledge("   ", None));
    assert!(retriever.add_custom_knowledge(
        "Night helpline volunteers handle crisis calls.",
        Some(ChunkMetadata::new("crisis_resource").with_source("volunteer_desk").with_priority(Priority::High)),
    ));

    let stats = retriever.get_stats();
    assert_eq!(stats.total_documents, FULL_CORPUS_CHUNKS + 2);
    assert!(stats.metadata_keys.contains(&"programs".to_string()));

    let context = retriever.retrieve_knowledge("exam stress", 1, 1500);
    assert!(context.starts_with("[Custom] (user_added)\nPeer support circle"), "{context}");
    Ok(())
}

#[test]
fn saved_snapshot_is_used_on_next_start() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let first = retriever_in(dir.path());
    assert!(!first.init(), "no snapshot on first start");
    assert_eq!(first.get_stats().total_documents, FULL_CORPUS_CHUNKS);
    assert!(first.add_custom_knowledge("Exam stress drop-in hours.", None));
    first.save_knowledge_base()?;

    let second = retriever_in(dir.path());
    assert!(second.init());
    assert!(second.is_knowledge_loaded());
    assert_eq!(second.get_stats(), first.get_stats());
    assert_eq!(
        second.retrieve_knowledge("How can I contact a counselor?", 3, 1500),
        first.retrieve_knowledge("How can I contact a counselor?", 3, 1500)
    );

    let rebuilt = Retriever::new(concept_store(dir.path()), sources_in(dir.path()), RetrievalSettings::default())
        .with_rebuild_on_start(true);
    assert!(!rebuilt.init());
    assert_eq!(rebuilt.get_stats().total_documents, FULL_CORPUS_CHUNKS);
    Ok(())
}

#[test]
fn concurrent_saves_all_succeed_and_restore() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let retriever = retriever_in(dir.path());
    retriever.init();

    let outcomes: Vec<bool> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    (0..5).all(|_| retriever.save_knowledge_base().is_ok())
                        && !retriever.retrieve("exam anxiety").is_empty()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(outcomes.iter().all(|ok| *ok));

    let restored = retriever_in(dir.path());
    assert!(restored.init());
    assert_eq!(restored.get_stats().total_documents, FULL_CORPUS_CHUNKS);
    Ok(())
}
