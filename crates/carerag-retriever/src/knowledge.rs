//! The knowledge corpus: built-in mental-health documents, counselor
//! directory entries and optional plain-text reference files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use carerag_core::config::{resolve_with_base, KnowledgeSettings};
use carerag_core::error::{Error, Result};
use carerag_core::types::{ChunkMetadata, Document, Priority};

const SERVICE_INFO: &str = "\
University Counseling Services at Christ University are available to support students with mental health concerns.
Services include individual counseling, group therapy, crisis intervention, and wellness workshops.
All counseling services are free and confidential for enrolled students.
Hours: Monday to Friday, 9 AM to 5 PM
Emergency support is available 24/7 through campus security.";

const DEPRESSION: &str = "\
Common signs of depression include persistent sadness, loss of interest in activities,
changes in appetite or sleep patterns, fatigue, difficulty concentrating, and feelings of worthlessness.
If you experience these symptoms for more than two weeks, it's important to seek professional help.
Depression is a treatable medical condition, not a personal weakness.";

const ANXIETY: &str = "\
Anxiety disorders are characterized by excessive worry, fear, or nervousness that interferes with daily activities.
Symptoms may include rapid heartbeat, sweating, trembling, difficulty breathing, and avoidance of situations.
Coping strategies include deep breathing exercises, mindfulness meditation, regular exercise, and professional therapy.
Cognitive-behavioral therapy (CBT) is particularly effective for anxiety disorders.";

const CRISIS_RESOURCES: &str = "\
Crisis resources for students in immediate danger:
- National Suicide Prevention Lifeline: 988 (24/7, free, confidential)
- Crisis Text Line: Text HOME to 741741
- Emergency services: 911 or campus security
- Christ University Campus Security: Available 24/7
If you are having thoughts of self-harm, reach out immediately. You are not alone.";

const STRESS_MANAGEMENT: &str = "\
Stress management techniques for students:
1. Time management and organization
2. Regular exercise and physical activity
3. Adequate sleep (7-9 hours per night)
4. Healthy eating habits
5. Mindfulness and meditation practices
6. Social connections and support systems
7. Setting realistic goals and expectations
8. Taking regular breaks and practicing self-care";

const ACADEMIC_STRESS: &str = "\
Academic stress is common among university students and can manifest as:
- Overwhelming feelings about coursework
- Procrastination and avoidance
- Perfectionism and fear of failure
- Difficulty concentrating or making decisions
- Physical symptoms like headaches or fatigue
Resources include study skills workshops, time management training, and academic counseling.";

const RESILIENCE: &str = "\
Building resilience and emotional wellbeing:
- Develop a growth mindset
- Practice gratitude and positive thinking
- Build strong social connections
- Engage in meaningful activities and hobbies
- Learn healthy coping mechanisms
- Seek help when needed - it's a sign of strength, not weakness";

const WARNING_SIGNS: &str = "\
Warning signs that indicate you should seek immediate professional help:
- Persistent thoughts of death or suicide
- Severe depression that interferes with daily functioning
- Panic attacks or severe anxiety
- Substance abuse or harmful behaviors
- Inability to cope with daily stressors
- Significant changes in eating or sleeping patterns
- Withdrawal from friends, family, and activities";

fn meta(kind: &str, category: &str, source: &str) -> ChunkMetadata {
    ChunkMetadata::new(kind).with_category(category).with_source(source)
}

/// The eight built-in documents. Crisis resources and warning signs carry
/// high priority.
pub fn static_documents() -> Vec<Document> {
    vec![
        Document::new(SERVICE_INFO, meta("service_info", "counseling_services", "university_handbook")),
        Document::new(DEPRESSION, meta("educational", "depression", "mental_health_guide")),
        Document::new(ANXIETY, meta("educational", "anxiety", "mental_health_guide")),
        Document::new(
            CRISIS_RESOURCES,
            meta("crisis_resource", "emergency", "crisis_guide").with_priority(Priority::High),
        ),
        Document::new(STRESS_MANAGEMENT, meta("coping_strategies", "stress_management", "wellness_guide")),
        Document::new(ACADEMIC_STRESS, meta("educational", "academic_stress", "student_success_guide")),
        Document::new(RESILIENCE, meta("wellness_tips", "resilience", "wellness_guide")),
        Document::new(
            WARNING_SIGNS,
            meta("warning_signs", "crisis_indicators", "crisis_guide").with_priority(Priority::High),
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counselor {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
}

/// One record of the counselor directory file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounselorEntry {
    pub counselor: Counselor,
    pub programs: Vec<String>,
}

pub fn load_counselor_directory(path: &Path) -> Result<Vec<CounselorEntry>> {
    if !path.is_file() {
        return Err(Error::NotFound(format!("counselor directory {}", path.display())));
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn counselor_document(entry: &CounselorEntry) -> Document {
    let c = &entry.counselor;
    let content = format!(
        "Counselor: {}\nEmail: {}\nPhone: {}\nLocation: {}\nPrograms served: {}\n\n\
         This counselor provides mental health support and counseling services\n\
         for students in the specified academic programs.",
        c.name,
        c.email,
        c.phone,
        c.location,
        entry.programs.join(", ")
    );
    let metadata = meta("counselor_info", "staff", "counselors_directory")
        .with_extra("counselor_name", serde_json::Value::String(c.name.clone()))
        .with_extra("programs", serde_json::json!(entry.programs));
    Document::new(content, metadata)
}

/// Every `*.txt` file under `root`, in path order, as a `reference` document
/// sourced by its file stem.
pub fn load_text_documents(root: &Path) -> Result<Vec<Document>> {
    if !root.is_dir() {
        return Err(Error::NotFound(format!("documents directory {}", root.display())));
    }
    let mut txt_files: Vec<PathBuf> = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("txt") {
            txt_files.push(path.to_path_buf());
        }
    }
    txt_files.sort();

    let mut docs = Vec::with_capacity(txt_files.len());
    for path in txt_files {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => String::from_utf8_lossy(&fs::read(&path)?).to_string(),
        };
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("reference");
        docs.push(Document::new(content, ChunkMetadata::new("reference").with_source(stem)));
    }
    Ok(docs)
}

/// Where the non-built-in knowledge comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeSources {
    pub counselors_path: Option<PathBuf>,
    pub extra_documents_dir: Option<PathBuf>,
}

impl KnowledgeSources {
    /// Resolve the configured paths against `base_dir`.
    pub fn from_settings(settings: &KnowledgeSettings, base_dir: &Path) -> Self {
        Self {
            counselors_path: settings.counselors_path.as_ref().map(|p| resolve_with_base(base_dir, p)),
            extra_documents_dir: settings.extra_documents_dir.as_ref().map(|p| resolve_with_base(base_dir, p)),
        }
    }

    /// Built-in documents followed by counselor entries and reference files.
    /// A source that cannot be read is logged and skipped.
    pub fn collect_documents(&self) -> Vec<Document> {
        let mut docs = static_documents();

        if let Some(path) = &self.counselors_path {
            match load_counselor_directory(path) {
                Ok(entries) => {
                    info!(path = %path.display(), counselors = entries.len(), "loaded counselor directory");
                    docs.extend(entries.iter().map(counselor_document));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping counselor directory"),
            }
        }

        if let Some(dir) = &self.extra_documents_dir {
            match load_text_documents(dir) {
                Ok(extra) => {
                    info!(dir = %dir.display(), documents = extra.len(), "loaded reference documents");
                    docs.extend(extra);
                }
                Err(e) => warn!(dir = %dir.display(), error = %e, "skipping reference documents"),
            }
        }

        docs
    }
}
