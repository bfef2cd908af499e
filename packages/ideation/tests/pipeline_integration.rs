//! End-to-end pipeline scenarios against the in-memory store.

use std::sync::Arc;

use ideation::testing::{MockTextGenerator, MockWebSearcher};
use ideation::{
    GenerationConfig, GenerationError, GenerationPipeline, MemoryRunStore, RunStatus, SearchHit,
};
use uuid::Uuid;

fn hits(count: usize) -> Vec<SearchHit> {
    (0..count)
        .map(|i| SearchHit {
            title: format!("обсуждение {}", i),
            url: format!("https://reddit.com/r/saas/{}", i),
            content: "exporting reports takes forever, I hate this".to_string(),
            score: 0.8,
        })
        .collect()
}

fn pains_json() -> String {
    let pains: Vec<serde_json::Value> = (0..4)
        .map(|i| {
            serde_json::json!({
                "pain_description": format!("боль номер {}", i),
                "segment": "аналитики в малом бизнесе",
                "evidence_quotes": ["exporting reports takes forever"],
                "confidence_level": "high"
            })
        })
        .collect();
    serde_json::to_string(&pains).unwrap()
}

fn ideas_json(count: usize) -> String {
    let ideas: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "title": format!("Идея {}", i),
                "pain_description": "выгрузка отчётов занимает часы",
                "segment": "аналитики",
                "confidence_level": "high",
                "brief_evidence": "жалобы на Reddit",
                "plan_7days": ["поговорить с 10 пользователями"],
                "plan_30days": ["собрать MVP"],
                "analogues": [
                    {"name": "Notion", "description": "docs", "url": "https://notion.so"}
                ]
            })
        })
        .collect();
    serde_json::to_string(&ideas).unwrap()
}

#[tokio::test]
async fn grounded_happy_path_completes_with_ideas() {
    let store = Arc::new(MemoryRunStore::new());
    let run_id = store.insert_run(Some("B2B SaaS для малого бизнеса"));

    // 12 documents → 1 extraction batch, then 1 generation call
    let generator = MockTextGenerator::new();
    generator.push_response(pains_json());
    generator.push_response(ideas_json(12));

    let pipeline = GenerationPipeline::new(
        store.clone(),
        Arc::new(generator),
        Arc::new(MockWebSearcher::with_hits(hits(12))),
    );

    let saved = pipeline.execute(run_id).await.unwrap();
    assert_eq!(saved, 12);

    let run = store.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.current_stage.as_deref(), Some("Завершено"));
    assert_eq!(run.ideas_count, 12);
    assert_eq!(
        run.selected_direction.as_deref(),
        Some("B2B SaaS для малого бизнеса")
    );
    assert!(run.completed_at.is_some());
    assert!(run.error_message.is_none());

    let ideas = store.ideas_for_run(run_id);
    assert_eq!(ideas.len(), 12);
    assert_eq!(ideas[0].draft.analogues.len(), 1);
}

#[tokio::test]
async fn order_index_follows_model_output_order() {
    let store = Arc::new(MemoryRunStore::new());
    let run_id = store.insert_run(Some("dev tools"));

    let generator = MockTextGenerator::new();
    // Search returns nothing, so the single scripted response feeds the
    // fallback generation call
    generator.push_response(ideas_json(5));

    let pipeline = GenerationPipeline::new(
        store.clone(),
        Arc::new(generator),
        Arc::new(MockWebSearcher::empty()),
    );
    pipeline.execute(run_id).await.unwrap();

    let ideas = store.ideas_for_run(run_id);
    let indices: Vec<i32> = ideas.iter().map(|i| i.order_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(ideas[0].draft.title, "Идея 0");
    assert_eq!(ideas[4].draft.title, "Идея 4");
}

#[tokio::test]
async fn failing_search_degrades_to_fallback_and_completes() {
    let store = Arc::new(MemoryRunStore::new());
    let run_id = store.insert_run(Some("инструменты для разработчиков"));

    let generator = MockTextGenerator::new();
    generator.push_response(ideas_json(3));

    let pipeline = GenerationPipeline::new(
        store.clone(),
        Arc::new(generator),
        Arc::new(MockWebSearcher::failing()),
    );

    let saved = pipeline.execute(run_id).await.unwrap();
    assert_eq!(saved, 3);
    assert_eq!(store.get_run(run_id).unwrap().status, RunStatus::Completed);
}

#[tokio::test]
async fn fallback_with_too_few_ideas_fails_and_keeps_partial_rows() {
    let store = Arc::new(MemoryRunStore::new());
    let run_id = store.insert_run(None);

    let generator = MockTextGenerator::new();
    generator.push_response(ideas_json(2));

    let pipeline = GenerationPipeline::new(
        store.clone(),
        Arc::new(generator),
        Arc::new(MockWebSearcher::empty()),
    );

    let err = pipeline.execute(run_id).await.unwrap_err();
    assert!(matches!(
        err,
        GenerationError::TooFewIdeas {
            saved: 2,
            required: 3
        }
    ));

    let run = store.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run
        .error_message
        .as_deref()
        .unwrap()
        .contains("Недостаточно идей сгенерировано: 2"));
    assert!(run.completed_at.is_none());
    // Already-inserted ideas survive the failure
    assert_eq!(store.ideas_for_run(run_id).len(), 2);
}

#[tokio::test]
async fn non_json_generation_output_fails_run_with_parse_message() {
    let store = Arc::new(MemoryRunStore::new());
    let run_id = store.insert_run(Some("онлайн-образование"));

    let generator = MockTextGenerator::new();
    generator.push_response("извините, не могу помочь");

    let pipeline = GenerationPipeline::new(
        store.clone(),
        Arc::new(generator),
        Arc::new(MockWebSearcher::empty()),
    );

    let err = pipeline.execute(run_id).await.unwrap_err();
    assert!(matches!(err, GenerationError::ResponseParse(_)));

    let run = store.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run
        .error_message
        .as_deref()
        .unwrap()
        .contains("Ошибка парсинга ответа LLM"));
}

#[tokio::test]
async fn generation_provider_error_fails_run() {
    let store = Arc::new(MemoryRunStore::new());
    let run_id = store.insert_run(Some("контент-мейкеры"));

    let generator = MockTextGenerator::new();
    generator.push_error("model unavailable");

    let pipeline = GenerationPipeline::new(
        store.clone(),
        Arc::new(generator),
        Arc::new(MockWebSearcher::empty()),
    );

    assert!(pipeline.execute(run_id).await.is_err());

    let run = store.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("Ошибка генерации:"));
}

#[tokio::test]
async fn unknown_run_is_rejected_without_state_changes() {
    let store = Arc::new(MemoryRunStore::new());
    let pipeline = GenerationPipeline::new(
        store.clone(),
        Arc::new(MockTextGenerator::new()),
        Arc::new(MockWebSearcher::empty()),
    );

    let err = pipeline.execute(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, GenerationError::RunNotFound { .. }));
}

#[tokio::test]
async fn non_pending_run_is_rejected_and_not_overwritten() {
    let store = Arc::new(MemoryRunStore::new());
    let run_id = store.insert_run(Some("B2B SaaS"));

    // Finish the run once
    let generator = MockTextGenerator::new();
    generator.push_response(ideas_json(3));
    let pipeline = GenerationPipeline::new(
        store.clone(),
        Arc::new(generator),
        Arc::new(MockWebSearcher::empty()),
    );
    pipeline.execute(run_id).await.unwrap();

    // A second execution must refuse and leave the terminal state alone
    let second = GenerationPipeline::new(
        store.clone(),
        Arc::new(MockTextGenerator::new()),
        Arc::new(MockWebSearcher::empty()),
    );
    let err = second.execute(run_id).await.unwrap_err();
    assert!(matches!(err, GenerationError::InvalidState { .. }));

    let run = store.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.ideas_count, 3);
}

#[tokio::test]
async fn ideas_capped_at_configured_maximum() {
    let store = Arc::new(MemoryRunStore::new());
    let run_id = store.insert_run(Some("фрилансеры"));

    let generator = MockTextGenerator::new();
    generator.push_response(ideas_json(20));

    let pipeline = GenerationPipeline::with_config(
        store.clone(),
        Arc::new(generator),
        Arc::new(MockWebSearcher::empty()),
        GenerationConfig::default(),
    );

    let saved = pipeline.execute(run_id).await.unwrap();
    assert_eq!(saved, 15);
    assert_eq!(store.ideas_for_run(run_id).len(), 15);
}

#[tokio::test]
async fn blank_direction_resolves_to_deterministic_default() {
    let store = Arc::new(MemoryRunStore::new());
    let run_id = store.insert_run(Some("   "));

    let generator = MockTextGenerator::new();
    generator.push_response(ideas_json(3));

    let pipeline = GenerationPipeline::new(
        store.clone(),
        Arc::new(generator),
        Arc::new(MockWebSearcher::empty()),
    );
    pipeline.execute(run_id).await.unwrap();

    let run = store.get_run(run_id).unwrap();
    let selected = run.selected_direction.unwrap();
    assert!(!selected.trim().is_empty());
    assert_ne!(selected.trim(), "");
}

#[tokio::test]
async fn analogues_keep_model_output_order() {
    let store = Arc::new(MemoryRunStore::new());
    let run_id = store.insert_run(Some("B2B SaaS"));

    let idea = serde_json::json!({
        "title": "Идея",
        "pain_description": "выгрузка отчётов занимает часы",
        "segment": "аналитики",
        "confidence_level": "high",
        "brief_evidence": "жалобы на Reddit",
        "plan_7days": ["шаг"],
        "plan_30days": ["шаг"],
        "analogues": [
            {"name": "Первый", "description": "a", "url": "https://a.example"},
            {"name": "Второй", "description": "b", "url": "https://b.example"},
            {"name": "Третий", "description": "c", "url": "https://c.example"}
        ]
    });
    let response = serde_json::to_string(&vec![idea.clone(), idea.clone(), idea]).unwrap();

    let generator = MockTextGenerator::new();
    generator.push_response(response);

    let pipeline = GenerationPipeline::new(
        store.clone(),
        Arc::new(generator),
        Arc::new(MockWebSearcher::empty()),
    );
    pipeline.execute(run_id).await.unwrap();

    let ideas = store.ideas_for_run(run_id);
    let names: Vec<&str> = ideas[0]
        .draft
        .analogues
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, vec!["Первый", "Второй", "Третий"]);
}

#[tokio::test]
async fn raised_quality_floor_rejects_borderline_output() {
    let store = Arc::new(MemoryRunStore::new());
    let run_id = store.insert_run(Some("B2B SaaS"));

    let generator = MockTextGenerator::new();
    generator.push_response(ideas_json(4));

    let pipeline = GenerationPipeline::with_config(
        store.clone(),
        Arc::new(generator),
        Arc::new(MockWebSearcher::empty()),
        GenerationConfig::default().with_min_ideas(5),
    );

    let err = pipeline.execute(run_id).await.unwrap_err();
    assert!(matches!(
        err,
        GenerationError::TooFewIdeas { saved: 4, required: 5 }
    ));
    assert_eq!(store.get_run(run_id).unwrap().status, RunStatus::Failed);
}
