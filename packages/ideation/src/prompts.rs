//! Prompt construction for pain extraction and idea generation.
//!
//! Two generation prompts exist: the grounded one conditioned on real
//! extracted pains, and the fallback used when the evidence is too thin to
//! present as grounded.

use uuid::Uuid;

use crate::types::{ExtractedPain, SourceDocument};

/// System instruction for the idea generation call.
pub const GENERATE_SYSTEM_PROMPT: &str = "Ты опытный продуктовый аналитик и предприниматель. \
Ты превращаешь реальные пользовательские боли в конкретные бизнес-идеи. \
Ты отвечаешь строго валидным JSON без пояснений и комментариев.";

/// System instruction for the pain extraction call.
pub const EXTRACT_SYSTEM_PROMPT: &str = "Ты эксперт по анализу пользовательских болей. \
Ты извлекаешь структурированные данные из сырых текстов.";

/// Default directions used when the caller supplies none.
const DEFAULT_DIRECTIONS: &[&str] = &[
    "B2B SaaS для малого бизнеса",
    "инструменты для разработчиков",
    "автоматизация рутины для фрилансеров",
    "сервисы для онлайн-образования",
    "продуктивность для удалённых команд",
    "инструменты для контент-мейкеров",
];

/// The JSON contract both generation prompts request.
const IDEAS_JSON_CONTRACT: &str = r#"Верни JSON массив из 10-15 идей:
[
  {
    "title": "Короткое название идеи",
    "pain_description": "Какую конкретную боль решает идея",
    "segment": "Кому именно болит (целевая аудитория)",
    "confidence_level": "high|medium|low",
    "brief_evidence": "Краткое обоснование, почему боль реальна",
    "detailed_evidence": "Развёрнутое обоснование: где и как проявляется боль",
    "plan_7days": ["шаг 1", "шаг 2", "шаг 3"],
    "plan_30days": ["шаг 1", "шаг 2", "шаг 3"],
    "analogues": [
      {"name": "Название аналога", "description": "Что делает", "url": "https://..."}
    ],
    "evidence": [
      {
        "pattern_description": "Повторяющийся паттерн жалоб",
        "source_type": "discussion|review|forum",
        "source_url": "https://...",
        "example_quote": "Цитата из обсуждения"
      }
    ]
  }
]

Только JSON, без комментариев."#;

/// Resolve the direction for a run: a non-blank user hint wins, otherwise a
/// default topic is picked deterministically from the run id.
pub fn resolve_direction(optional_direction: Option<&str>, run_id: Uuid) -> String {
    match optional_direction.map(str::trim) {
        Some(direction) if !direction.is_empty() => direction.to_string(),
        _ => {
            let index = (run_id.as_u128() % DEFAULT_DIRECTIONS.len() as u128) as usize;
            DEFAULT_DIRECTIONS[index].to_string()
        }
    }
}

/// Build the extraction prompt for one batch of search results.
pub fn build_extraction_prompt(direction: &str, batch: &[SourceDocument]) -> String {
    let context = build_context(batch);

    format!(
        "Ты анализируешь реальные обсуждения пользователей из интернета (Reddit, Indie Hackers, форумы).\n\
         \n\
         Направление бизнеса: {direction}\n\
         \n\
         Реальные обсуждения пользователей:\n\
         {context}\n\
         \n\
         Задача: Извлеки из этих обсуждений КОНКРЕТНЫЕ боли и проблемы пользователей.\n\
         \n\
         Требования:\n\
         1. Боль должна быть КОНКРЕТНОЙ (не \"плохой UX\", а \"приходится кликать 10 раз чтобы...\")\n\
         2. Боль должна относиться к направлению: {direction}\n\
         3. Для каждой боли укажи доказательства (цитаты из текста)\n\
         4. Уровень уверенности зависит от количества и качества доказательств\n\
         \n\
         Верни JSON массив:\n\
         [\n\
           {{\n\
             \"pain_description\": \"Конкретное описание боли (100-200 слов)\",\n\
             \"segment\": \"Кому именно болит (целевая аудитория)\",\n\
             \"evidence_quotes\": [\"цитата 1 из реального обсуждения\", \"цитата 2\"],\n\
             \"confidence_level\": \"high|medium|low\"\n\
           }}\n\
         ]\n\
         \n\
         ВАЖНО:\n\
         - Если в обсуждениях нет явных болей - верни пустой массив []\n\
         - Не придумывай боли - только то что явно написано в обсуждениях\n\
         - Одна боль = одна конкретная проблема\n\
         \n\
         Только JSON, без комментариев."
    )
}

/// Build the grounded generation prompt from real extracted pains.
pub fn build_grounded_prompt(direction: &str, pains: &[ExtractedPain]) -> String {
    let mut pains_block = String::new();
    for (idx, pain) in pains.iter().enumerate() {
        pains_block.push_str(&format!(
            "--- Боль {} [{}] ---\nОписание: {}\nСегмент: {}\n",
            idx + 1,
            pain.confidence_level,
            pain.pain_description,
            pain.segment,
        ));
        for quote in &pain.evidence_quotes {
            pains_block.push_str(&format!("Цитата: \"{}\"\n", quote));
        }
        pains_block.push('\n');
    }

    format!(
        "Направление бизнеса: {direction}\n\
         \n\
         Ниже — РЕАЛЬНЫЕ боли пользователей, извлечённые из публичных обсуждений,\n\
         с цитатами-доказательствами:\n\
         \n\
         {pains_block}\
         Задача: Сгенерируй бизнес-идеи, каждая из которых решает одну из этих болей.\n\
         Используй указанные сегменты и цитаты как brief_evidence.\n\
         Не выдумывай боли, которых нет в списке.\n\
         \n\
         {IDEAS_JSON_CONTRACT}"
    )
}

/// Build the ungrounded fallback prompt (no usable real pains).
pub fn build_fallback_prompt(direction: &str) -> String {
    format!(
        "Направление бизнеса: {direction}\n\
         \n\
         Задача: Сгенерируй бизнес-идеи для этого направления. Для каждой идеи\n\
         сформулируй конкретную пользовательскую боль, которую она решает,\n\
         целевой сегмент и правдоподобное краткое обоснование.\n\
         \n\
         {IDEAS_JSON_CONTRACT}"
    )
}

/// Format a batch of documents the way the extractor expects.
fn build_context(batch: &[SourceDocument]) -> String {
    let mut parts = Vec::with_capacity(batch.len());
    for (idx, doc) in batch.iter().enumerate() {
        parts.push(format!(
            "\n--- Обсуждение {} [{}] ---\nЗаголовок: {}\nURL: {}\nТекст: {}\n",
            idx + 1,
            doc.source,
            doc.title,
            doc.url,
            doc.content,
        ));
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConfidenceLevel;

    #[test]
    fn user_direction_wins() {
        let direction = resolve_direction(Some("B2B SaaS for startups"), Uuid::new_v4());
        assert_eq!(direction, "B2B SaaS for startups");
    }

    #[test]
    fn blank_direction_falls_back_to_default_topic() {
        let run_id = Uuid::new_v4();
        let direction = resolve_direction(Some("   "), run_id);
        assert!(DEFAULT_DIRECTIONS.contains(&direction.as_str()));
        // Deterministic per run id
        assert_eq!(direction, resolve_direction(None, run_id));
    }

    #[test]
    fn grounded_prompt_includes_pains_and_quotes() {
        let pains = vec![ExtractedPain {
            pain_description: "приходится кликать 10 раз чтобы выгрузить отчёт".to_string(),
            segment: "аналитики в малом бизнесе".to_string(),
            evidence_quotes: vec!["exporting reports is a nightmare".to_string()],
            confidence_level: ConfidenceLevel::High,
        }];
        let prompt = build_grounded_prompt("B2B SaaS", &pains);
        assert!(prompt.contains("кликать 10 раз"));
        assert!(prompt.contains("exporting reports is a nightmare"));
        assert!(prompt.contains("JSON"));
    }

    #[test]
    fn fallback_prompt_mentions_direction() {
        let prompt = build_fallback_prompt("инструменты для разработчиков");
        assert!(prompt.contains("инструменты для разработчиков"));
        assert!(prompt.contains("JSON"));
    }

    #[test]
    fn contract_requests_every_persisted_field() {
        // Every field the idea normalizer reads must be asked for, or the
        // corresponding columns stay empty in practice
        for field in [
            "title",
            "pain_description",
            "segment",
            "confidence_level",
            "brief_evidence",
            "detailed_evidence",
            "plan_7days",
            "plan_30days",
            "analogues",
            "evidence",
            "pattern_description",
        ] {
            assert!(
                IDEAS_JSON_CONTRACT.contains(field),
                "contract is missing {field}"
            );
        }
    }

    #[test]
    fn extraction_prompt_numbers_documents() {
        let docs = vec![
            SourceDocument {
                title: "t1".into(),
                url: "https://reddit.com/1".into(),
                content: "c1".into(),
                score: 0.9,
                source: "reddit.com".into(),
            },
            SourceDocument {
                title: "t2".into(),
                url: "https://reddit.com/2".into(),
                content: "c2".into(),
                score: 0.8,
                source: "reddit.com".into(),
            },
        ];
        let prompt = build_extraction_prompt("B2B SaaS", &docs);
        assert!(prompt.contains("Обсуждение 1"));
        assert!(prompt.contains("Обсуждение 2"));
        assert!(prompt.contains("https://reddit.com/2"));
    }
}
