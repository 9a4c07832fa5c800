//! Function execution tests using an in-process adapter double

mod common;

use common::ScriptedAdapter;
use promptflow_core::config::ConfigDocument;
use promptflow_core::executor::{ExecutionResult, FunctionExecutor};
use promptflow_core::protocol::{
    CompletionFailure, ErrorKind, FunctionDef, PromptTemplate, VariableContext,
};
use promptflow_core::providers::ProviderDispatcher;
use serde_json::json;
use std::sync::Arc;

fn executor(openai: &Arc<ScriptedAdapter>, anthropic: &Arc<ScriptedAdapter>) -> FunctionExecutor {
    common::init_tracing();
    let dispatcher = ProviderDispatcher::builder()
        .adapter(openai.clone())
        .adapter(anthropic.clone())
        .build();
    FunctionExecutor::new(Arc::new(dispatcher))
}

fn function(system: &str, user: &str, model: &str, required: &[&str]) -> FunctionDef {
    FunctionDef {
        id: "f1".to_string(),
        name: "lesson".to_string(),
        display_name: "Lesson".to_string(),
        description: None,
        order: 1,
        enabled: true,
        required_inputs: required.iter().map(|s| s.to_string()).collect(),
        output_field: "lesson".to_string(),
        prompt_template: PromptTemplate {
            id: "t1".to_string(),
            name: "Lesson Template".to_string(),
            system_prompt: system.to_string(),
            user_prompt: user.to_string(),
            model: model.to_string(),
            temperature: 0.5,
            variable_tokens: Vec::new(),
        },
    }
}

#[tokio::test]
async fn test_grade_topic_scenario() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");
    openai.push_text("Week 1: food webs");

    let f = function(
        "Grade {grade}",
        "Topic {topic}",
        "MODEL_GPT_4O",
        &["grade", "topic"],
    );
    let ctx = VariableContext::from_json(json!({ "grade": 5, "topic": "Ecosystems" }));

    let result = executor(&openai, &anthropic).run(&f, &ctx).await;

    assert_eq!(result.text(), Some("Week 1: food webs"));
    let calls = openai.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].system_prompt, "Grade 5");
    assert_eq!(calls[0].user_prompt, "Topic Ecosystems");
    assert_eq!(calls[0].model_id, "MODEL_GPT_4O");
    assert_eq!(calls[0].temperature, 0.5);
    assert!(anthropic.calls().is_empty());
}

#[tokio::test]
async fn test_nested_outcomes_scenario() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");

    let f = function(
        "You design lessons.",
        "Outcomes: {unit_plan.outcomes}; raw: {unit_plan}",
        "MODEL_CLAUDE_3_SONNET",
        &["unit_plan.outcomes"],
    );
    let ctx = VariableContext::from_json(json!({
        "unit_plan": { "outcomes": "Students model energy flow" }
    }));

    let result = executor(&openai, &anthropic).run(&f, &ctx).await;

    assert!(result.is_success());
    let calls = anthropic.calls();
    assert_eq!(
        calls[0].user_prompt,
        "Outcomes: Students model energy flow; raw: {unit_plan}"
    );
}

#[test]
fn test_disabled_function_makes_no_call() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");

    let mut f = function("s", "u", "MODEL_GPT_4O", &["grade"]);
    f.enabled = false;

    let executor = executor(&openai, &anthropic);
    let result = tokio_test::block_on(executor.run(&f, &VariableContext::new()));

    assert!(result.is_skipped());
    assert!(openai.calls().is_empty());
    assert!(anthropic.calls().is_empty());
}

#[tokio::test]
async fn test_missing_input_short_circuits() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");

    let f = function("s", "{grade} {topic}", "MODEL_GPT_4O", &["grade", "topic"]);
    let ctx = VariableContext::new().with("topic", "Ecosystems");

    let result = executor(&openai, &anthropic).run(&f, &ctx).await;

    let ExecutionResult::Rejected(completion) = &result else {
        panic!("expected rejection, got {result:?}");
    };
    let failure = completion.failure().unwrap();
    assert_eq!(failure.error_kind, ErrorKind::Validation);
    assert!(failure.message.contains("grade"));
    assert!(!failure.message.contains("topic"));
    assert!(openai.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_model_goes_to_fallback_provider() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");

    let f = function("s", "u", "unknown-model-x", &[]);
    let result = executor(&openai, &anthropic).run(&f, &VariableContext::new()).await;

    assert!(result.is_success());
    assert_eq!(openai.calls()[0].model_id, "unknown-model-x");
}

#[tokio::test]
async fn test_adapter_failure_is_returned_unchanged() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");
    let failure = CompletionFailure::provider(
        429,
        "rate limited",
        Some(json!({ "error": { "message": "rate limited" } })),
    );
    openai.push_failure(failure.clone());

    let f = function("s", "u", "MODEL_O3_MINI", &[]);
    let result = executor(&openai, &anthropic).run(&f, &VariableContext::new()).await;

    let ExecutionResult::Completed(completion) = result else {
        panic!("expected completion");
    };
    assert_eq!(completion.failure(), Some(&failure));
}

#[tokio::test]
async fn test_default_document_first_function() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");

    let doc = ConfigDocument::default_document();
    let ctx = VariableContext::new()
        .with("grade", "5")
        .with("topic", "Ecosystems")
        .with("outcomes", "LS2-3");

    let result = executor(&openai, &anthropic).run(&doc.functions[0], &ctx).await;

    assert!(result.is_success());
    let prompt = &openai.calls()[0].user_prompt;
    assert!(prompt.starts_with("Create a comprehensive unit plan for grade 5 on the topic of Ecosystems."));
    assert!(prompt.contains("learning outcomes: LS2-3"));
}
