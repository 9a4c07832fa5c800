//! Pipeline runner tests

mod common;

use common::ScriptedAdapter;
use promptflow_core::config::ConfigDocument;
use promptflow_core::executor::{ExecutionResult, FunctionExecutor};
use promptflow_core::http::CallOptions;
use promptflow_core::pipeline::{OutputBinding, PipelineRunner};
use promptflow_core::protocol::{CompletionFailure, ErrorKind, VariableContext, VariableValue};
use promptflow_core::providers::ProviderDispatcher;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn runner(openai: &Arc<ScriptedAdapter>, anthropic: &Arc<ScriptedAdapter>) -> PipelineRunner {
    common::init_tracing();
    let dispatcher = ProviderDispatcher::builder()
        .adapter(openai.clone())
        .adapter(anthropic.clone())
        .build();
    PipelineRunner::new(FunctionExecutor::new(Arc::new(dispatcher)))
}

fn inputs() -> VariableContext {
    VariableContext::new()
        .with("grade", "5")
        .with("topic", "Ecosystems")
        .with("outcomes", "LS2-3")
        .with("temperature", 0.5)
}

#[tokio::test]
async fn test_record_binding_feeds_later_functions() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");
    openai.push_text("THE PLAN");
    openai.push_text("THE QUESTION");
    anthropic.push_text("THE KNOWLEDGE");

    let report = runner(&openai, &anthropic)
        .with_binding(OutputBinding::Record)
        .run_document(&ConfigDocument::default_document(), inputs())
        .await;

    assert!(report.is_complete());
    assert_eq!(report.steps.len(), 3);

    let openai_calls = openai.calls();
    assert_eq!(openai_calls.len(), 2);
    assert!(openai_calls[1]
        .user_prompt
        .contains("Evaluate the following lesson: THE PLAN."));
    assert!(anthropic.calls()[0]
        .user_prompt
        .contains("lesson plan: THE PLAN and identify"));

    assert_eq!(
        report.context.lookup("unit_plan.text"),
        Some(&VariableValue::from("THE PLAN"))
    );
    assert_eq!(
        report.context.lookup("essential_knowledge.essential_knowledge"),
        Some(&VariableValue::from("THE KNOWLEDGE"))
    );
    assert_eq!(
        report.context.lookup("guiding_question.model"),
        Some(&VariableValue::from("scripted-model"))
    );
}

#[tokio::test]
async fn test_text_binding_writes_plain_text() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");
    openai.push_text("THE PLAN");

    let mut doc = ConfigDocument::empty();
    let mut first = ConfigDocument::default_document().functions[0].clone();
    first.order = 1;
    let mut second = first.clone();
    second.id = "2".to_string();
    second.name = "summary".to_string();
    second.order = 2;
    second.required_inputs = vec!["unit_plan".to_string()];
    second.output_field = "summary".to_string();
    second.prompt_template.user_prompt = "Summarize: {unit_plan}".to_string();
    doc.add_function(second).unwrap();
    doc.add_function(first).unwrap();

    let report = runner(&openai, &anthropic).run_document(&doc, inputs()).await;

    assert!(report.is_complete());
    let names: Vec<&str> = report.steps.iter().map(|s| s.function_name.as_str()).collect();
    assert_eq!(names, vec!["unit_plan", "summary"]);
    assert_eq!(openai.calls()[1].user_prompt, "Summarize: THE PLAN");
    assert_eq!(
        report.context.get("summary"),
        Some(&VariableValue::from("reply:Summarize: THE PLAN"))
    );
}

#[tokio::test]
async fn test_skipped_function_does_not_halt() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");

    let mut doc = ConfigDocument::default_document();
    doc.functions[1].enabled = false;

    let report = runner(&openai, &anthropic)
        .with_binding(OutputBinding::Record)
        .run_document(&doc, inputs())
        .await;

    assert!(report.is_complete());
    assert!(report.step("guiding_question").unwrap().result.is_skipped());
    assert_eq!(openai.calls().len(), 1);
    assert_eq!(anthropic.calls().len(), 1);
    assert!(report.context.get("guiding_question").is_none());
}

#[tokio::test]
async fn test_failure_halts_the_run() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");
    openai.push_failure(CompletionFailure::provider(500, "upstream exploded", None));

    let report = runner(&openai, &anthropic)
        .run_document(&ConfigDocument::default_document(), inputs())
        .await;

    assert_eq!(report.halted_at.as_deref(), Some("unit_plan"));
    assert_eq!(report.steps.len(), 1);
    assert!(anthropic.calls().is_empty());
    assert!(report.context.get("unit_plan").is_none());
}

#[tokio::test]
async fn test_rejection_halts_the_run() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");

    let ctx = VariableContext::new().with("grade", "5");
    let report = runner(&openai, &anthropic)
        .run_document(&ConfigDocument::default_document(), ctx)
        .await;

    assert_eq!(report.halted_at.as_deref(), Some("unit_plan"));
    let ExecutionResult::Rejected(completion) = &report.steps[0].result else {
        panic!("expected rejection");
    };
    assert_eq!(completion.error_kind(), Some(ErrorKind::Validation));
    assert!(openai.calls().is_empty());
}

#[tokio::test]
async fn test_equal_order_keeps_document_order() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");

    let mut doc = ConfigDocument::default_document();
    for f in &mut doc.functions {
        f.order = 7;
        f.required_inputs.clear();
    }

    let report = runner(&openai, &anthropic).run_document(&doc, VariableContext::new()).await;

    let names: Vec<&str> = report.steps.iter().map(|s| s.function_name.as_str()).collect();
    assert_eq!(names, vec!["unit_plan", "guiding_question", "essential_knowledge"]);
}

#[tokio::test]
async fn test_record_binding_named_model_keeps_generated_text() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");
    openai.push_text("THE PLAN");

    let mut doc = ConfigDocument::empty();
    let mut first = ConfigDocument::default_document().functions[0].clone();
    first.output_field = "model".to_string();
    doc.add_function(first).unwrap();

    let report = runner(&openai, &anthropic)
        .with_binding(OutputBinding::Record)
        .run_document(&doc, inputs())
        .await;

    assert!(report.is_complete());
    assert_eq!(
        report.context.lookup("unit_plan.model"),
        Some(&VariableValue::from("THE PLAN"))
    );
    assert_eq!(
        report.context.lookup("unit_plan.text"),
        Some(&VariableValue::from("THE PLAN"))
    );
}

#[tokio::test]
async fn test_run_with_shares_timeout_and_renews_request_ids() {
    let openai = ScriptedAdapter::new("openai");
    let anthropic = ScriptedAdapter::new("anthropic");
    let doc = ConfigDocument::default_document();
    let options = CallOptions::new().with_timeout(Duration::from_secs(3));

    let report = runner(&openai, &anthropic)
        .run_with(doc.ordered_functions(), inputs(), &options)
        .await;

    assert!(report.is_complete());
    let calls: Vec<_> = openai.calls().into_iter().chain(anthropic.calls()).collect();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| c.timeout == Duration::from_secs(3)));

    let ids: HashSet<&str> = calls.iter().map(|c| c.request_id.as_str()).collect();
    assert_eq!(ids.len(), 3);
    assert!(!ids.contains(options.request_id.to_string().as_str()));
}
