//! Configuration document structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use crate::protocol::types::{FunctionDef, ModelId, PromptTemplate};
use serde::{Deserialize, Serialize};

/// Current document version
pub const DOCUMENT_VERSION: &str = "1.0";

/// A set of functions plus the models offered for them
///
/// Serialized in camelCase (`functions`, `defaultModels`, `version`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    pub functions: Vec<FunctionDef>,

    /// Logical model ids offered when editing functions
    #[serde(default)]
    pub default_models: Vec<ModelId>,

    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    DOCUMENT_VERSION.to_string()
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::default_document()
    }
}

impl ConfigDocument {
    /// An empty document at the current version
    pub fn empty() -> Self {
        Self {
            functions: Vec::new(),
            default_models: Vec::new(),
            version: default_version(),
        }
    }

    /// The built-in three-step inquiry-based lesson design document
    pub fn default_document() -> Self {
        Self {
            functions: vec![
                FunctionDef {
                    id: "1".to_string(),
                    name: "unit_plan".to_string(),
                    display_name: "Unit Plan".to_string(),
                    description: Some(
                        "Creates a comprehensive unit plan for inquiry-based learning".to_string(),
                    ),
                    order: 1,
                    enabled: true,
                    required_inputs: strings(&["grade", "topic", "outcomes"]),
                    output_field: "unit_plan".to_string(),
                    prompt_template: PromptTemplate {
                        id: "template1".to_string(),
                        name: "Unit Plan Template".to_string(),
                        system_prompt:
                            "You are an expert in curriculum design and inquiry-based learning."
                                .to_string(),
                        user_prompt: UNIT_PLAN_PROMPT.to_string(),
                        model: "MODEL_GPT_4O".to_string(),
                        temperature: 0.7,
                        variable_tokens: strings(&["{grade}", "{topic}", "{outcomes}"]),
                    },
                },
                FunctionDef {
                    id: "2".to_string(),
                    name: "guiding_question".to_string(),
                    display_name: "Guiding Question".to_string(),
                    description: Some(
                        "Generates guiding questions for inquiry-based learning".to_string(),
                    ),
                    order: 2,
                    enabled: true,
                    required_inputs: strings(&["unit_plan", "temperature"]),
                    output_field: "guiding_question".to_string(),
                    prompt_template: PromptTemplate {
                        id: "template2".to_string(),
                        name: "Guiding Question Template".to_string(),
                        system_prompt: "You are an expert in inquiry-based learning.".to_string(),
                        user_prompt: GUIDING_QUESTION_PROMPT.to_string(),
                        model: "MODEL_GPT_4O".to_string(),
                        temperature: 0.7,
                        variable_tokens: strings(&["{unit_plan.unit_plan}", "{unit_plan.temperature}"]),
                    },
                },
                FunctionDef {
                    id: "3".to_string(),
                    name: "essential_knowledge".to_string(),
                    display_name: "Essential Knowledge".to_string(),
                    description: Some("Identifies essential knowledge for the lesson".to_string()),
                    order: 3,
                    enabled: true,
                    required_inputs: strings(&["unit_plan", "temperature"]),
                    output_field: "essential_knowledge".to_string(),
                    prompt_template: PromptTemplate {
                        id: "template3".to_string(),
                        name: "Essential Knowledge Template".to_string(),
                        system_prompt:
                            "You are an expert in inquiry-based lesson plan design in any scenario."
                                .to_string(),
                        user_prompt: ESSENTIAL_KNOWLEDGE_PROMPT.to_string(),
                        model: "MODEL_CLAUDE_3_HAIKU".to_string(),
                        temperature: 0.7,
                        variable_tokens: strings(&["{unit_plan.unit_plan}", "{unit_plan.temperature}"]),
                    },
                },
            ],
            default_models: strings(&[
                "MODEL_GPT_4O",
                "MODEL_GPT_4O_2024_08_06",
                "MODEL_O3_MINI",
                "MODEL_CLAUDE_3_OPUS",
                "MODEL_CLAUDE_3_SONNET",
                "MODEL_CLAUDE_3_HAIKU",
            ]),
            version: default_version(),
        }
    }

    /// Functions sorted by `order`; ties keep document order
    pub fn ordered_functions(&self) -> Vec<&FunctionDef> {
        let mut functions: Vec<&FunctionDef> = self.functions.iter().collect();
        functions.sort_by_key(|f| f.order);
        functions
    }

    pub fn function(&self, id: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.id == id)
    }

    pub fn function_by_name(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Append a function; its id and name must not already be in use
    pub fn add_function(&mut self, function: FunctionDef) -> Result<(), ValidationError> {
        let index = self.functions.len();
        if self.function(&function.id).is_some() {
            return Err(ValidationError::duplicate(
                format!("functions[{}].id", index),
                function.id,
            ));
        }
        if self.function_by_name(&function.name).is_some() {
            return Err(ValidationError::duplicate(
                format!("functions[{}].name", index),
                function.name,
            ));
        }

        self.functions.push(function);
        Ok(())
    }

    /// Replace the function with the same id, keeping its position
    pub fn update_function(&mut self, function: FunctionDef) -> Result<(), ValidationError> {
        let Some(index) = self.functions.iter().position(|f| f.id == function.id) else {
            return Err(ValidationError::new(
                "functions",
                ValidationErrorKind::NotFound { value: function.id },
            ));
        };

        let name_taken = self
            .functions
            .iter()
            .enumerate()
            .any(|(i, f)| i != index && f.name == function.name);
        if name_taken {
            return Err(ValidationError::duplicate(
                format!("functions[{}].name", index),
                function.name,
            ));
        }

        self.functions[index] = function;
        Ok(())
    }

    /// Remove a function by id, returning it
    pub fn remove_function(&mut self, id: &str) -> Option<FunctionDef> {
        let index = self.functions.iter().position(|f| f.id == id)?;
        Some(self.functions.remove(index))
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

const UNIT_PLAN_PROMPT: &str = "Create a comprehensive unit plan for grade {grade} on the topic of {topic}.

The unit plan should include:
1. Unit overview and objectives
2. Essential questions
3. Key concepts and skills
4. Learning activities and assessments
5. Resources needed

Consider the following learning outcomes: {outcomes}
Ensure the unit plan follows inquiry-based learning principles and encourages student exploration and discovery.";

const GUIDING_QUESTION_PROMPT: &str = "Instructions:

Evaluate the following lesson: {unit_plan.unit_plan}.
Identify the guiding question that will drive the inquiry-based learning in this lesson: Facts, Concepts, and Debatable Questions.
For example, a factual question could be: \"Why doesn't energy cycle within an ecosystem?\" A conceptual question could be: \"In what ways could humans impact the
balance of this freshwater ecosystem and its biodiversity?\" A debatable question could be: \"Using all of the evidence and conclusions you made above, how would you rate the health of the freshwater ecosystem at FEC?\"";

const ESSENTIAL_KNOWLEDGE_PROMPT: &str = "Review the following inquiry-based lesson plan: {unit_plan.unit_plan} and identify the essential knowledge that students will acquire through the lesson.
Specifically, outline the required background knowledge, essential skills needed, and key concepts that student need to know to successfully engage in the inquiry-based learning processes.";
