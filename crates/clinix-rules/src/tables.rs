//! Rule tables: a configuração estática do orquestrador.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Routing entry for a complex function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRoute {
    /// Registry name of the target sub-processor.
    pub processor: String,
    /// Whether the call must carry a subject (patient) id.
    #[serde(default)]
    pub requires_subject: bool,
    /// Whether the call must carry a secondary (appointment) id.
    #[serde(default)]
    pub requires_secondary: bool,
}

/// Per-function constraints applied to a delegate's output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub required_sections: Vec<String>,
    #[serde(default)]
    pub forbidden_keywords: Vec<String>,
}

/// Registry row for one sub-processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub display_name: String,
    pub enabled: bool,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

/// The four process-wide tables, read-only after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTables {
    /// Functions handled entirely by the simple path, no delegation.
    pub simple_functions: HashSet<String>,
    /// Function name → sub-processor routing.
    pub complex_functions: HashMap<String, FunctionRoute>,
    /// Function name → output validation rules.
    #[serde(default)]
    pub validation_rules: HashMap<String, ValidationRules>,
    /// Sub-processor registry.
    pub processors: HashMap<String, ProcessorConfig>,
}

impl RuleTables {
    /// Built-in clinic defaults, used when no YAML file is supplied.
    pub fn builtin() -> Self {
        let simple_functions: HashSet<String> = [
            "add_allergy",
            "remove_allergy",
            "update_contact_info",
            "get_patient",
            "list_appointments",
            "cancel_appointment",
            "record_payment",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let mut complex_functions = HashMap::new();
        complex_functions.insert(
            "generate_summary".to_string(),
            FunctionRoute {
                processor: "summary_agent".to_string(),
                requires_subject: true,
                requires_secondary: false,
            },
        );
        complex_functions.insert(
            "generate_report".to_string(),
            FunctionRoute {
                processor: "report_agent".to_string(),
                requires_subject: true,
                requires_secondary: false,
            },
        );
        complex_functions.insert(
            "chat_followup".to_string(),
            FunctionRoute {
                processor: "conversation_agent".to_string(),
                requires_subject: true,
                requires_secondary: true,
            },
        );

        let mut validation_rules = HashMap::new();
        validation_rules.insert(
            "generate_summary".to_string(),
            ValidationRules {
                min_length: Some(50),
                max_length: Some(4000),
                required_sections: vec!["resumo".to_string()],
                forbidden_keywords: vec!["lorem ipsum".to_string()],
            },
        );
        validation_rules.insert(
            "generate_report".to_string(),
            ValidationRules {
                min_length: Some(80),
                max_length: Some(8000),
                required_sections: vec!["relatório".to_string(), "período".to_string()],
                forbidden_keywords: Vec::new(),
            },
        );
        validation_rules.insert(
            "chat_followup".to_string(),
            ValidationRules {
                min_length: Some(10),
                max_length: Some(1500),
                required_sections: Vec::new(),
                forbidden_keywords: vec!["diagnóstico definitivo".to_string()],
            },
        );

        let mut processors = HashMap::new();
        processors.insert(
            "summary_agent".to_string(),
            ProcessorConfig {
                display_name: "Gerador de Resumos Clínicos".to_string(),
                enabled: true,
                timeout_seconds: 30,
                max_retries: 2,
            },
        );
        processors.insert(
            "report_agent".to_string(),
            ProcessorConfig {
                display_name: "Gerador de Relatórios".to_string(),
                enabled: true,
                timeout_seconds: 60,
                max_retries: 1,
            },
        );
        processors.insert(
            "conversation_agent".to_string(),
            ProcessorConfig {
                display_name: "Assistente de Acompanhamento".to_string(),
                enabled: true,
                timeout_seconds: 20,
                max_retries: 2,
            },
        );

        Self {
            simple_functions,
            complex_functions,
            validation_rules,
            processors,
        }
    }

    pub fn is_simple(&self, function_name: &str) -> bool {
        self.simple_functions.contains(function_name)
    }

    pub fn route_for(&self, function_name: &str) -> Option<&FunctionRoute> {
        self.complex_functions.get(function_name)
    }

    pub fn rules_for(&self, function_name: &str) -> Option<&ValidationRules> {
        self.validation_rules.get(function_name)
    }

    pub fn processor(&self, name: &str) -> Option<&ProcessorConfig> {
        self.processors.get(name)
    }
}

impl Default for RuleTables {
    fn default() -> Self {
        Self::builtin()
    }
}
