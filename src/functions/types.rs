//! YAML definitions for installable functions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chat::{FunctionSchema, ParameterProperty, ParametersSchema};

/// File written by the default function installer.
pub const DEFAULT_FUNCTIONS_FILE: &str = "functions.yaml";

/// A file holding one or more function definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionsFile {
    #[serde(default)]
    pub functions: Vec<FunctionDefinition>,
}

impl FunctionsFile {
    /// The functions installed by `--install-functions`.
    pub fn defaults() -> Self {
        Self {
            functions: vec![FunctionDefinition {
                name: "execute_shell_command".to_string(),
                description: "Executes a shell command and returns the output (result)."
                    .to_string(),
                params: vec![FunctionParam {
                    name: "shell_command".to_string(),
                    param_type: default_param_type(),
                    description: "Shell command to execute.".to_string(),
                    required: true,
                }],
                command: "{{shell_command}}".to_string(),
            }],
        }
    }
}

/// A function backed by a shell command template with `{{param}}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub params: Vec<FunctionParam>,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParam {
    pub name: String,
    #[serde(default = "default_param_type")]
    pub param_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

fn default_param_type() -> String {
    "string".to_string()
}

impl FunctionDefinition {
    pub fn schema(&self) -> FunctionSchema {
        let properties = self
            .params
            .iter()
            .map(|param| {
                (
                    param.name.clone(),
                    ParameterProperty {
                        property_type: param.param_type.clone(),
                        description: param.description.clone(),
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();
        let required = self
            .params
            .iter()
            .filter(|param| param.required)
            .map(|param| param.name.clone())
            .collect();
        FunctionSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: ParametersSchema {
                schema_type: "object".to_string(),
                properties,
                required,
            },
        }
    }
}
