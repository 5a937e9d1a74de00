use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde_json::Value;

use crate::chat::FunctionSchema;
use crate::error::SgptError;
use crate::platform::ShellKind;

use super::error::FunctionError;
use super::executor::{run, substitute};
use super::types::{FunctionDefinition, FunctionsFile, DEFAULT_FUNCTIONS_FILE};

#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: Vec<FunctionDefinition>,
    shell: ShellKind,
}

impl FunctionRegistry {
    pub fn new(functions: Vec<FunctionDefinition>) -> Self {
        Self {
            functions,
            shell: ShellKind::detect(),
        }
    }

    /// Loads every `.yaml`/`.yml` file in `dir`. A later definition replaces an
    /// earlier one with the same name.
    pub fn load_dir(dir: &Path) -> Result<Self, SgptError> {
        let mut registry = Self::new(Vec::new());
        if !dir.exists() {
            return Ok(registry);
        }
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("yaml" | "yml")
            ) {
                paths.push(path);
            }
        }
        paths.sort();
        for path in paths {
            let contents = fs::read_to_string(&path)?;
            let file: FunctionsFile = serde_yaml::from_str(&contents).map_err(|err| {
                SgptError::MalformedInput(format!("{}: {err}", path.display()))
            })?;
            for definition in file.functions {
                registry.insert(definition);
            }
        }
        debug!("loaded {} functions from {}", registry.len(), dir.display());
        Ok(registry)
    }

    /// Writes the default function file unless one is already installed.
    pub fn install_defaults(dir: &Path) -> Result<PathBuf, SgptError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(DEFAULT_FUNCTIONS_FILE);
        if !path.exists() {
            let contents = serde_yaml::to_string(&FunctionsFile::defaults())
                .map_err(|err| SgptError::MalformedInput(err.to_string()))?;
            fs::write(&path, contents)?;
        }
        Ok(path)
    }

    pub fn insert(&mut self, definition: FunctionDefinition) {
        self.functions.retain(|f| f.name != definition.name);
        self.functions.push(definition);
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn schemas(&self) -> Vec<FunctionSchema> {
        self.functions.iter().map(FunctionDefinition::schema).collect()
    }

    pub fn execute(&self, name: &str, args_json: &str) -> Result<String, FunctionError> {
        let function = self
            .functions
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| FunctionError::NotFound(name.to_string()))?;
        let args = parse_args(args_json)?;
        let command = substitute(&function.command, &args)?;
        debug!("function {name} runs: {command}");
        run(&self.shell, &command)
    }
}

fn parse_args(raw: &str) -> Result<Value, FunctionError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(raw).map_err(|err| FunctionError::InvalidArgs(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installed_defaults_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = FunctionRegistry::install_defaults(dir.path()).unwrap();
        assert!(path.ends_with(DEFAULT_FUNCTIONS_FILE));

        let registry = FunctionRegistry::load_dir(dir.path()).unwrap();
        let schemas = registry.schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].name, "execute_shell_command");
        assert_eq!(schemas[0].parameters.required, vec!["shell_command"]);
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.yaml"), "functions: [name: {").unwrap();
        let err = FunctionRegistry::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, SgptError::MalformedInput(_)));
    }

    #[test]
    fn unknown_function_is_not_found() {
        let registry = FunctionRegistry::new(Vec::new());
        assert_eq!(
            registry.execute("rm_rf", "{}").unwrap_err(),
            FunctionError::NotFound("rm_rf".to_string())
        );
    }

    #[test]
    fn bad_arguments_are_rejected() {
        let registry = FunctionRegistry::new(FunctionsFile::defaults().functions);
        let err = registry
            .execute("execute_shell_command", "{not json")
            .unwrap_err();
        assert!(matches!(err, FunctionError::InvalidArgs(_)));
    }

    #[cfg(unix)]
    #[test]
    fn default_function_runs_command() {
        let mut registry = FunctionRegistry::new(FunctionsFile::defaults().functions);
        registry.shell = ShellKind::Posix("/bin/sh".to_string());
        let output = registry
            .execute("execute_shell_command", r#"{"shell_command": "echo hi"}"#)
            .unwrap();
        assert!(output.contains("Stdout: hi"));
    }
}
