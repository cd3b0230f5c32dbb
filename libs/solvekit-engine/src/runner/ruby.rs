use super::python::InterpreterRunner;
use super::LanguageRunner;
use crate::error::Result;
use crate::settings::RunnerSettings;
use solvekit_common::types::Language;

const RUBY: &str = "ruby";

pub fn factory(_settings: &RunnerSettings) -> Result<Box<dyn LanguageRunner>> {
    Ok(Box::new(InterpreterRunner::new(Language::Ruby, RUBY)))
}
