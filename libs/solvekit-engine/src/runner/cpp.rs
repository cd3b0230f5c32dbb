use super::c::CFamilyRunner;
use super::LanguageRunner;
use crate::error::Result;
use crate::settings::RunnerSettings;
use solvekit_common::types::Language;

pub fn factory(settings: &RunnerSettings) -> Result<Box<dyn LanguageRunner>> {
    Ok(Box::new(CFamilyRunner::new(Language::Cpp, settings)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpp_reads_its_own_entry() {
        let settings = RunnerSettings::from_json_str(
            r#"{"c": {"compiler": "gcc", "std": "c11"}, "cpp": {"compiler": "g++", "std": "gnu++17"}}"#,
        )
        .unwrap();
        let runner = factory(&settings).unwrap();
        assert_eq!(runner.language(), Language::Cpp);
        assert!(runner
            .runtime_info()
            .contains(&("Std".to_string(), "gnu++17".to_string())));
    }
}
