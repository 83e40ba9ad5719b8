// allowlist.rs — The fixed command allowlist.
//
// Only these commands can ever execute, each with its own wall-clock
// timeout. `suiteql_assertions` carries no argv: it runs inside the
// process via the assertion engine and only borrows the run lifecycle.

use std::time::Duration;

use crate::run::RunType;

/// Command line and timeout for one run family.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Argv to execute, or `None` for internally driven run types.
    pub argv: Option<Vec<String>>,
    pub timeout: Duration,
}

impl CommandSpec {
    /// Display form of the command ("(internal)" when there is no argv).
    pub fn display(&self) -> String {
        match &self.argv {
            Some(argv) => argv.join(" "),
            None => "(internal)".to_string(),
        }
    }
}

/// The command spec for a run type.
pub fn command_spec(run_type: RunType) -> CommandSpec {
    match run_type {
        RunType::SdfValidate => CommandSpec {
            argv: Some(vec!["sdf".into(), "validate".into()]),
            timeout: Duration::from_secs(60),
        },
        RunType::JestUnitTest => CommandSpec {
            argv: Some(vec![
                "npx".into(),
                "jest".into(),
                "--json".into(),
                "--coverage".into(),
            ]),
            timeout: Duration::from_secs(120),
        },
        RunType::SuiteqlAssertions => CommandSpec {
            argv: None,
            timeout: Duration::from_secs(300),
        },
        RunType::DeploySandbox => CommandSpec {
            argv: Some(vec![
                "sdf".into(),
                "deploy".into(),
                "--sandbox".into(),
            ]),
            timeout: Duration::from_secs(600),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_match_the_command_families() {
        assert_eq!(command_spec(RunType::SdfValidate).timeout.as_secs(), 60);
        assert_eq!(command_spec(RunType::JestUnitTest).timeout.as_secs(), 120);
        assert_eq!(command_spec(RunType::SuiteqlAssertions).timeout.as_secs(), 300);
        assert_eq!(command_spec(RunType::DeploySandbox).timeout.as_secs(), 600);
    }

    #[test]
    fn assertions_have_no_subprocess() {
        assert!(command_spec(RunType::SuiteqlAssertions).argv.is_none());
        assert_eq!(command_spec(RunType::SuiteqlAssertions).display(), "(internal)");
    }

    #[test]
    fn jest_runs_with_json_and_coverage() {
        let spec = command_spec(RunType::JestUnitTest);
        let argv = spec.argv.unwrap();
        assert!(argv.contains(&"--json".to_string()));
        assert!(argv.contains(&"--coverage".to_string()));
    }
}
