use crate::error::{Result, TestEngineError};
use crate::types::{TestConfig, TestInfo, TestKind, TestScope};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Keep the tests a scope selects.
///
/// `Affected` and `AffectedSmoke` pass everything through: affected
/// narrowing happens in the targeted run, not here.
pub fn filter_tests_by_scope(tests: &[TestInfo], scope: TestScope) -> Vec<TestInfo> {
    let wanted = match scope {
        TestScope::All | TestScope::Affected | TestScope::AffectedSmoke => None,
        TestScope::Unit => Some(TestKind::Unit),
        TestScope::Integration => Some(TestKind::Integration),
        TestScope::Smoke => Some(TestKind::Smoke),
    };

    tests
        .iter()
        .filter(|t| wanted.map_or(true, |kind| t.kind == kind))
        .cloned()
        .collect()
}

/// Include/exclude globs from a [`TestConfig`]
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl PathFilter {
    pub fn from_config(config: &TestConfig) -> Result<Self> {
        Ok(Self {
            include: build_set(&config.test_patterns)?,
            exclude: build_set(&config.exclude_patterns)?,
        })
    }

    pub fn is_noop(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }

    pub fn allows(&self, test_path: &str) -> bool {
        let included = self
            .include
            .as_ref()
            .map_or(true, |set| set.is_match(test_path));
        let excluded = self
            .exclude
            .as_ref()
            .is_some_and(|set| set.is_match(test_path));
        included && !excluded
    }
}

fn build_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            TestEngineError::InvalidConfig(format!("invalid test pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }

    builder
        .build()
        .map(Some)
        .map_err(|e| TestEngineError::InvalidConfig(format!("invalid test patterns: {e}")))
}
