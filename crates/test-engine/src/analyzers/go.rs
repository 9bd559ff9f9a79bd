use crate::error::Result;
use crate::ports::TestAnalyzer;
use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const TEST_SUFFIX: &str = "_test.go";

/// Maps Go sources to tests by naming and package conventions.
///
/// For `pkg/cart.go` the covering tests are `pkg/cart_test.go` (when it
/// exists) plus every `*_test.go` in `pkg/` declaring the same package as
/// `cart.go`, or its external `_test` package. Returned paths keep the form of
/// the input path; relative paths resolve against the project root.
#[derive(Debug, Clone)]
pub struct GoTestAnalyzer {
    root: PathBuf,
    smoke_markers: Vec<String>,
    package_re: Regex,
    import_block_re: Regex,
    import_single_re: Regex,
    quoted_re: Regex,
}

impl GoTestAnalyzer {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            smoke_markers: vec!["smoke".to_string()],
            package_re: Regex::new(r"(?m)^\s*package\s+(\w+)")?,
            import_block_re: Regex::new(r"import\s*\(([\s\S]*?)\)")?,
            import_single_re: Regex::new(r#"import\s+(?:[\w.]+\s+)?"([^"]+)""#)?,
            quoted_re: Regex::new(r#""([^"]+)""#)?,
        })
    }

    /// Replace the case-insensitive smoke markers (default: `smoke`)
    pub fn with_smoke_markers(mut self, markers: Vec<String>) -> Self {
        self.smoke_markers = markers.into_iter().map(|m| m.to_lowercase()).collect();
        self
    }

    fn resolve(&self, base: &Path, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        }
    }

    async fn package_of(&self, file: &Path) -> Option<String> {
        let content = tokio::fs::read_to_string(file).await.ok()?;
        self.package_re
            .captures(&content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// `*_test.go` files in `dir` belonging to `package` or `package_test`
    async fn package_tests(
        &self,
        project_path: &Path,
        dir: &Path,
        package: &str,
    ) -> anyhow::Result<BTreeSet<String>> {
        let full_dir = self.resolve(project_path, &dir.to_string_lossy());
        let external = format!("{package}_test");
        let mut found = BTreeSet::new();

        let mut entries = tokio::fs::read_dir(&full_dir)
            .await
            .with_context(|| format!("failed to list {}", full_dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(TEST_SUFFIX) {
                continue;
            }

            match self.package_of(&entry.path()).await {
                Some(pkg) if pkg == package || pkg == external => {
                    found.insert(dir.join(&name).to_string_lossy().into_owned());
                }
                _ => {}
            }
        }

        Ok(found)
    }

    fn parse_imports(&self, content: &str) -> Vec<String> {
        let mut imports = Vec::new();

        for block in self.import_block_re.captures_iter(content) {
            let Some(body) = block.get(1) else { continue };
            for line in body.as_str().lines() {
                let line = line.split("//").next().unwrap_or_default().trim();
                if let Some(caps) = self.quoted_re.captures(line) {
                    imports.push(caps[1].to_string());
                }
            }
        }

        for caps in self.import_single_re.captures_iter(content) {
            imports.push(caps[1].to_string());
        }

        imports
    }
}

#[async_trait]
impl TestAnalyzer for GoTestAnalyzer {
    async fn find_tests_for_file(
        &self,
        file_path: &str,
        project_path: &Path,
    ) -> anyhow::Result<Vec<String>> {
        let path = Path::new(file_path);
        if path.extension().and_then(|e| e.to_str()) != Some("go") {
            return Ok(Vec::new());
        }

        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut tests = Vec::new();
        let sibling = dir.join(format!("{stem}{TEST_SUFFIX}"));
        let sibling_str = sibling.to_string_lossy().into_owned();
        if tokio::fs::try_exists(self.resolve(project_path, &sibling_str))
            .await
            .unwrap_or(false)
        {
            tests.push(sibling_str);
        }

        let source = self.resolve(project_path, file_path);
        if let Some(package) = self.package_of(&source).await {
            match self.package_tests(project_path, dir, &package).await {
                Ok(found) => {
                    for test in found {
                        if !tests.contains(&test) {
                            tests.push(test);
                        }
                    }
                }
                Err(e) => log::warn!("Failed to scan package tests for {file_path}: {e:#}"),
            }
        }

        log::debug!("Found {} test files for {file_path}", tests.len());
        Ok(tests)
    }

    async fn is_smoke_test(&self, test_path: &str) -> anyhow::Result<bool> {
        let full = self.resolve(&self.root, test_path);
        let content = tokio::fs::read_to_string(&full)
            .await
            .with_context(|| format!("failed to read test file {}", full.display()))?;

        let content = content.to_lowercase();
        let file_name = Path::new(test_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Ok(self.smoke_markers.iter().any(|marker| {
            content.contains(marker.as_str()) || file_name.contains(marker.as_str())
        }))
    }

    async fn analyze_test_dependencies(&self, test_path: &str) -> anyhow::Result<Vec<String>> {
        let full = self.resolve(&self.root, test_path);
        let content = tokio::fs::read_to_string(&full)
            .await
            .with_context(|| format!("failed to read test file {}", full.display()))?;

        let imports = self.parse_imports(&content);
        log::debug!("Found {} imports in {test_path}", imports.len());
        Ok(imports)
    }
}
