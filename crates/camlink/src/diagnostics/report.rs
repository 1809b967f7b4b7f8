//! Aggregated diagnostic reporting

/// Outcome of a single named probe
#[derive(Debug, Clone)]
pub struct DiagnosticResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl DiagnosticResult {
    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: detail.into(),
        }
    }

    /// Log at the point of occurrence; failures are warnings, never fatal
    pub fn log(&self) {
        if self.passed {
            log::info!("✓ {}: {}", self.name, self.detail);
        } else {
            log::warn!("✗ {}: {}", self.name, self.detail);
        }
    }
}

/// Collected probe outcomes for one run; never persisted
#[derive(Debug, Default)]
pub struct DiagnosticReport {
    results: Vec<DiagnosticResult>,
}

impl DiagnosticReport {
    /// Log and collect a probe outcome
    pub fn record(&mut self, result: DiagnosticResult) {
        result.log();
        self.results.push(result);
    }

    pub fn results(&self) -> &[DiagnosticResult] {
        &self.results
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// At least 80% of probes passed
    pub fn is_acceptable(&self) -> bool {
        self.passed() * 5 >= self.total() * 4
    }

    pub fn log_summary(&self) {
        log::info!("diagnostics: {}/{} probes passed", self.passed(), self.total());
        for result in &self.results {
            let glyph = if result.passed { "✓" } else { "✗" };
            log::info!("  {} {}", glyph, result.name);
        }
        if self.passed() == self.total() {
            log::info!("all diagnostics passed");
        } else if self.is_acceptable() {
            log::warn!("some issues detected, but streaming may still work");
        } else {
            log::error!("multiple issues detected, resolve them before streaming");
        }
    }
}
