use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mockall::mock;

use ddms_meta::error::ConfigResult;
use ddms_meta::vocabulary::{EmbeddedSource, VocabularySource};

mock! {
    pub Source {}

    impl VocabularySource for Source {
        fn read(&self, location: &str, key: &str) -> ConfigResult<String>;
    }
}

/// Delegates to the embedded tables, counting reads and optionally stalling
/// each one so concurrent first loads overlap
#[derive(Debug, Default)]
pub struct CountingSource {
    inner: EmbeddedSource,
    reads: AtomicUsize,
    delay: Duration,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl VocabularySource for CountingSource {
    fn read(&self, location: &str, key: &str) -> ConfigResult<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.inner.read(location, key)
    }
}

/// A vocabulary document holding literal `tokens` and regex `patterns`
pub fn vocabulary_document(name: &str, tokens: &[&str], patterns: &[&str]) -> String {
    let mut document = format!(
        "<CVE xmlns=\"urn:us:gov:ic:cve\">\n  <Enumeration name=\"{}\">\n",
        name
    );
    for token in tokens {
        document.push_str(&format!("    <Term><Value>{}</Value></Term>\n", token));
    }
    for pattern in patterns {
        document.push_str(&format!(
            "    <Term><Value regularExpression=\"true\">{}</Value></Term>\n",
            pattern
        ));
    }
    document.push_str("  </Enumeration>\n</CVE>\n");
    document
}
