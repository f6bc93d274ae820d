//! Shared test utilities for graph-level tests

use crate::{
    codec::{BuildOutput, GraphCompiler},
    config::BuildConfig,
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn build(pairs: &[(&str, &str)]) -> BuildOutput {
    build_with(BuildConfig::default(), pairs)
}

pub fn build_with(config: BuildConfig, pairs: &[(&str, &str)]) -> BuildOutput {
    init_logging();
    GraphCompiler::new(config, None).build_from_pairs(pairs)
}

/// A corpus exercising every reference form: paths with and without extension, titles,
/// aliases, fragments, display text, self links, a draft, a cycle and an unresolved target.
pub fn mixed_corpus() -> Vec<(String, String)> {
    let mut pairs = vec![
        (
            "index.md".to_string(),
            concat!(
                "---\ntitle: Home\ntags: [meta]\n---\n# Welcome\n",
                "Start with [[guides/setup]] or [[Setup Guide|setup]].\n",
                "Drafts: [[wip]]. Broken: [[nowhere]].\n",
            )
            .to_string(),
        ),
        (
            "guides/setup.md".to_string(),
            concat!(
                "---\naliases: [Setup Guide, install]\ntags: [guide]\n---\n",
                "Back to [[Home#Welcome]]. #guide #howto\n",
            )
            .to_string(),
        ),
        (
            "wip.md".to_string(),
            concat!(
                "---\ndraft: true\ntags: [secret]\n---\n",
                "Links to [[index.md]] and itself [[wip]].\n",
            )
            .to_string(),
        ),
    ];
    for i in 0..12 {
        let next = (i + 1) % 12;
        pairs.push((
            format!("chain/{i:02}.md"),
            format!(
                "---\ntitle: Chain {i}\n---\n\
                 Next: [[Chain {next}]], home [[home]]. `[[not a link]]` #chain\n"
            ),
        ));
    }
    pairs
}
