use super::{GenerationContext, GeneratorKind, SqlGenerator};
use crate::error::Result;
use crate::pattern_matcher::PatternMatcher;
use async_trait::async_trait;
use tracing::debug;

/// Generator backed by the deterministic pattern cascade. Never fails.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedGenerator {
    matcher: PatternMatcher,
}

impl RuleBasedGenerator {
    pub fn new(matcher: PatternMatcher) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }
}

#[async_trait]
impl SqlGenerator for RuleBasedGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::RuleBased
    }

    async fn generate(&self, ctx: &GenerationContext) -> Result<String> {
        let (intent, sql) = self.matcher.synthesize_with_intent(&ctx.query, &ctx.tables);
        debug!("Pattern rule {:?} produced: {}", intent, sql);
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_uses_known_tables() {
        let generator = RuleBasedGenerator::default();
        let ctx = GenerationContext {
            query: "How many products are there".to_string(),
            tables: vec!["products".to_string(), "users".to_string()],
            ..GenerationContext::default()
        };
        assert_eq!(generator.generate(&ctx).await.unwrap(), "SELECT COUNT(*) FROM products");
        assert_eq!(generator.kind(), GeneratorKind::RuleBased);
    }
}
