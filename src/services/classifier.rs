// src/services/classifier.rs

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

/// O "cérebro" de um agente: recebe o tipo do agente e a entrada da tarefa.
/// A saída é JSON livre; se tiver um campo `insight`, vira um Insight.
#[async_trait]
pub trait AgentClassifier: Send + Sync {
    async fn classify(&self, agent_type: &str, input: &Value) -> anyhow::Result<Value>;
}

/// Classificador simulado: espera `latency` e devolve uma resposta fixa por tipo.
#[derive(Debug, Clone)]
pub struct MockClassifier {
    latency: Duration,
}

impl MockClassifier {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

#[async_trait]
impl AgentClassifier for MockClassifier {
    async fn classify(&self, agent_type: &str, _input: &Value) -> anyhow::Result<Value> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(canned_output(agent_type))
    }
}

pub fn canned_output(agent_type: &str) -> Value {
    match agent_type {
        "data_analysis" => json!({
            "analysis": "Community analysis completed",
            "segments": [
                { "name": "Young Professionals", "percentage": 35, "characteristics": ["High income", "Urban"] },
                { "name": "Seniors", "percentage": 28, "characteristics": ["Fixed income", "Healthcare concerns"] },
                { "name": "Families", "percentage": 37, "characteristics": ["Education focused", "Suburban"] }
            ],
            "insight": {
                "title": "Community Segmentation Analysis",
                "description": "Identified 3 key voter segments with distinct characteristics and priorities",
                "priority": "high"
            }
        }),
        "poll_analysis" => json!({
            "analysis": "Poll interpretation completed",
            "trends": [
                { "metric": "Intention", "value": 42, "change": "+3%" },
                { "metric": "Rejection", "value": 25, "change": "-2%" },
                { "metric": "Undecided", "value": 33, "change": "-1%" }
            ],
            "insight": {
                "title": "Poll Trend Analysis",
                "description": "Positive momentum detected with 3% increase in voting intention",
                "priority": "high"
            }
        }),
        "strategy" => json!({
            "recommendations": [
                "Focus on healthcare messaging for senior segments",
                "Increase digital outreach for young professionals",
                "Prioritize education policy for family segments"
            ],
            "insight": {
                "title": "Strategic Recommendations",
                "description": "Generated targeted messaging strategy based on voter segments",
                "priority": "medium"
            }
        }),
        "content" => json!({
            "content": {
                "messages": [
                    "Healthcare for all - your well-being is our priority",
                    "Investing in education today for a better tomorrow",
                    "Creating opportunities for young professionals"
                ],
                "channels": ["social_media", "radio", "digital_ads"]
            },
            "insight": {
                "title": "Content Strategy Generated",
                "description": "Created targeted messaging for key voter segments",
                "priority": "medium"
            }
        }),
        _ => json!({
            "analysis": "Generic processing completed",
            "insight": {
                "title": "Analysis Complete",
                "description": "Data processing finished successfully",
                "priority": "low"
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_produces_an_insight() {
        for agent_type in ["data_analysis", "poll_analysis", "strategy", "content", "qualquer"] {
            let out = canned_output(agent_type);
            assert!(out["insight"]["title"].is_string(), "{}", agent_type);
        }
        assert_eq!(canned_output("desconhecido")["insight"]["priority"], "low");
    }
}
