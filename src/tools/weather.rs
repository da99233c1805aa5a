//! Weather stub — canned report, proves the tool-call round trip.
//!
//! Real forecasts would need a weather provider account; the report shape
//! is what matters to the model.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{parse_args, schema_for, LocalTool, ToolError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Celsius,
    #[default]
    Fahrenheit,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WeatherArgs {
    /// City and region, e.g. "San Francisco, CA"
    pub location: String,
    /// Temperature unit (defaults to fahrenheit)
    #[serde(default)]
    pub unit: Unit,
}

#[derive(Debug, Serialize)]
struct WeatherReport<'a> {
    location: &'a str,
    temperature: i32,
    unit: Unit,
    forecast: [&'static str; 2],
}

pub struct WeatherTool;

#[async_trait]
impl LocalTool for WeatherTool {
    fn name(&self) -> &str {
        "get_current_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather in a given location"
    }

    fn parameters(&self) -> serde_json::Value {
        schema_for::<WeatherArgs>()
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let args: WeatherArgs = parse_args(self.name(), arguments)?;
        let location = args.location.trim();
        if location.is_empty() {
            return Err(ToolError::InvalidArguments {
                tool: self.name().to_string(),
                message: "location must not be empty".into(),
            });
        }

        let report = WeatherReport {
            location,
            temperature: match args.unit {
                Unit::Celsius => 22,
                Unit::Fahrenheit => 72,
            },
            unit: args.unit,
            forecast: ["sunny", "windy"],
        };
        serde_json::to_string(&report).map_err(|e| ToolError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_to_fahrenheit() {
        let out = WeatherTool
            .call(serde_json::json!({"location": "Boston, MA"}))
            .await
            .unwrap();
        let report: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(report["location"], "Boston, MA");
        assert_eq!(report["temperature"], 72);
        assert_eq!(report["unit"], "fahrenheit");
    }

    #[tokio::test]
    async fn celsius_on_request() {
        let out = WeatherTool
            .call(serde_json::json!({"location": "Paris", "unit": "celsius"}))
            .await
            .unwrap();
        assert!(out.contains("\"temperature\":22"));
    }

    #[tokio::test]
    async fn blank_location_is_invalid() {
        let err = WeatherTool
            .call(serde_json::json!({"location": "  "}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("location"));
    }

    #[test]
    fn schema_requires_location_only() {
        let schema = WeatherTool.parameters();
        assert_eq!(schema["required"], serde_json::json!(["location"]));
        assert!(schema["properties"].get("unit").is_some());
    }
}
