//! Weather lookup tool — stub that returns mock weather data.
//!
//! In production this would call a real weather API (OpenWeatherMap, etc.).
//! The stub returns plausible weather data so the agent loop can be
//! exercised end-to-end without network access.

use async_trait::async_trait;
use tracing::debug;

use toolweave_core::error::ToolError;
use toolweave_core::tool::Tool;

pub struct WeatherLookupTool;

#[async_trait]
impl Tool for WeatherLookupTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Look up current weather conditions for a city. Returns temperature, conditions, humidity, and wind speed."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city name to look up weather for"
                },
                "units": {
                    "type": "string",
                    "enum": ["metric", "imperial"],
                    "description": "Temperature units (default: metric)",
                    "default": "metric"
                }
            },
            "required": ["city"]
        })
    }

    async fn invoke(
        &self,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let city = arguments["city"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'city' argument".into()))?;

        let units = arguments["units"].as_str().unwrap_or("metric");
        debug!(city, units, "Generating mock weather");
        let weather = generate_mock_weather(city, units);
        serde_json::to_value(&weather).map_err(|e| ToolError::ExecutionFailed {
            tool_name: "get_weather".into(),
            reason: e.to_string(),
        })
    }
}

#[derive(serde::Serialize)]
struct WeatherData {
    city: String,
    temperature: f64,
    units: String,
    weather: String,
    humidity: u32,
    wind_speed: f64,
    wind_direction: String,
}

/// Generate deterministic mock weather based on city name hash.
fn generate_mock_weather(city: &str, units: &str) -> WeatherData {
    // Simple hash for deterministic but varied results.
    let hash: u32 = city
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));

    let conditions_list = [
        "Clear skies",
        "Partly cloudy",
        "Overcast",
        "Light rain",
        "Heavy rain",
        "Thunderstorms",
        "Snow",
        "Foggy",
    ];

    let wind_dirs = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

    let base_temp_c = ((hash % 40) as f64) - 5.0; // -5 to 35°C
    let (temperature, unit_label) = if units == "imperial" {
        (base_temp_c * 9.0 / 5.0 + 32.0, "°F")
    } else {
        (base_temp_c, "°C")
    };

    WeatherData {
        city: city.to_string(),
        temperature: (temperature * 10.0).round() / 10.0,
        units: unit_label.to_string(),
        weather: conditions_list[(hash as usize / 7) % conditions_list.len()].to_string(),
        humidity: 30 + (hash % 60),
        wind_speed: ((hash % 30) as f64) + 5.0,
        wind_direction: wind_dirs[(hash as usize / 3) % wind_dirs.len()].to_string(),
    }
}
