/// Current conditions from the OpenWeather API
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{FeedError, WeatherReport, WeatherSource};
use crate::config::WeatherConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: MainReading,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainReading {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

impl CurrentWeather {
    fn into_report(self) -> Result<WeatherReport, FeedError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .map(|c| c.description)
            .ok_or_else(|| FeedError::Malformed("no weather conditions".to_string()))?;

        Ok(WeatherReport {
            temp_celsius: self.main.temp.floor() as i32,
            condition,
        })
    }
}

#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_base: String,
    api_key: String,
    country: String,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            country: config.country.clone(),
        })
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    async fn fetch_weather(&self, city: &str) -> Result<WeatherReport, FeedError> {
        let location = format!("{city},{}", self.country);
        let response = self
            .client
            .get(format!("{}/data/2.5/weather", self.api_base))
            .query(&[
                ("q", location.as_str()),
                ("units", "metric"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        response
            .json::<CurrentWeather>()
            .await
            .map_err(|e| FeedError::Malformed(e.to_string()))?
            .into_report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_is_floored() {
        let reading: CurrentWeather = serde_json::from_value(serde_json::json!({
            "main": { "temp": -0.4 },
            "weather": [{ "description": "light rain" }]
        }))
        .unwrap();

        let report = reading.into_report().unwrap();
        assert_eq!(report.temp_celsius, -1);
        assert_eq!(report.condition, "light rain");
    }

    #[test]
    fn test_missing_conditions_is_malformed() {
        let reading: CurrentWeather = serde_json::from_value(serde_json::json!({
            "main": { "temp": 12.9 },
            "weather": []
        }))
        .unwrap();

        assert!(matches!(reading.into_report(), Err(FeedError::Malformed(_))));
    }
}
