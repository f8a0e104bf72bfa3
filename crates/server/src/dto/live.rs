use buswatch::fleet::PositionEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hub::Filter;

/// Client -> server: `{"filter":"all"}` or `{"filter":{"route":"101"}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeDto {
    pub filter: FilterDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FilterDto {
    Keyword(String),
    Route { route: String },
}

impl FilterDto {
    pub fn into_filter(self) -> Result<Filter, String> {
        match self {
            FilterDto::Keyword(keyword) if keyword == "all" => Ok(Filter::All),
            FilterDto::Keyword(keyword) => Err(format!("unknown filter keyword {keyword:?}")),
            FilterDto::Route { route } => Ok(Filter::Route(route.into())),
        }
    }
}

/// Server -> client position update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdateDto {
    pub vehicle_id: String,
    pub lat: f64,
    pub lng: f64,
    pub route_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PositionUpdateDto {
    pub fn from(event: &PositionEvent) -> Self {
        Self {
            vehicle_id: event.vehicle.to_string(),
            lat: event.position.latitude,
            lng: event.position.longitude,
            route_id: event.route.as_ref().map(|route| route.to_string()),
            timestamp: event.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub ready: bool,
    pub degraded: bool,
    pub routes: usize,
    pub vehicles: usize,
    pub observers: usize,
    pub published: u64,
    pub delivered: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_filter() {
        let subscribe: SubscribeDto = serde_json::from_str(r#"{"filter":"all"}"#).unwrap();
        assert_eq!(subscribe.filter.into_filter(), Ok(Filter::All));
    }

    #[test]
    fn parses_route_filter() {
        let subscribe: SubscribeDto =
            serde_json::from_str(r#"{"filter":{"route":"101"}}"#).unwrap();
        assert_eq!(
            subscribe.filter.into_filter(),
            Ok(Filter::Route("101".into()))
        );
    }

    #[test]
    fn rejects_unknown_keyword() {
        let subscribe: SubscribeDto = serde_json::from_str(r#"{"filter":"none"}"#).unwrap();
        assert!(subscribe.filter.into_filter().is_err());
    }
}
