use super::REPORT_KIND;
use serde::{Deserialize, Serialize};

/// Tag identifying the report schema.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    #[default]
    #[serde(rename = "crash_v1")]
    CrashV1,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrashV1 => REPORT_KIND,
        }
    }
}

/// Summary of a finished round, sent once to the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeReport {
    pub kind: ReportKind,
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub seed: String,
    pub volatility: f64,
    pub bet: f64,
    pub auto_x100: Option<u32>,
    pub cashed_out: bool,
    pub cashout_ms: Option<u64>,
    pub init_data: String,
}

impl OutcomeReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn report() -> OutcomeReport {
        OutcomeReport {
            kind: ReportKind::CrashV1,
            token: None,
            seed: "abc".to_string(),
            volatility: 0.6,
            bet: 10.0,
            auto_x100: None,
            cashed_out: false,
            cashout_ms: None,
            init_data: String::new(),
        }
    }

    #[test]
    fn test_report_shape_without_token() {
        let value: Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "crash_v1",
                "seed": "abc",
                "volatility": 0.6,
                "bet": 10.0,
                "auto_x100": null,
                "cashed_out": false,
                "cashout_ms": null,
                "init_data": "",
            })
        );
    }

    #[test]
    fn test_report_shape_with_token() {
        let mut report = report();
        report.token = Some("payload.sig".to_string());
        report.auto_x100 = Some(200);
        report.cashed_out = true;
        report.cashout_ms = Some(1466);

        let value: Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["t"], "payload.sig");
        assert_eq!(value["auto_x100"], 200);
        assert_eq!(value["cashed_out"], true);
        assert_eq!(value["cashout_ms"], 1466);
        assert_eq!(ReportKind::CrashV1.as_str(), "crash_v1");
    }
}
