//! Salt job models

use std::collections::HashMap;

use serde::Deserialize;

/// Response from an async Salt run
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeployResponse {
    #[serde(rename = "return", default)]
    pub returns: Vec<DeployReturn>,
}

/// One entry of the async run return
#[derive(Debug, Clone, Deserialize)]
pub struct DeployReturn {
    /// Job id issued by the Salt API
    pub jid: String,
}

/// Job lookup response
///
/// `return[0]` maps the job id to its info block; the info block's `Result`
/// maps each recipient to its state return.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobResponse {
    #[serde(rename = "return", default)]
    pub returns: Vec<HashMap<String, JobInfo>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobInfo {
    #[serde(rename = "Result", default)]
    pub result: HashMap<String, RecipientReturn>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipientReturn {
    #[serde(rename = "return", default)]
    pub ret: StateReturn,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateReturn {
    #[serde(default)]
    pub success: bool,
}

impl JobResponse {
    /// A job is complete once its result map is non-empty and every recipient
    /// reports a successful return.
    pub fn is_completed(&self, jid: &str) -> bool {
        self.returns
            .first()
            .and_then(|jobs| jobs.get(jid))
            .map(|info| {
                !info.result.is_empty()
                    && info.result.values().all(|recipient| recipient.ret.success)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_response(json: &str) -> JobResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_completed_when_all_recipients_succeed() {
        let response = job_response(
            r#"{"return":[{"20230101":{"Result":{
                "bootstrap":{"return":{"success":true}},
                "node-1":{"return":{"success":true}}
            }}}]}"#,
        );
        assert!(response.is_completed("20230101"));
    }

    #[test]
    fn test_not_completed_with_failed_recipient() {
        let response = job_response(
            r#"{"return":[{"20230101":{"Result":{
                "node-1":{"return":{"success":false}}
            }}}]}"#,
        );
        assert!(!response.is_completed("20230101"));
    }

    #[test]
    fn test_not_completed_with_empty_result_map() {
        let response = job_response(r#"{"return":[{"20230101":{"Result":{}}}]}"#);
        assert!(!response.is_completed("20230101"));
    }

    #[test]
    fn test_not_completed_for_unknown_jid() {
        let response = job_response(r#"{"return":[{}]}"#);
        assert!(!response.is_completed("20230101"));
        assert!(!JobResponse::default().is_completed("20230101"));
    }
}
